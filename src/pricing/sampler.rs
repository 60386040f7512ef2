//! Periodic price sampling job
//!
//! Walks every registered asset pair, computes the live on-chain price and
//! appends it to the price history, keeping the resolver's cache-first
//! path warm. Failures are per-pair; one dead pool never stops the sweep.

use super::PriceResolver;
use crate::errors::EngineResult;
use crate::logger::{self, LogTag};
use crate::persistence::OrderStore;
use crate::types::PriceSample;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct PriceSampler {
    persistence: Arc<dyn OrderStore>,
    resolver: Arc<PriceResolver>,
    interval: Duration,
}

impl PriceSampler {
    pub fn new(
        persistence: Arc<dyn OrderStore>,
        resolver: Arc<PriceResolver>,
        interval: Duration,
    ) -> Self {
        Self {
            persistence,
            resolver,
            interval,
        }
    }

    /// Sample every registered pair once. Returns the number of samples
    /// recorded.
    pub async fn sample_once(&self) -> EngineResult<usize> {
        let pairs = self.persistence.list_asset_pairs().await?;
        let mut recorded = 0;

        for pair in pairs {
            match self.resolver.resolve_onchain_price(&pair).await {
                Ok(price) => {
                    let sample = PriceSample {
                        pair_id: pair.id.clone(),
                        price,
                        observed_at: Utc::now(),
                    };
                    if let Err(e) = self.persistence.record_price_sample(&sample).await {
                        logger::warning(
                            LogTag::Price,
                            &format!("Failed to record sample for pair {}: {}", pair.id, e),
                        );
                        continue;
                    }
                    recorded += 1;
                }
                Err(e) => {
                    logger::debug(
                        LogTag::Price,
                        &format!("Skipping pair {} this sweep: {}", pair.id, e),
                    );
                }
            }
        }

        Ok(recorded)
    }

    /// Run the sampling loop until shutdown is signalled.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        logger::info(
            LogTag::Price,
            &format!("Price sampler started (interval: {:?})", self.interval),
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.sample_once().await {
                Ok(count) if count > 0 => {
                    logger::debug(LogTag::Price, &format!("Recorded {} price samples", count));
                }
                Ok(_) => {}
                Err(e) => {
                    logger::warning(LogTag::Price, &format!("Sampling sweep failed: {}", e));
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        logger::info(LogTag::Price, "Price sampler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{native_token_pair, MockChain, MockOrderStore};
    use crate::types::PoolReserves;

    #[tokio::test]
    async fn sweep_records_resolvable_pairs_and_skips_dead_ones() {
        let store = Arc::new(MockOrderStore::new());
        let chain = Arc::new(MockChain::new());

        let live = native_token_pair("live");
        let mut dead = native_token_pair("dead");
        dead.asset_b.policy_id = "other".to_string();
        store.add_pair(live.clone());
        store.add_pair(dead);

        chain.set_decimals(&live.asset_b, 6);
        chain.add_pool(
            &live.asset_a,
            &live.asset_b,
            PoolReserves {
                reserve_a: 1_000_000,
                reserve_b: 2_000_000,
                fee_numerator: 3,
                fee_denominator: 1000,
            },
        );

        let resolver = Arc::new(PriceResolver::new(store.clone(), chain));
        let sampler = PriceSampler::new(store.clone(), resolver, Duration::from_secs(60));

        let recorded = sampler.sample_once().await.unwrap();
        assert_eq!(recorded, 1);

        let cached = store.get_cached_price("live").await.unwrap().unwrap();
        assert_eq!(cached.price, crate::testkit::dec("2"));
        assert!(store.get_cached_price("dead").await.unwrap().is_none());
    }
}
