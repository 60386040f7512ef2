//! Price resolution for token pairs
//!
//! Cache-first: the most recent stored price sample wins and costs no
//! chain calls. Without a sample the resolver computes the price from
//! current pool reserves, adjusting each side by its decimal precision.
//! All arithmetic uses `Decimal`; token decimals range 0-18, which f64
//! cannot represent faithfully.

pub mod sampler;

use crate::chain::ChainDataProvider;
use crate::errors::{EngineError, EngineResult};
use crate::logger::{self, LogTag};
use crate::persistence::OrderStore;
use crate::types::AssetPair;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Upper bound on token decimal precision. Indexer metadata is untrusted;
/// anything above this is rejected before it can feed the Decimal scale.
const MAX_ASSET_DECIMALS: u32 = 18;

pub struct PriceResolver {
    persistence: Arc<dyn OrderStore>,
    chain: Arc<dyn ChainDataProvider>,
}

impl PriceResolver {
    pub fn new(persistence: Arc<dyn OrderStore>, chain: Arc<dyn ChainDataProvider>) -> Self {
        Self { persistence, chain }
    }

    /// Resolve the current price for a pair in its primary quotation
    /// direction.
    pub async fn resolve_price(&self, pair_id: &str) -> EngineResult<Decimal> {
        if let Some(sample) = self.persistence.get_cached_price(pair_id).await? {
            logger::debug(
                LogTag::Price,
                &format!("Using cached price for pair {}: {}", pair_id, sample.price),
            );
            return Ok(sample.price);
        }

        let pair = self
            .persistence
            .get_asset_pair(pair_id)
            .await?
            .ok_or_else(|| EngineError::PairNotFound {
                pair_id: pair_id.to_string(),
            })?;

        let price = self.resolve_onchain_price(&pair).await?;
        logger::debug(
            LogTag::Price,
            &format!("Using on-chain price for pair {}: {}", pair_id, price),
        );
        Ok(price)
    }

    /// Compute the pair price from live pool reserves, bypassing the
    /// cache. Also used by the price sampler.
    pub async fn resolve_onchain_price(&self, pair: &AssetPair) -> EngineResult<Decimal> {
        let reserves = self
            .chain
            .get_pool_reserves(&pair.asset_a, &pair.asset_b)
            .await?
            .ok_or_else(|| EngineError::PoolNotFound {
                pair: pair.id.clone(),
            })?;

        if reserves.reserve_a == 0 || reserves.reserve_b == 0 {
            return Err(EngineError::PriceUnavailable {
                pair: pair.id.clone(),
                reason: "pool has a zero reserve".to_string(),
            });
        }

        let decimals_a = self.chain.get_asset_decimals(&pair.asset_a).await?;
        let decimals_b = self.chain.get_asset_decimals(&pair.asset_b).await?;
        if decimals_a > MAX_ASSET_DECIMALS || decimals_b > MAX_ASSET_DECIMALS {
            return Err(EngineError::PriceUnavailable {
                pair: pair.id.clone(),
                reason: format!(
                    "asset decimals out of range ({} / {})",
                    decimals_a, decimals_b
                ),
            });
        }

        let adjusted_a = Decimal::from_i128_with_scale(reserves.reserve_a as i128, decimals_a);
        let adjusted_b = Decimal::from_i128_with_scale(reserves.reserve_b as i128, decimals_b);

        let price_ab = adjusted_b / adjusted_a;
        let price_ba = adjusted_a / adjusted_b;

        if pair.is_main_pair {
            Ok(price_ab)
        } else {
            Ok(price_ba)
        }
    }
}
