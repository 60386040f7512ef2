//! Order scheduler: the periodic execution driver
//!
//! Each tick fetches pending orders, groups them by wallet and processes
//! at most one order per wallet, oldest first. The wallet lock is
//! acquired before any pricing or submission work and is released on
//! every path except a successful submission, where it stays held until
//! the confirmation poller observes the transaction on chain.
//!
//! Ordering within a wallet: lock acquire happens before price
//! resolution and submission; submission happens before the status
//! write; the COMPLETED write happens before the awaiting-confirmation
//! marker is set.

use crate::chain::{ChainDataProvider, ChainSubmitter};
use crate::errors::{EngineError, EngineResult};
use crate::events::{EventBus, OrderStatusEvent};
use crate::lock::WalletLockManager;
use crate::logger::{self, LogTag};
use crate::persistence::OrderStore;
use crate::pricing::PriceResolver;
use crate::swap::{amount_out, apply_slippage, SlippageDirection};
use crate::types::{
    Asset, AssetPair, Order, OrderKind, OrderStatus, SwapRequest, SwapSubmission,
};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Outcome of one wallet's processing within a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletOutcome {
    /// Wallet locked or awaiting confirmation; nothing examined.
    Skipped,
    /// Selected order was past its expiration.
    Expired,
    /// Trigger condition not met; order left pending.
    NotEligible,
    /// Swap submitted; wallet stays locked until confirmation.
    Submitted { tx_id: String },
    /// Chain rejected the submission; order failed, wallet freed.
    Failed,
}

pub struct OrderScheduler {
    persistence: Arc<dyn OrderStore>,
    chain: Arc<dyn ChainDataProvider>,
    submitter: Arc<dyn ChainSubmitter>,
    resolver: Arc<PriceResolver>,
    locks: Arc<WalletLockManager>,
    events: EventBus,
}

impl OrderScheduler {
    pub fn new(
        persistence: Arc<dyn OrderStore>,
        chain: Arc<dyn ChainDataProvider>,
        submitter: Arc<dyn ChainSubmitter>,
        resolver: Arc<PriceResolver>,
        locks: Arc<WalletLockManager>,
        events: EventBus,
    ) -> Self {
        Self {
            persistence,
            chain,
            submitter,
            resolver,
            locks,
            events,
        }
    }

    /// Process one scheduling tick. Per-wallet failures are absorbed here;
    /// only the initial order fetch can fail the whole tick.
    pub async fn tick(&self) -> EngineResult<()> {
        let pending = self.persistence.list_pending_orders().await?;
        if pending.is_empty() {
            return Ok(());
        }

        // BTreeMap keeps wallet iteration order deterministic
        let mut by_wallet: BTreeMap<String, Vec<Order>> = BTreeMap::new();
        for order in pending {
            by_wallet.entry(order.wallet_id.clone()).or_default().push(order);
        }

        for (wallet_id, orders) in by_wallet {
            match self.process_wallet(&wallet_id, orders).await {
                Ok(WalletOutcome::Skipped) => {
                    logger::debug(
                        LogTag::Scheduler,
                        &format!("Wallet {} locked or awaiting confirmation, skipping", wallet_id),
                    );
                }
                Ok(outcome) => {
                    logger::debug(
                        LogTag::Scheduler,
                        &format!("Wallet {} outcome: {:?}", wallet_id, outcome),
                    );
                }
                Err(e) if e.is_transient() => {
                    logger::warning(
                        LogTag::Scheduler,
                        &format!("Wallet {} skipped this tick: {}", wallet_id, e),
                    );
                }
                Err(e) => {
                    logger::error(
                        LogTag::Scheduler,
                        &format!("Error processing wallet {}: {}", wallet_id, e),
                    );
                }
            }
        }
        Ok(())
    }

    async fn process_wallet(
        &self,
        wallet_id: &str,
        orders: Vec<Order>,
    ) -> EngineResult<WalletOutcome> {
        // Exactly one candidate per wallet per tick: the oldest
        let Some(order) = orders.into_iter().min_by_key(|o| o.created_at) else {
            return Ok(WalletOutcome::Skipped);
        };

        if self.locks.is_locked(wallet_id).await?
            || self.locks.get_awaiting_tx(wallet_id).await?.is_some()
        {
            return Ok(WalletOutcome::Skipped);
        }

        if !self.locks.try_lock(wallet_id).await? {
            // Lost the acquire race to another instance
            return Ok(WalletOutcome::Skipped);
        }

        match self.process_locked_order(&order).await {
            Ok(WalletOutcome::Submitted { tx_id }) => {
                // Lock intentionally stays held until the poller confirms
                // the transaction
                Ok(WalletOutcome::Submitted { tx_id })
            }
            Ok(outcome) => {
                self.locks.unlock(wallet_id).await?;
                Ok(outcome)
            }
            Err(e) => {
                // Release defensively so the wallet is never stranded
                if let Err(unlock_err) = self.locks.unlock(wallet_id).await {
                    logger::error(
                        LogTag::Scheduler,
                        &format!(
                            "Failed to release lock for wallet {}: {}",
                            wallet_id, unlock_err
                        ),
                    );
                }
                Err(e)
            }
        }
    }

    /// Runs with the wallet lock held. The caller releases the lock on
    /// every outcome except a successful submission.
    async fn process_locked_order(&self, order: &Order) -> EngineResult<WalletOutcome> {
        if order.is_expired(Utc::now()) {
            logger::info(
                LogTag::Scheduler,
                &format!("Order {} expired before execution", order.order_code),
            );
            self.set_status(order, OrderStatus::Expired, None).await?;
            return Ok(WalletOutcome::Expired);
        }

        let pair = self
            .persistence
            .get_asset_pair(&order.pair_id)
            .await?
            .ok_or_else(|| EngineError::PairNotFound {
                pair_id: order.pair_id.clone(),
            })?;

        let current_price = self.resolver.resolve_price(&order.pair_id).await?;

        if !is_eligible(order, current_price) {
            return Ok(WalletOutcome::NotEligible);
        }

        let address = self
            .persistence
            .get_settlement_address(&order.id)
            .await?
            .ok_or_else(|| EngineError::AddressNotFound {
                order_id: order.id.clone(),
            })?;

        self.set_status(order, OrderStatus::Processing, None).await?;

        let submission = self.execute_swap(order, &pair, &address).await;
        match submission {
            Ok(SwapSubmission {
                success: true,
                tx_id: Some(tx_id),
            }) => {
                logger::info(
                    LogTag::Scheduler,
                    &format!("Order {} submitted, tx {}", order.order_code, tx_id),
                );
                self.set_status(order, OrderStatus::Completed, Some(current_price))
                    .await?;
                self.locks
                    .mark_awaiting_confirmation(&order.wallet_id, &tx_id)
                    .await?;
                Ok(WalletOutcome::Submitted { tx_id })
            }
            Ok(_) => {
                logger::warning(
                    LogTag::Scheduler,
                    &format!("Order {} submission rejected by chain", order.order_code),
                );
                self.set_status(order, OrderStatus::Failed, Some(current_price))
                    .await?;
                Ok(WalletOutcome::Failed)
            }
            Err(e) => {
                logger::warning(
                    LogTag::Scheduler,
                    &format!("Order {} submission errored: {}", order.order_code, e),
                );
                self.set_status(order, OrderStatus::Failed, Some(current_price))
                    .await?;
                Ok(WalletOutcome::Failed)
            }
        }
    }

    /// Compute base-unit amounts from live reserves and submit the swap.
    async fn execute_swap(
        &self,
        order: &Order,
        pair: &AssetPair,
        address: &str,
    ) -> EngineResult<SwapSubmission> {
        let reserves = self
            .chain
            .get_pool_reserves(&pair.asset_a, &pair.asset_b)
            .await?
            .ok_or_else(|| EngineError::PoolNotFound {
                pair: pair.id.clone(),
            })?;

        let (asset_in, asset_out): (&Asset, &Asset) = if pair.is_main_pair {
            (&pair.asset_a, &pair.asset_b)
        } else {
            (&pair.asset_b, &pair.asset_a)
        };
        let (reserve_in, reserve_out) = if pair.is_main_pair {
            (reserves.reserve_a, reserves.reserve_b)
        } else {
            (reserves.reserve_b, reserves.reserve_a)
        };

        let decimals_in = self.chain.get_asset_decimals(asset_in).await?;
        let amount_in = to_base_units(order.amount, decimals_in)?;

        let expected_out = amount_out(
            reserve_in,
            reserve_out,
            amount_in,
            reserves.fee_numerator,
            reserves.fee_denominator,
        )?;
        let minimum_amount_out =
            apply_slippage(expected_out, order.slippage, SlippageDirection::Down)?;

        logger::debug(
            LogTag::Swap,
            &format!(
                "Order {}: amount in {} ({} decimals), expected out {}, min out {}",
                order.order_code, amount_in, decimals_in, expected_out, minimum_amount_out
            ),
        );

        let request = SwapRequest {
            order_id: order.id.clone(),
            wallet_id: order.wallet_id.clone(),
            address: address.to_string(),
            asset_in: asset_in.clone(),
            asset_out: asset_out.clone(),
            amount_in,
            minimum_amount_out,
            is_limit_order: order.kind == OrderKind::Limit,
        };

        self.submitter.submit_swap(&request).await
    }

    /// Persist a status transition and publish the change event.
    async fn set_status(
        &self,
        order: &Order,
        status: OrderStatus,
        market_price: Option<Decimal>,
    ) -> EngineResult<()> {
        self.persistence
            .update_order_status(&order.id, status, market_price)
            .await?;
        let owner_ref = self
            .persistence
            .get_order_owner(&order.id)
            .await
            .unwrap_or(None);
        self.events.publish(OrderStatusEvent {
            order_id: order.id.clone(),
            owner_ref,
            status,
        });
        Ok(())
    }

    /// Run the scheduling loop until shutdown is signalled.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>, interval: Duration) {
        logger::info(
            LogTag::Scheduler,
            &format!("Order scheduler started (interval: {:?})", interval),
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.tick().await {
                logger::error(LogTag::Scheduler, &format!("Tick failed: {}", e));
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        logger::info(LogTag::Scheduler, "Order scheduler stopped");
    }
}

/// Trigger evaluation.
///
/// Market orders always execute. Limit orders execute when the current
/// price has risen to or beyond the limit (boundary inclusive).
/// Stop-limit orders are reserved and never eligible.
fn is_eligible(order: &Order, current_price: Decimal) -> bool {
    match order.kind {
        OrderKind::Market => true,
        OrderKind::Limit => match order.limit_price {
            Some(limit) => current_price >= limit,
            None => false,
        },
        OrderKind::StopLimit => false,
    }
}

/// Convert a human-unit amount to base units, truncating sub-unit dust.
fn to_base_units(amount: Decimal, decimals: u32) -> EngineResult<u64> {
    if decimals > 18 {
        return Err(EngineError::NumericOverflow {
            context: "asset decimals out of range",
        });
    }
    let scaled = amount
        .checked_mul(Decimal::from(10u64.pow(decimals)))
        .ok_or(EngineError::NumericOverflow {
            context: "order amount in base units",
        })?;
    scaled.trunc().to_u64().ok_or(EngineError::NumericOverflow {
        context: "order amount in base units",
    })
}
