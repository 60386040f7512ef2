//! Transaction confirmation poller
//!
//! Sweeps every wallet carrying an awaiting-confirmation marker and asks
//! the chain for the transaction's status. Confirmation clears the marker
//! and releases the wallet lock, making the wallet eligible for the next
//! scheduler tick. A transaction that never confirms leaves the wallet
//! locked indefinitely; that is a deliberate fail-safe against double
//! submission, at the cost of availability.

use crate::chain::ChainDataProvider;
use crate::errors::EngineResult;
use crate::lock::WalletLockManager;
use crate::logger::{self, LogTag};
use crate::types::TxStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct ConfirmationPoller {
    locks: Arc<WalletLockManager>,
    chain: Arc<dyn ChainDataProvider>,
}

impl ConfirmationPoller {
    pub fn new(locks: Arc<WalletLockManager>, chain: Arc<dyn ChainDataProvider>) -> Self {
        Self { locks, chain }
    }

    /// Sweep all awaiting wallets once. Query errors leave the wallet
    /// untouched; only the marker enumeration itself can fail the sweep.
    pub async fn tick(&self) -> EngineResult<()> {
        let awaiting = self.locks.awaiting_wallets().await?;
        if awaiting.is_empty() {
            return Ok(());
        }

        logger::debug(
            LogTag::Confirm,
            &format!("Checking {} pending transaction(s)", awaiting.len()),
        );

        for (wallet_id, tx_id) in awaiting {
            match self.chain.get_transaction_status(&tx_id).await {
                Ok(TxStatus::Confirmed) => {
                    logger::info(
                        LogTag::Confirm,
                        &format!("Tx {} confirmed, releasing wallet {}", tx_id, wallet_id),
                    );
                    // Clear the marker before the lock so a crash between
                    // the two deletes leaves the wallet locked, never
                    // double-submittable
                    if let Err(e) = self.locks.clear_awaiting_confirmation(&wallet_id).await {
                        logger::warning(
                            LogTag::Confirm,
                            &format!("Failed to clear marker for wallet {}: {}", wallet_id, e),
                        );
                        continue;
                    }
                    if let Err(e) = self.locks.unlock(&wallet_id).await {
                        logger::warning(
                            LogTag::Confirm,
                            &format!("Failed to unlock wallet {}: {}", wallet_id, e),
                        );
                    }
                }
                Ok(TxStatus::Pending) => {
                    logger::debug(
                        LogTag::Confirm,
                        &format!("Tx {} still pending for wallet {}", tx_id, wallet_id),
                    );
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Confirm,
                        &format!(
                            "Confirmation check for tx {} (wallet {}) failed: {}",
                            tx_id, wallet_id, e
                        ),
                    );
                }
            }
        }
        Ok(())
    }

    /// Run the polling loop until shutdown is signalled.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>, interval: Duration) {
        logger::info(
            LogTag::Confirm,
            &format!("Confirmation poller started (interval: {:?})", interval),
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.tick().await {
                logger::warning(LogTag::Confirm, &format!("Sweep failed: {}", e));
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        logger::info(LogTag::Confirm, "Confirmation poller stopped");
    }
}
