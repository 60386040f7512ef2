//! Per-wallet mutual exclusion over the shared store
//!
//! Two sub-keys per wallet:
//! - `wallet:{id}:locked` — advisory lock held while an order for the
//!   wallet is being processed or awaiting confirmation
//! - `wallet:{id}:awaiting_tx` — transaction id of a submitted, not yet
//!   confirmed swap
//!
//! Absence of both keys means the wallet is free. Acquisition goes through
//! the store's atomic set-if-absent so two scheduler instances can never
//! both win the same wallet. The lock value records an owner token and
//! acquisition time for operator diagnostics; release does not check it
//! because only the scheduler and the confirmation poller ever unlock.

use crate::errors::EngineResult;
use crate::logger::{self, LogTag};
use crate::store::SharedStore;
use chrono::Utc;
use std::sync::Arc;

const LOCK_SUFFIX: &str = ":locked";
const AWAITING_SUFFIX: &str = ":awaiting_tx";
const WALLET_PREFIX: &str = "wallet:";

fn lock_key(wallet_id: &str) -> String {
    format!("{}{}{}", WALLET_PREFIX, wallet_id, LOCK_SUFFIX)
}

fn awaiting_key(wallet_id: &str) -> String {
    format!("{}{}{}", WALLET_PREFIX, wallet_id, AWAITING_SUFFIX)
}

pub struct WalletLockManager {
    store: Arc<dyn SharedStore>,
}

impl WalletLockManager {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Attempt to acquire the wallet lock. Returns false when another
    /// holder already has it.
    pub async fn try_lock(&self, wallet_id: &str) -> EngineResult<bool> {
        let token = format!("{}@{}", uuid::Uuid::new_v4(), Utc::now().to_rfc3339());
        let acquired = self
            .store
            .set_if_absent(&lock_key(wallet_id), &token)
            .await?;
        if acquired {
            logger::debug(LogTag::Lock, &format!("Locked wallet {}", wallet_id));
        }
        Ok(acquired)
    }

    pub async fn is_locked(&self, wallet_id: &str) -> EngineResult<bool> {
        Ok(self.store.get(&lock_key(wallet_id)).await?.is_some())
    }

    pub async fn unlock(&self, wallet_id: &str) -> EngineResult<()> {
        self.store.delete(&lock_key(wallet_id)).await?;
        logger::debug(LogTag::Lock, &format!("Unlocked wallet {}", wallet_id));
        Ok(())
    }

    /// Record the submitted transaction the wallet is waiting on. The lock
    /// stays held until the confirmation poller clears this marker.
    pub async fn mark_awaiting_confirmation(
        &self,
        wallet_id: &str,
        tx_id: &str,
    ) -> EngineResult<()> {
        self.store.set(&awaiting_key(wallet_id), tx_id).await?;
        logger::debug(
            LogTag::Lock,
            &format!("Wallet {} awaiting confirmation of {}", wallet_id, tx_id),
        );
        Ok(())
    }

    pub async fn get_awaiting_tx(&self, wallet_id: &str) -> EngineResult<Option<String>> {
        self.store.get(&awaiting_key(wallet_id)).await
    }

    pub async fn clear_awaiting_confirmation(&self, wallet_id: &str) -> EngineResult<()> {
        self.store.delete(&awaiting_key(wallet_id)).await
    }

    /// All wallets currently carrying an awaiting-confirmation marker,
    /// paired with the transaction id each is waiting on.
    pub async fn awaiting_wallets(&self) -> EngineResult<Vec<(String, String)>> {
        let keys = self.store.keys_with_prefix(WALLET_PREFIX).await?;
        let mut result = Vec::new();
        for key in keys {
            let Some(wallet_id) = key
                .strip_prefix(WALLET_PREFIX)
                .and_then(|rest| rest.strip_suffix(AWAITING_SUFFIX))
            else {
                continue;
            };
            if let Some(tx_id) = self.store.get(&key).await? {
                result.push((wallet_id.to_string(), tx_id));
            }
        }
        Ok(result)
    }
}
