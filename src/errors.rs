//! Engine error taxonomy
//!
//! Transient errors (store/chain connectivity, not-yet-indexed transactions)
//! are absorbed at the tick boundary and retried; they never bring down the
//! scheduling process. Structural errors abort only the single order or
//! wallet under evaluation.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No liquidity pool exists for the pair on the target network.
    #[error("no liquidity pool found for pair {pair}")]
    PoolNotFound { pair: String },

    /// The shared lock store is unreachable; the affected wallet is skipped
    /// for the tick.
    #[error("lock store unavailable: {0}")]
    LockStoreUnavailable(String),

    /// Both the cached sample and on-chain resolution failed.
    #[error("price unavailable for pair {pair}: {reason}")]
    PriceUnavailable { pair: String, reason: String },

    /// Chain rejected or errored on submission. Stale-UTXO conflicts are
    /// reported through this variant as well and are not retried.
    #[error("swap submission failed for order {order_id}: {reason}")]
    SubmissionFailure { order_id: String, reason: String },

    /// Confirmation check was inconclusive; retried on the next tick.
    #[error("transient chain query error: {0}")]
    ChainQueryTransient(String),

    #[error("settlement address not found for order {order_id}")]
    AddressNotFound { order_id: String },

    #[error("asset pair {pair_id} not found")]
    PairNotFound { pair_id: String },

    #[error("order {order_id} not found")]
    OrderNotFound { order_id: String },

    /// Terminal order statuses are write-once; any later transition is a
    /// caller bug.
    #[error("order {order_id} is already {current} and cannot transition")]
    InvalidStatusTransition { order_id: String, current: String },

    #[error("numeric overflow in {context}")]
    NumericOverflow { context: &'static str },

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Transient failures are retried on a later tick instead of being
    /// surfaced as order failures.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::LockStoreUnavailable(_)
                | EngineError::PriceUnavailable { .. }
                | EngineError::ChainQueryTransient(_)
        )
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Database(err.to_string())
    }
}
