//! Chain data and submission boundary
//!
//! Everything the engine needs from the network: pool reserves, asset
//! decimal metadata, transaction confirmation state and swap submission.
//! Submission is at-most-once, possibly slow, possibly failing; the
//! scheduler never retries a submission on its own.

pub mod http;

use crate::errors::EngineResult;
use crate::types::{Asset, PoolReserves, SwapRequest, SwapSubmission, TxStatus};
use async_trait::async_trait;

#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Current reserves for the pool trading `asset_a` against `asset_b`.
    /// Returns None when no pool exists for the pair.
    async fn get_pool_reserves(
        &self,
        asset_a: &Asset,
        asset_b: &Asset,
    ) -> EngineResult<Option<PoolReserves>>;

    /// Decimal precision of an asset. The native asset resolves to 6; an
    /// asset without registered metadata resolves to 0.
    async fn get_asset_decimals(&self, asset: &Asset) -> EngineResult<u32>;

    /// Confirmation state of a submitted transaction. Not-yet-indexed
    /// transactions report Pending, not an error.
    async fn get_transaction_status(&self, tx_id: &str) -> EngineResult<TxStatus>;
}

#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Build, sign and submit the swap. Opaque to the engine.
    async fn submit_swap(&self, request: &SwapRequest) -> EngineResult<SwapSubmission>;
}
