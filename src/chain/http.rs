//! HTTP chain client against a Blockfrost-style indexer and DEX gateway
//!
//! Endpoints used:
//! - `GET /assets/{unit}` — asset metadata; a 404 means no registered
//!   metadata and resolves to 0 decimals
//! - `GET /txs/{hash}` — transaction info with a nullable `block_height`;
//!   a 404 means not yet indexed and reports Pending
//! - `GET /pools?asset_a={unit}&asset_b={unit}` — pool reserves and fee
//! - `POST /swaps` — build-sign-submit gateway for swap orders

use super::{ChainDataProvider, ChainSubmitter};
use crate::errors::{EngineError, EngineResult};
use crate::logger::{self, LogTag};
use crate::types::{Asset, PoolReserves, SwapRequest, SwapSubmission, TxStatus};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Decimals assumed for the network's native asset.
pub const NATIVE_ASSET_DECIMALS: u32 = 6;

const HTTP_TIMEOUT_SECS: u64 = 30;

pub struct HttpChainClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AssetInfo {
    #[serde(default)]
    metadata: Option<AssetMetadata>,
    #[serde(default)]
    onchain_metadata: Option<AssetMetadata>,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    #[serde(default)]
    decimals: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TxInfo {
    #[serde(default)]
    block_height: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PoolInfo {
    reserve_a: u64,
    reserve_b: u64,
    fee_numerator: u64,
    fee_denominator: u64,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    success: bool,
    #[serde(default)]
    tx_id: Option<String>,
}

impl HttpChainClient {
    pub fn new(base_url: &str, api_key: &str) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| EngineError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> EngineResult<reqwest::Response> {
        self.client
            .get(self.url(path))
            .header("project_id", &self.api_key)
            .send()
            .await
            .map_err(|e| EngineError::ChainQueryTransient(e.to_string()))
    }
}

#[async_trait]
impl ChainDataProvider for HttpChainClient {
    async fn get_pool_reserves(
        &self,
        asset_a: &Asset,
        asset_b: &Asset,
    ) -> EngineResult<Option<PoolReserves>> {
        let path = format!(
            "/pools?asset_a={}&asset_b={}",
            asset_a.unit(),
            asset_b.unit()
        );
        let response = self.get(&path).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let pool: PoolInfo = response
                    .json()
                    .await
                    .map_err(|e| EngineError::ChainQueryTransient(e.to_string()))?;
                Ok(Some(PoolReserves {
                    reserve_a: pool.reserve_a,
                    reserve_b: pool.reserve_b,
                    fee_numerator: pool.fee_numerator,
                    fee_denominator: pool.fee_denominator,
                }))
            }
            status => Err(EngineError::ChainQueryTransient(format!(
                "pool lookup returned HTTP {}",
                status
            ))),
        }
    }

    async fn get_asset_decimals(&self, asset: &Asset) -> EngineResult<u32> {
        if asset.is_native() {
            return Ok(NATIVE_ASSET_DECIMALS);
        }

        let response = self.get(&format!("/assets/{}", asset.unit())).await?;
        match response.status() {
            // No registered metadata for the asset
            StatusCode::NOT_FOUND => Ok(0),
            status if status.is_success() => {
                let info: AssetInfo = response
                    .json()
                    .await
                    .map_err(|e| EngineError::ChainQueryTransient(e.to_string()))?;
                let decimals = info
                    .metadata
                    .and_then(|m| m.decimals)
                    .or_else(|| info.onchain_metadata.and_then(|m| m.decimals))
                    .unwrap_or(0);
                Ok(decimals)
            }
            status => Err(EngineError::ChainQueryTransient(format!(
                "asset lookup returned HTTP {}",
                status
            ))),
        }
    }

    async fn get_transaction_status(&self, tx_id: &str) -> EngineResult<TxStatus> {
        let response = self.get(&format!("/txs/{}", tx_id)).await?;
        match response.status() {
            // Not yet indexed by the backend, treat as still pending
            StatusCode::NOT_FOUND => Ok(TxStatus::Pending),
            status if status.is_success() => {
                let info: TxInfo = response
                    .json()
                    .await
                    .map_err(|e| EngineError::ChainQueryTransient(e.to_string()))?;
                Ok(match info.block_height {
                    Some(_) => TxStatus::Confirmed,
                    None => TxStatus::Pending,
                })
            }
            status => Err(EngineError::ChainQueryTransient(format!(
                "tx lookup returned HTTP {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl ChainSubmitter for HttpChainClient {
    async fn submit_swap(&self, request: &SwapRequest) -> EngineResult<SwapSubmission> {
        logger::debug(
            LogTag::Chain,
            &format!(
                "Submitting swap for order {}: {} -> {} (in: {}, min out: {})",
                request.order_id,
                request.asset_in.unit(),
                request.asset_out.unit(),
                request.amount_in,
                request.minimum_amount_out
            ),
        );

        let response = self
            .client
            .post(self.url("/swaps"))
            .header("project_id", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::SubmissionFailure {
                order_id: request.order_id.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            logger::warning(
                LogTag::Chain,
                &format!(
                    "Swap submission for order {} returned HTTP {}",
                    request.order_id, status
                ),
            );
            // Stale-UTXO conflicts surface as an ordinary submission
            // failure and are not retried automatically
            if body.contains("BadInputsUTxO") {
                logger::warning(
                    LogTag::Chain,
                    &format!(
                        "Order {} hit a stale or already-spent UTxO",
                        request.order_id
                    ),
                );
            }
            return Ok(SwapSubmission {
                success: false,
                tx_id: None,
            });
        }

        let result: SwapResponse = response
            .json()
            .await
            .map_err(|e| EngineError::SubmissionFailure {
                order_id: request.order_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(SwapSubmission {
            success: result.success,
            tx_id: result.tx_id,
        })
    }
}
