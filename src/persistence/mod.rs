//! Persistence boundary for orders, pairs and price history
//!
//! The scheduler and resolver talk to storage only through `OrderStore`,
//! so tests can substitute an in-memory double and the sqlite backend
//! stays swappable for a hosted database.

pub mod sqlite;

use crate::errors::EngineResult;
use crate::types::{AssetPair, Order, OrderKind, OrderStatus, PriceSample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Fields supplied by the front-end when a user submits an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub wallet_id: String,
    pub pair_id: String,
    pub kind: OrderKind,
    pub amount: Decimal,
    pub slippage: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub expiration_time: DateTime<Utc>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders currently in PENDING. Expired ones are included; the
    /// scheduler transitions them lazily when their wallet comes up.
    async fn list_pending_orders(&self) -> EngineResult<Vec<Order>>;

    /// Persist a status transition, optionally recording the market price
    /// observed at the transition. Returns the updated order.
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        market_price: Option<Decimal>,
    ) -> EngineResult<Order>;

    /// Chat/account reference of the order's owner, for notifications.
    async fn get_order_owner(&self, order_id: &str) -> EngineResult<Option<String>>;

    /// Primary settlement address for the order's wallet.
    async fn get_settlement_address(&self, order_id: &str) -> EngineResult<Option<String>>;

    async fn get_asset_pair(&self, pair_id: &str) -> EngineResult<Option<AssetPair>>;

    async fn list_asset_pairs(&self) -> EngineResult<Vec<AssetPair>>;

    /// Most recent cached price sample for the pair, if any.
    async fn get_cached_price(&self, pair_id: &str) -> EngineResult<Option<PriceSample>>;

    async fn record_price_sample(&self, sample: &PriceSample) -> EngineResult<()>;

    /// Create an order with a generated id and unique short code.
    async fn create_order(&self, new_order: NewOrder) -> EngineResult<Order>;
}
