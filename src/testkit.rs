//! Shared test doubles for the engine's collaborator boundaries
//!
//! In-memory implementations of `OrderStore`, `ChainDataProvider` and
//! `ChainSubmitter` with scriptable behavior, used by the scheduler,
//! resolver and poller tests.

use crate::errors::{EngineError, EngineResult};
use crate::persistence::{NewOrder, OrderStore};
use crate::types::{
    Asset, AssetPair, Order, OrderKind, OrderStatus, PoolReserves, PriceSample, SwapRequest,
    SwapSubmission, TxStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// =============================================================================
// ORDER STORE DOUBLE
// =============================================================================

#[derive(Default)]
pub struct MockOrderStore {
    pub orders: Mutex<Vec<Order>>,
    pub pairs: Mutex<HashMap<String, AssetPair>>,
    pub samples: Mutex<Vec<PriceSample>>,
    pub owners: Mutex<HashMap<String, String>>,
    pub addresses: Mutex<HashMap<String, String>>,
    history: Mutex<Vec<(String, OrderStatus)>>,
    counter: AtomicUsize,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&self, pair: AssetPair) {
        self.pairs.lock().unwrap().insert(pair.id.clone(), pair);
    }

    pub fn add_sample(&self, pair_id: &str, price: Decimal) {
        self.samples.lock().unwrap().push(PriceSample {
            pair_id: pair_id.to_string(),
            price,
            observed_at: Utc::now(),
        });
    }

    pub fn add_order(&self, order: Order) {
        self.addresses
            .lock()
            .unwrap()
            .entry(order.id.clone())
            .or_insert_with(|| format!("addr-{}", order.wallet_id));
        self.owners
            .lock()
            .unwrap()
            .entry(order.id.clone())
            .or_insert_with(|| format!("chat-{}", order.wallet_id));
        self.orders.lock().unwrap().push(order);
    }

    /// Remove the settlement address mapping for an order.
    pub fn drop_address(&self, order_id: &str) {
        self.addresses.lock().unwrap().remove(order_id);
    }

    pub fn order(&self, order_id: &str) -> Order {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .expect("order not found")
    }

    pub fn status_of(&self, order_id: &str) -> OrderStatus {
        self.order(order_id).status
    }

    /// Every status write, in order.
    pub fn status_history(&self) -> Vec<(String, OrderStatus)> {
        self.history.lock().unwrap().clone()
    }

    fn record_history(&self, order_id: &str, status: OrderStatus) {
        self.history
            .lock()
            .unwrap()
            .push((order_id.to_string(), status));
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn list_pending_orders(&self) -> EngineResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        market_price: Option<Decimal>,
    ) -> EngineResult<Order> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| EngineError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        order.status = status;
        if market_price.is_some() {
            order.market_price = market_price;
        }
        order.updated_at = Utc::now();
        let updated = order.clone();
        drop(orders);
        self.record_history(order_id, status);
        Ok(updated)
    }

    async fn get_order_owner(&self, order_id: &str) -> EngineResult<Option<String>> {
        Ok(self.owners.lock().unwrap().get(order_id).cloned())
    }

    async fn get_settlement_address(&self, order_id: &str) -> EngineResult<Option<String>> {
        Ok(self.addresses.lock().unwrap().get(order_id).cloned())
    }

    async fn get_asset_pair(&self, pair_id: &str) -> EngineResult<Option<AssetPair>> {
        Ok(self.pairs.lock().unwrap().get(pair_id).cloned())
    }

    async fn list_asset_pairs(&self) -> EngineResult<Vec<AssetPair>> {
        Ok(self.pairs.lock().unwrap().values().cloned().collect())
    }

    async fn get_cached_price(&self, pair_id: &str) -> EngineResult<Option<PriceSample>> {
        Ok(self
            .samples
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.pair_id == pair_id)
            .max_by_key(|s| s.observed_at)
            .cloned())
    }

    async fn record_price_sample(&self, sample: &PriceSample) -> EngineResult<()> {
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn create_order(&self, new_order: NewOrder) -> EngineResult<Order> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let order = Order {
            id: format!("order-{}", n),
            order_code: format!("OR{:06}", n),
            wallet_id: new_order.wallet_id,
            pair_id: new_order.pair_id,
            kind: new_order.kind,
            status: OrderStatus::Pending,
            amount: new_order.amount,
            slippage: new_order.slippage,
            limit_price: new_order.limit_price,
            stop_price: new_order.stop_price,
            market_price: None,
            expiration_time: new_order.expiration_time,
            created_at: now,
            updated_at: now,
        };
        self.add_order(order.clone());
        Ok(order)
    }
}

// =============================================================================
// CHAIN DOUBLES
// =============================================================================

#[derive(Default)]
pub struct MockChain {
    pub reserves: Mutex<HashMap<String, PoolReserves>>,
    pub decimals: Mutex<HashMap<String, u32>>,
    pub tx_status: Mutex<HashMap<String, TxStatus>>,
    /// Transaction ids whose status query fails transiently.
    pub failing_txs: Mutex<Vec<String>>,
    /// Scripted submission outcomes, consumed in order. Empty = error.
    pub submissions: Mutex<Vec<SwapSubmission>>,
    pub submitted: Mutex<Vec<SwapRequest>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool_key(asset_a: &Asset, asset_b: &Asset) -> String {
        format!("{}|{}", asset_a.unit(), asset_b.unit())
    }

    pub fn add_pool(&self, asset_a: &Asset, asset_b: &Asset, reserves: PoolReserves) {
        self.reserves
            .lock()
            .unwrap()
            .insert(Self::pool_key(asset_a, asset_b), reserves);
    }

    pub fn set_decimals(&self, asset: &Asset, decimals: u32) {
        self.decimals
            .lock()
            .unwrap()
            .insert(asset.unit(), decimals);
    }

    pub fn set_tx_status(&self, tx_id: &str, status: TxStatus) {
        self.tx_status
            .lock()
            .unwrap()
            .insert(tx_id.to_string(), status);
    }

    pub fn fail_tx_queries(&self, tx_id: &str) {
        self.failing_txs.lock().unwrap().push(tx_id.to_string());
    }

    pub fn push_submission(&self, submission: SwapSubmission) {
        self.submissions.lock().unwrap().push(submission);
    }

    pub fn submitted_requests(&self) -> Vec<SwapRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::chain::ChainDataProvider for MockChain {
    async fn get_pool_reserves(
        &self,
        asset_a: &Asset,
        asset_b: &Asset,
    ) -> EngineResult<Option<PoolReserves>> {
        Ok(self
            .reserves
            .lock()
            .unwrap()
            .get(&Self::pool_key(asset_a, asset_b))
            .cloned())
    }

    async fn get_asset_decimals(&self, asset: &Asset) -> EngineResult<u32> {
        if asset.is_native() {
            return Ok(6);
        }
        Ok(self
            .decimals
            .lock()
            .unwrap()
            .get(&asset.unit())
            .copied()
            .unwrap_or(0))
    }

    async fn get_transaction_status(&self, tx_id: &str) -> EngineResult<TxStatus> {
        if self.failing_txs.lock().unwrap().iter().any(|t| t == tx_id) {
            return Err(EngineError::ChainQueryTransient(format!(
                "scripted failure for {}",
                tx_id
            )));
        }
        Ok(self
            .tx_status
            .lock()
            .unwrap()
            .get(tx_id)
            .copied()
            .unwrap_or(TxStatus::Pending))
    }
}

#[async_trait]
impl crate::chain::ChainSubmitter for MockChain {
    async fn submit_swap(&self, request: &SwapRequest) -> EngineResult<SwapSubmission> {
        self.submitted.lock().unwrap().push(request.clone());
        let mut scripted = self.submissions.lock().unwrap();
        if scripted.is_empty() {
            return Err(EngineError::SubmissionFailure {
                order_id: request.order_id.clone(),
                reason: "no scripted submission outcome".to_string(),
            });
        }
        Ok(scripted.remove(0))
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn native_token_pair(id: &str) -> AssetPair {
    AssetPair {
        id: id.to_string(),
        asset_a: Asset::native(),
        asset_b: Asset {
            policy_id: "policy1".to_string(),
            asset_name: "4d494e".to_string(),
        },
        is_main_pair: true,
    }
}

pub fn pending_order(id: &str, wallet_id: &str, pair_id: &str) -> Order {
    pending_order_at(id, wallet_id, pair_id, Utc::now())
}

pub fn pending_order_at(
    id: &str,
    wallet_id: &str,
    pair_id: &str,
    created_at: DateTime<Utc>,
) -> Order {
    Order {
        id: id.to_string(),
        order_code: format!("OR-{}", id),
        wallet_id: wallet_id.to_string(),
        pair_id: pair_id.to_string(),
        kind: OrderKind::Market,
        status: OrderStatus::Pending,
        amount: dec("100"),
        slippage: dec("0.01"),
        limit_price: None,
        stop_price: None,
        market_price: None,
        expiration_time: created_at + Duration::hours(1),
        created_at,
        updated_at: created_at,
    }
}
