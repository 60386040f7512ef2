//! Core domain types shared across the engine
//!
//! Orders, wallets, asset pairs and the chain-facing value types. These are
//! plain data carriers; all behavior lives in the scheduler, resolver and
//! calculator modules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// ORDERS
// =============================================================================

/// Order kind as selected by the user at creation time.
///
/// StopLimit is reserved for a future release; the scheduler never considers
/// such orders eligible for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
    StopLimit,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit => "LIMIT",
            OrderKind::StopLimit => "STOP_LIMIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MARKET" => Some(OrderKind::Market),
            "LIMIT" => Some(OrderKind::Limit),
            "STOP_LIMIT" => Some(OrderKind::StopLimit),
            _ => None,
        }
    }
}

/// Order lifecycle status.
///
/// Transitions are monotonic: PENDING -> PROCESSING -> {COMPLETED, FAILED},
/// PENDING -> EXPIRED, PENDING -> CANCELLED (user action, outside the
/// scheduler). PROCESSING is entered immediately before chain submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Failed,
    Expired,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PROCESSING" => Some(OrderStatus::Processing),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "FAILED" => Some(OrderStatus::Failed),
            "EXPIRED" => Some(OrderStatus::Expired),
            _ => None,
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's trade intent.
///
/// Created by the bot front-end; after creation only the scheduler mutates it
/// (status and recorded market price).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Short human-readable code, unique across all orders (e.g. OR250825123).
    pub order_code: String,
    pub wallet_id: String,
    pub pair_id: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    /// Requested amount in human units of the input asset.
    pub amount: Decimal,
    /// Slippage tolerance as a fraction in [0, 1).
    pub slippage: Decimal,
    /// Required and non-null only when kind = Limit.
    pub limit_price: Option<Decimal>,
    /// Reserved for stop-limit orders.
    pub stop_price: Option<Decimal>,
    /// Market price recorded when the order reaches a terminal trade state.
    pub market_price: Option<Decimal>,
    pub expiration_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time < now
    }
}

// =============================================================================
// WALLETS AND ASSETS
// =============================================================================

/// A custodial trading identity. Immutable after creation except for key
/// rotation, which is outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub stake_id: String,
    pub encrypted_key: String,
}

/// On-chain asset descriptor: policy id plus hex-encoded name.
///
/// The native asset is represented by an empty policy id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub policy_id: String,
    pub asset_name: String,
}

impl Asset {
    pub fn native() -> Self {
        Asset {
            policy_id: String::new(),
            asset_name: String::new(),
        }
    }

    pub fn is_native(&self) -> bool {
        self.policy_id.is_empty() && self.asset_name.is_empty()
    }

    /// Concatenated unit used by the indexer API.
    pub fn unit(&self) -> String {
        if self.is_native() {
            "lovelace".to_string()
        } else {
            format!("{}{}", self.policy_id, self.asset_name)
        }
    }
}

/// A tradable pair with a designated primary quotation direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPair {
    pub id: String,
    pub asset_a: Asset,
    pub asset_b: Asset,
    /// True when the canonical quote is A->B (price of A denominated in B).
    pub is_main_pair: bool,
}

/// A price observation for a pair, used for cache-first resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSample {
    pub pair_id: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

// =============================================================================
// CHAIN VALUES
// =============================================================================

/// Current reserves and fee schedule of a liquidity pool.
///
/// Reserves are in smallest-denomination units. The fee is a proportional
/// fraction fee_numerator / fee_denominator taken from the input side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReserves {
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub fee_numerator: u64,
    pub fee_denominator: u64,
}

/// Parameters for a swap submission, all amounts in base units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub order_id: String,
    pub wallet_id: String,
    pub address: String,
    pub asset_in: Asset,
    pub asset_out: Asset,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
    pub is_limit_order: bool,
}

/// Outcome of a swap submission. `tx_id` is present only on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSubmission {
    pub success: bool,
    pub tx_id: Option<String>,
}

/// Confirmation state of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Included in a finalized block.
    Confirmed,
    /// Known or not yet indexed, but without a block height.
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
            OrderStatus::Expired,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn native_asset_unit() {
        assert_eq!(Asset::native().unit(), "lovelace");
        let token = Asset {
            policy_id: "abc123".to_string(),
            asset_name: "4d494e".to_string(),
        };
        assert!(!token.is_native());
        assert_eq!(token.unit(), "abc1234d494e");
    }
}
