//! SQLite-backed order store
//!
//! Single bundled-sqlite connection behind a mutex. Decimal columns are
//! stored as TEXT to keep full precision; timestamps are RFC 3339 strings.

use super::{NewOrder, OrderStore};
use crate::errors::{EngineError, EngineResult};
use crate::logger::{self, LogTag};
use crate::types::{Asset, AssetPair, Order, OrderKind, OrderStatus, PriceSample, Wallet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        logger::info(
            LogTag::Database,
            &format!("Opened database at {}", path.display()),
        );
        Ok(db)
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                order_code TEXT NOT NULL UNIQUE,
                wallet_id TEXT NOT NULL,
                pair_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                amount TEXT NOT NULL,
                slippage TEXT NOT NULL,
                limit_price TEXT,
                stop_price TEXT,
                market_price TEXT,
                expiration_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);

            CREATE TABLE IF NOT EXISTS wallets (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                chat_ref TEXT NOT NULL,
                stake_id TEXT NOT NULL,
                encrypted_key TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS wallet_addresses (
                wallet_id TEXT NOT NULL,
                address TEXT NOT NULL,
                is_primary INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS token_pairs (
                id TEXT PRIMARY KEY,
                policy_a TEXT NOT NULL,
                name_a TEXT NOT NULL,
                policy_b TEXT NOT NULL,
                name_b TEXT NOT NULL,
                is_main_pair INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS pair_price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pair_id TEXT NOT NULL,
                price TEXT NOT NULL,
                observed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_price_history_pair
                ON pair_price_history(pair_id, observed_at);",
        )?;
        Ok(())
    }

    /// Register a wallet with its primary settlement address. Used by the
    /// account-registration collaborator and by tests.
    pub fn insert_wallet(&self, wallet: &Wallet, chat_ref: &str, address: &str) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO wallets (id, user_id, chat_ref, stake_id, encrypted_key)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                wallet.id,
                wallet.user_id,
                chat_ref,
                wallet.stake_id,
                wallet.encrypted_key
            ],
        )?;
        conn.execute(
            "INSERT INTO wallet_addresses (wallet_id, address, is_primary) VALUES (?1, ?2, 1)",
            params![wallet.id, address],
        )?;
        Ok(())
    }

    pub fn insert_asset_pair(&self, pair: &AssetPair) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO token_pairs (id, policy_a, name_a, policy_b, name_b, is_main_pair)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pair.id,
                pair.asset_a.policy_id,
                pair.asset_a.asset_name,
                pair.asset_b.policy_id,
                pair.asset_b.asset_name,
                pair.is_main_pair as i64
            ],
        )?;
        Ok(())
    }

    fn row_to_order(row: &Row<'_>) -> Result<Order, rusqlite::Error> {
        Ok(Order {
            id: row.get("id")?,
            order_code: row.get("order_code")?,
            wallet_id: row.get("wallet_id")?,
            pair_id: row.get("pair_id")?,
            kind: parse_kind(&row.get::<_, String>("kind")?)?,
            status: parse_status(&row.get::<_, String>("status")?)?,
            amount: parse_decimal(&row.get::<_, String>("amount")?)?,
            slippage: parse_decimal(&row.get::<_, String>("slippage")?)?,
            limit_price: parse_opt_decimal(row.get::<_, Option<String>>("limit_price")?)?,
            stop_price: parse_opt_decimal(row.get::<_, Option<String>>("stop_price")?)?,
            market_price: parse_opt_decimal(row.get::<_, Option<String>>("market_price")?)?,
            expiration_time: parse_timestamp(&row.get::<_, String>("expiration_time")?)?,
            created_at: parse_timestamp(&row.get::<_, String>("created_at")?)?,
            updated_at: parse_timestamp(&row.get::<_, String>("updated_at")?)?,
        })
    }

    fn find_by_code(&self, code: &str) -> EngineResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE order_code = ?1",
            [code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Generate a short order code: OR + yymmdd + three random digits,
    /// retried until unique.
    fn generate_order_code(&self) -> EngineResult<String> {
        let date_part = Utc::now().format("%y%m%d").to_string();
        loop {
            let random_part: u32 = rand::thread_rng().gen_range(0..1000);
            let code = format!("OR{}{:03}", date_part, random_part);
            if !self.find_by_code(&code)? {
                return Ok(code);
            }
        }
    }
}

fn parse_kind(s: &str) -> Result<OrderKind, rusqlite::Error> {
    OrderKind::parse(s).ok_or(rusqlite::Error::InvalidQuery)
}

fn parse_status(s: &str) -> Result<OrderStatus, rusqlite::Error> {
    OrderStatus::parse(s).ok_or(rusqlite::Error::InvalidQuery)
}

fn parse_decimal(s: &str) -> Result<Decimal, rusqlite::Error> {
    s.parse().map_err(|_| rusqlite::Error::InvalidQuery)
}

fn parse_opt_decimal(s: Option<String>) -> Result<Option<Decimal>, rusqlite::Error> {
    s.map(|v| parse_decimal(&v)).transpose()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

#[async_trait]
impl OrderStore for Database {
    async fn list_pending_orders(&self) -> EngineResult<Vec<Order>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM orders WHERE status = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([OrderStatus::Pending.as_str()], Self::row_to_order)?;

        let mut orders = Vec::new();
        for order in rows {
            orders.push(order?);
        }
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        market_price: Option<Decimal>,
    ) -> EngineResult<Order> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        // Terminal statuses are write-once; the WHERE clause encodes the
        // state machine so no caller can rewrite a finished order
        let changed = match market_price {
            Some(price) => conn.execute(
                "UPDATE orders SET status = ?1, market_price = ?2, updated_at = ?3
                 WHERE id = ?4 AND status IN ('PENDING', 'PROCESSING')",
                params![status.as_str(), price.to_string(), now, order_id],
            )?,
            None => conn.execute(
                "UPDATE orders SET status = ?1, updated_at = ?2
                 WHERE id = ?3 AND status IN ('PENDING', 'PROCESSING')",
                params![status.as_str(), now, order_id],
            )?,
        };
        if changed == 0 {
            let current: Option<String> = conn
                .query_row(
                    "SELECT status FROM orders WHERE id = ?1",
                    [order_id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            return match current {
                Some(current) => Err(EngineError::InvalidStatusTransition {
                    order_id: order_id.to_string(),
                    current,
                }),
                None => Err(EngineError::OrderNotFound {
                    order_id: order_id.to_string(),
                }),
            };
        }
        let order = conn.query_row(
            "SELECT * FROM orders WHERE id = ?1",
            [order_id],
            Self::row_to_order,
        )?;
        Ok(order)
    }

    async fn get_order_owner(&self, order_id: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT w.chat_ref FROM orders o
                 JOIN wallets w ON w.id = o.wallet_id
                 WHERE o.id = ?1",
                [order_id],
                |row| row.get::<_, String>(0),
            )
            .map(Some);
        match result {
            Ok(owner) => Ok(owner),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_settlement_address(&self, order_id: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT a.address FROM orders o
             JOIN wallet_addresses a ON a.wallet_id = o.wallet_id AND a.is_primary = 1
             WHERE o.id = ?1",
            [order_id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(address) => Ok(Some(address)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_asset_pair(&self, pair_id: &str) -> EngineResult<Option<AssetPair>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, policy_a, name_a, policy_b, name_b, is_main_pair
             FROM token_pairs WHERE id = ?1",
            [pair_id],
            row_to_pair,
        );
        match result {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_asset_pairs(&self) -> EngineResult<Vec<AssetPair>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, policy_a, name_a, policy_b, name_b, is_main_pair FROM token_pairs",
        )?;
        let rows = stmt.query_map([], row_to_pair)?;
        let mut pairs = Vec::new();
        for pair in rows {
            pairs.push(pair?);
        }
        Ok(pairs)
    }

    async fn get_cached_price(&self, pair_id: &str) -> EngineResult<Option<PriceSample>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT pair_id, price, observed_at FROM pair_price_history
             WHERE pair_id = ?1 ORDER BY observed_at DESC LIMIT 1",
            [pair_id],
            |row| {
                Ok(PriceSample {
                    pair_id: row.get(0)?,
                    price: parse_decimal(&row.get::<_, String>(1)?)?,
                    observed_at: parse_timestamp(&row.get::<_, String>(2)?)?,
                })
            },
        );
        match result {
            Ok(sample) => Ok(Some(sample)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_price_sample(&self, sample: &PriceSample) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pair_price_history (pair_id, price, observed_at) VALUES (?1, ?2, ?3)",
            params![
                sample.pair_id,
                sample.price.to_string(),
                sample.observed_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    async fn create_order(&self, new_order: NewOrder) -> EngineResult<Order> {
        if new_order.kind == OrderKind::Limit && new_order.limit_price.is_none() {
            return Err(EngineError::Configuration(
                "limit order requires a limit price".to_string(),
            ));
        }

        let now = Utc::now();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_code: self.generate_order_code()?,
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

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO orders (
                id, order_code, wallet_id, pair_id, kind, status, amount, slippage,
                limit_price, stop_price, market_price, expiration_time, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                order.id,
                order.order_code,
                order.wallet_id,
                order.pair_id,
                order.kind.as_str(),
                order.status.as_str(),
                order.amount.to_string(),
                order.slippage.to_string(),
                order.limit_price.map(|p| p.to_string()),
                order.stop_price.map(|p| p.to_string()),
                Option::<String>::None,
                order.expiration_time.to_rfc3339(),
                order.created_at.to_rfc3339(),
                order.updated_at.to_rfc3339()
            ],
        )?;
        Ok(order)
    }
}

fn row_to_pair(row: &Row<'_>) -> Result<AssetPair, rusqlite::Error> {
    Ok(AssetPair {
        id: row.get(0)?,
        asset_a: Asset {
            policy_id: row.get(1)?,
            asset_name: row.get(2)?,
        },
        asset_b: Asset {
            policy_id: row.get(3)?,
            asset_name: row.get(4)?,
        },
        is_main_pair: row.get::<_, i64>(5)? != 0,
    })
}
