//! swapbot: automated order execution and settlement engine
//!
//! Periodically scans pending swap orders, enforces one in-flight order
//! per wallet through a shared lock store, resolves pair prices from a
//! history cache or live pool reserves, submits eligible swaps and
//! releases wallets once their transactions confirm on chain.

pub mod arguments;
pub mod chain;
pub mod config;
pub mod confirm;
pub mod errors;
pub mod events;
pub mod lock;
pub mod logger;
pub mod notifications;
pub mod persistence;
pub mod pricing;
pub mod run;
pub mod scheduler;
pub mod store;
pub mod swap;
pub mod types;

#[cfg(test)]
pub mod testkit;
