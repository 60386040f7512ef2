//! Swap amount math for constant-product pools

mod calculator;

pub use calculator::{amount_out, apply_slippage, SlippageDirection};
