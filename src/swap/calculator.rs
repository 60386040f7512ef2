//! Constant-product AMM output calculation
//!
//! Pure integer math over smallest-denomination amounts. The proportional
//! trading fee is taken from the input side:
//!
//!   effective_in = (fee_denominator - fee_numerator) * amount_in
//!   amount_out   = effective_in * reserve_out
//!                  / (fee_denominator * reserve_in + effective_in)
//!
//! Division truncates toward zero. Intermediates use u128 so realistic
//! u64 reserves cannot overflow.

use crate::errors::{EngineError, EngineResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Direction for slippage adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageDirection {
    /// Minimum acceptable output.
    Down,
    /// Maximum acceptable input.
    Up,
}

/// Compute the output amount for an exact-in swap against pool reserves.
///
/// A fee numerator approaching the denominator drives the output toward
/// zero; that is a valid (if useless) fee schedule, not an error.
pub fn amount_out(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    fee_numerator: u64,
    fee_denominator: u64,
) -> EngineResult<u64> {
    if fee_denominator == 0 || fee_numerator >= fee_denominator {
        return Err(EngineError::NumericOverflow {
            context: "invalid fee schedule",
        });
    }
    if amount_in == 0 {
        return Ok(0);
    }

    let effective_in = (fee_denominator - fee_numerator) as u128 * amount_in as u128;
    let numerator = effective_in
        .checked_mul(reserve_out as u128)
        .ok_or(EngineError::NumericOverflow {
            context: "amount_out numerator",
        })?;
    let denominator = (fee_denominator as u128)
        .checked_mul(reserve_in as u128)
        .and_then(|v| v.checked_add(effective_in))
        .ok_or(EngineError::NumericOverflow {
            context: "amount_out denominator",
        })?;

    let out = numerator / denominator;
    u64::try_from(out).map_err(|_| EngineError::NumericOverflow {
        context: "amount_out result",
    })
}

/// Apply a slippage tolerance fraction in [0, 1) to an amount.
///
/// `Down` floors toward a minimum acceptable output, `Up` ceils toward a
/// maximum acceptable input.
pub fn apply_slippage(
    amount: u64,
    tolerance: Decimal,
    direction: SlippageDirection,
) -> EngineResult<u64> {
    if tolerance < Decimal::ZERO || tolerance >= Decimal::ONE {
        return Err(EngineError::NumericOverflow {
            context: "slippage tolerance out of range",
        });
    }

    let amount_dec = Decimal::from(amount);
    let adjusted = match direction {
        SlippageDirection::Down => (amount_dec * (Decimal::ONE - tolerance)).floor(),
        SlippageDirection::Up => (amount_dec * (Decimal::ONE + tolerance)).ceil(),
    };

    adjusted.to_u64().ok_or(EngineError::NumericOverflow {
        context: "slippage-adjusted amount",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn reference_vector() {
        // effective_in = 997 * 100 = 99700
        // numerator = 99700 * 1000 = 99_700_000
        // denominator = 1000 * 1000 + 99700 = 1_099_700
        // floor(99_700_000 / 1_099_700) = 90
        assert_eq!(amount_out(1000, 1000, 100, 3, 1000).unwrap(), 90);
    }

    #[test]
    fn zero_input_yields_zero() {
        assert_eq!(amount_out(1000, 1000, 0, 3, 1000).unwrap(), 0);
        assert_eq!(amount_out(1, u64::MAX, 0, 0, 1).unwrap(), 0);
    }

    #[test]
    fn monotone_in_amount_in() {
        let mut prev = 0;
        for amount_in in [1u64, 10, 100, 1_000, 10_000, 100_000] {
            let out = amount_out(1_000_000, 1_000_000, amount_in, 3, 1000).unwrap();
            assert!(out >= prev, "output decreased at amount_in={}", amount_in);
            prev = out;
        }
    }

    #[test]
    fn non_increasing_in_fee() {
        let mut prev = u64::MAX;
        for fee in [0u64, 3, 30, 300, 999] {
            let out = amount_out(1_000_000, 1_000_000, 10_000, fee, 1000).unwrap();
            assert!(out <= prev, "output increased at fee={}", fee);
            prev = out;
        }
    }

    #[test]
    fn near_total_fee_drives_output_to_zero() {
        assert_eq!(amount_out(1_000_000, 1_000_000, 100, 999, 1000).unwrap(), 0);
    }

    #[test]
    fn invalid_fee_schedule_rejected() {
        assert!(amount_out(1000, 1000, 100, 1000, 1000).is_err());
        assert!(amount_out(1000, 1000, 100, 1001, 1000).is_err());
        assert!(amount_out(1000, 1000, 100, 0, 0).is_err());
    }

    #[test]
    fn large_reserves_do_not_overflow() {
        // Near-maximal realistic values must stay inside u128 intermediates
        let out = amount_out(u64::MAX / 2, u64::MAX / 2, 1_000_000_000, 3, 10_000).unwrap();
        assert!(out <= 1_000_000_000);
    }

    #[test]
    fn slippage_down_floors() {
        let tol = dec("0.01");
        assert_eq!(apply_slippage(1000, tol, SlippageDirection::Down).unwrap(), 990);
        // 99.5% of 999 = 994.005 -> floor 994
        let tol = dec("0.005");
        assert_eq!(apply_slippage(999, tol, SlippageDirection::Down).unwrap(), 994);
    }

    #[test]
    fn slippage_up_ceils() {
        let tol = dec("0.005");
        // 999 * 1.005 = 1003.995 -> ceil 1004
        assert_eq!(apply_slippage(999, tol, SlippageDirection::Up).unwrap(), 1004);
    }

    #[test]
    fn zero_tolerance_is_identity() {
        assert_eq!(
            apply_slippage(12345, Decimal::ZERO, SlippageDirection::Down).unwrap(),
            12345
        );
        assert_eq!(
            apply_slippage(12345, Decimal::ZERO, SlippageDirection::Up).unwrap(),
            12345
        );
    }

    #[test]
    fn tolerance_out_of_range_rejected() {
        assert!(apply_slippage(1000, Decimal::ONE, SlippageDirection::Down).is_err());
        assert!(apply_slippage(1000, dec("-0.1"), SlippageDirection::Down).is_err());
    }
}
