//! Fixed-point price math
//!
//! Tick to sqrt-price conversion, 512-bit multiply-divide and the
//! time-weighted tick average used by the windowed safety levels.

pub mod full_math;
pub mod tick_math;

pub use full_math::{mul_div, price_x96_from_sqrt};
pub use tick_math::{get_sqrt_ratio_at_tick, max_sqrt_ratio, min_sqrt_ratio, MAX_TICK, MIN_TICK};

use ethers::types::U256;
use serde::Deserialize;
use thiserror::Error;

/// Number of fractional bits in an X96 fixed-point value
pub const RESOLUTION: u32 = 96;

/// 2^96
pub fn q96() -> U256 {
    U256::one() << RESOLUTION
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("tick {0} outside [-887272, 887272]")]
    TickOutOfRange(i64),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result does not fit in 256 bits")]
    Overflow,
}

/// Rounding applied when dividing a tick-cumulative delta by the elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickRounding {
    /// Round toward negative infinity
    #[default]
    Floor,
    /// Round toward zero (signed integer division on the EVM)
    Truncate,
}

impl TickRounding {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "floor" => Some(TickRounding::Floor),
            "truncate" | "trunc" => Some(TickRounding::Truncate),
            _ => None,
        }
    }
}

/// Time-weighted average tick between two cumulative readings.
///
/// `timespan` is the signed time difference matching the signed cumulative
/// difference; both are flipped when the span runs backwards so rounding is
/// always applied to a positive divisor. A zero span has no average.
pub fn average_tick(
    tick_cumulative_delta: i64,
    timespan: i64,
    rounding: TickRounding,
) -> Result<i32, MathError> {
    if timespan == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (delta, span) = if timespan < 0 {
        let delta = tick_cumulative_delta
            .checked_neg()
            .ok_or(MathError::Overflow)?;
        (delta, -timespan)
    } else {
        (tick_cumulative_delta, timespan)
    };
    let avg = match rounding {
        TickRounding::Floor => delta.div_euclid(span),
        TickRounding::Truncate => delta / span,
    };
    if avg < i64::from(MIN_TICK) || avg > i64::from(MAX_TICK) {
        return Err(MathError::TickOutOfRange(avg));
    }
    Ok(avg as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q96_value() {
        assert_eq!(
            q96(),
            U256::from_dec_str("79228162514264337593543950336").unwrap()
        );
    }

    #[test]
    fn test_average_tick_positive_delta() {
        assert_eq!(average_tick(100, 10, TickRounding::Floor).unwrap(), 10);
        assert_eq!(average_tick(105, 10, TickRounding::Floor).unwrap(), 10);
        assert_eq!(average_tick(105, 10, TickRounding::Truncate).unwrap(), 10);
    }

    #[test]
    fn test_average_tick_negative_delta_floor_vs_truncate() {
        // -105 / 10 = -10.5
        assert_eq!(average_tick(-105, 10, TickRounding::Floor).unwrap(), -11);
        assert_eq!(average_tick(-105, 10, TickRounding::Truncate).unwrap(), -10);
        // exact division agrees
        assert_eq!(average_tick(-100, 10, TickRounding::Floor).unwrap(), -10);
        assert_eq!(average_tick(-100, 10, TickRounding::Truncate).unwrap(), -10);
    }

    #[test]
    fn test_average_tick_reversed_span() {
        // same interval read newest-first
        assert_eq!(average_tick(-105, -10, TickRounding::Floor).unwrap(), 10);
        assert_eq!(average_tick(105, -10, TickRounding::Floor).unwrap(), -11);
        assert_eq!(average_tick(105, -10, TickRounding::Truncate).unwrap(), -10);
    }

    #[test]
    fn test_average_tick_zero_timespan() {
        assert_eq!(
            average_tick(5, 0, TickRounding::Floor),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_average_tick_out_of_range() {
        let delta = (i64::from(MAX_TICK) + 1) * 2;
        assert!(matches!(
            average_tick(delta, 2, TickRounding::Floor),
            Err(MathError::TickOutOfRange(_))
        ));
    }

    #[test]
    fn test_average_tick_unnegatable_delta() {
        assert_eq!(
            average_tick(i64::MIN, -1, TickRounding::Floor),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_rounding_from_name() {
        assert_eq!(TickRounding::from_name("FLOOR"), Some(TickRounding::Floor));
        assert_eq!(TickRounding::from_name("truncate"), Some(TickRounding::Truncate));
        assert_eq!(TickRounding::from_name("ceil"), None);
    }
}
