//! Tick to sqrt-price conversion
//!
//! Computes `sqrt(1.0001^tick) * 2^96` with the same bit-by-bit constant
//! table as the Uniswap V3 `TickMath` library, so results match the pool
//! contracts exactly.

use ethers::types::U256;

use super::MathError;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`
pub fn min_sqrt_ratio() -> U256 {
    U256::from(4_295_128_739u64)
}

/// `get_sqrt_ratio_at_tick(MAX_TICK)`
pub fn max_sqrt_ratio() -> U256 {
    // 1461446703485210103287273052203988822378723970342
    U256([
        0x5d95_1d52_6398_8d26,
        0xefd1_fc6a_5064_8849,
        0x0000_0000_fffd_8963,
        0,
    ])
}

/// `1 / sqrt(1.0001^(2^i))` in Q128.128 for bit `i` of |tick|, i >= 1
const RATIO_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfRange(i64::from(tick)));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::one() << 128
    };
    for (bit, factor) in RATIO_FACTORS {
        if abs_tick & bit != 0 {
            // both operands < 2^128
            ratio = (ratio * U256::from(factor)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so the inverse lookup stays consistent
    let remainder = ratio & U256::from(u32::MAX);
    let sqrt_price_x96 = (ratio >> 32) + if remainder.is_zero() { U256::zero() } else { U256::one() };
    Ok(sqrt_price_x96)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::q96;

    #[test]
    fn test_tick_zero_is_q96() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), q96());
    }

    #[test]
    fn test_bounds() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), min_sqrt_ratio());
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), max_sqrt_ratio());
        assert_eq!(
            max_sqrt_ratio(),
            U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap()
        );
    }

    #[test]
    fn test_adjacent_ticks() {
        assert_eq!(
            get_sqrt_ratio_at_tick(1).unwrap(),
            U256::from_dec_str("79232123823359799118286999568").unwrap()
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(-1).unwrap(),
            U256::from_dec_str("79224201403219477170569942574").unwrap()
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK - 1),
            Err(MathError::TickOutOfRange(i64::from(MIN_TICK) - 1))
        );
        assert!(get_sqrt_ratio_at_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_monotonic_around_zero() {
        let mut prev = get_sqrt_ratio_at_tick(-50).unwrap();
        for tick in -49..=50 {
            let next = get_sqrt_ratio_at_tick(tick).unwrap();
            assert!(next > prev, "ratio must increase at tick {}", tick);
            prev = next;
        }
    }

    #[test]
    fn test_reciprocal_symmetry() {
        // sqrt(p(t)) * sqrt(p(-t)) == 1, i.e. product ~ 2^192
        let one_x192 = U256::one() << 192;
        for tick in [1, 60, 200, 10_000] {
            let up = get_sqrt_ratio_at_tick(tick).unwrap();
            let down = get_sqrt_ratio_at_tick(-tick).unwrap();
            let product = up.full_mul(down);
            let expected = ethers::types::U512::from(one_x192);
            let diff = if product > expected {
                product - expected
            } else {
                expected - product
            };
            // relative error well under 1e-12
            assert!(diff * ethers::types::U512::from(1_000_000_000_000u64) < expected);
        }
    }
}
