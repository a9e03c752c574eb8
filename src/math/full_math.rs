//! Multiply-divide with a 512-bit intermediate

use ethers::types::{U256, U512};

use super::{q96, MathError};

/// `floor(a * b / denominator)` without intermediate overflow.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product: U512 = a.full_mul(b);
    let quotient = product / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Squares a Q64.96 sqrt price back into an X96 price: `p * p / 2^96`.
///
/// The largest valid sqrt price is below 2^161, so the result always fits.
pub fn price_x96_from_sqrt(sqrt_price_x96: U256) -> Result<U256, MathError> {
    mul_div(sqrt_price_x96, sqrt_price_x96, q96())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::max_sqrt_ratio;

    #[test]
    fn test_mul_div_basic() {
        let r = mul_div(U256::from(10u64), U256::from(7u64), U256::from(3u64)).unwrap();
        assert_eq!(r, U256::from(23u64));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // (2^200 * 2^100) / 2^150 = 2^150, the product alone needs 301 bits
        let a = U256::one() << 200;
        let b = U256::one() << 100;
        let d = U256::one() << 150;
        assert_eq!(mul_div(a, b, d).unwrap(), U256::one() << 150);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(U256::one(), U256::one(), U256::zero()),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            mul_div(U256::MAX, U256::MAX, U256::one()),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_price_from_sqrt() {
        // sqrt price 1.0 -> price 1.0
        assert_eq!(price_x96_from_sqrt(q96()).unwrap(), q96());
        // sqrt price 2.0 -> price 4.0
        assert_eq!(
            price_x96_from_sqrt(q96() * U256::from(2u64)).unwrap(),
            q96() * U256::from(4u64)
        );
        // max sqrt price squared stays in range
        assert!(price_x96_from_sqrt(max_sqrt_ratio()).is_ok());
    }
}
