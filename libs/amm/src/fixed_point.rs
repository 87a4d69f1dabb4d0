//! UQ112.112 fixed-point encoding for the cumulative price counters.
//!
//! A price is the ratio of two 112-bit reserves encoded with 112 fractional
//! bits, so the full range `[0, 2^112)` is representable at resolution
//! `2^-112`. The cumulative counters deliberately wrap on overflow; a
//! consumer computing a time-weighted average only ever subtracts two
//! observations, which is exact under wrapping arithmetic.

use ethers_core::types::U256;

/// Number of fractional bits.
pub const RESOLUTION: u32 = 112;

/// Encodes a 112-bit reserve as UQ112.112.
pub fn encode(y: u128) -> U256 {
    U256::from(y) << RESOLUTION
}

/// UQ112.112 price `numerator / denominator`, or `None` for an empty side.
pub fn fraction(numerator: u128, denominator: u128) -> Option<U256> {
    if denominator == 0 {
        return None;
    }
    Some(encode(numerator) / U256::from(denominator))
}

/// Adds `elapsed * (numerator / denominator)` to a cumulative counter,
/// wrapping on overflow. Returns the counter unchanged for an empty side.
pub fn accumulate(counter: U256, numerator: u128, denominator: u128, elapsed: u32) -> U256 {
    match fraction(numerator, denominator) {
        Some(price) => {
            let (delta, _) = price.overflowing_mul(U256::from(elapsed));
            let (next, _) = counter.overflowing_add(delta);
            next
        }
        None => counter,
    }
}
