//! Constant-product math with exact integer calculations.
//!
//! All amounts are `U256`; reserves are `u128` because the engine bounds
//! them to 112 bits before they ever reach this layer. Division always
//! floors except where the protocol rounds against the caller
//! ([`CpMath::get_amount_in`] adds one).

use ethers_core::types::U256;
use thiserror::Error;
use types::MINIMUM_LIQUIDITY;

/// Failures of the pure math layer.
///
/// Each variant maps onto exactly one rejection the engine or router
/// surfaces; nothing here is ever downgraded or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("insufficient amount: quoting zero input")]
    InsufficientAmount,

    #[error("insufficient liquidity for requested operation")]
    InsufficientLiquidity,

    #[error("insufficient input amount")]
    InsufficientInputAmount,

    #[error("insufficient output amount")]
    InsufficientOutputAmount,

    #[error("insufficient liquidity minted: computed share amount is zero")]
    InsufficientLiquidityMinted,

    #[error("insufficient liquidity burned: computed withdrawal is zero")]
    InsufficientLiquidityBurned,

    #[error("fee-adjusted product decreased")]
    InvalidK,

    #[error("arithmetic overflow")]
    Overflow,
}

/// Constant-product math functions with zero precision loss.
pub struct CpMath;

impl CpMath {
    /// Quotes the equivalent amount of asset B for `amount_a` of asset A at
    /// the current reserve ratio: `amount_a * reserve_b / reserve_a`.
    pub fn quote(amount_a: U256, reserve_a: u128, reserve_b: u128) -> Result<U256, AmmError> {
        if amount_a.is_zero() {
            return Err(AmmError::InsufficientAmount);
        }
        if reserve_a == 0 || reserve_b == 0 {
            return Err(AmmError::InsufficientLiquidity);
        }
        let numerator = amount_a
            .checked_mul(U256::from(reserve_b))
            .ok_or(AmmError::Overflow)?;
        Ok(numerator / U256::from(reserve_a))
    }

    /// Liquidity minted by the very first deposit into an empty pool:
    /// `sqrt(amount0 * amount1) - MINIMUM_LIQUIDITY`.
    ///
    /// The subtracted lockup is minted separately to the unspendable
    /// sentinel and never credited to the depositor.
    pub fn liquidity_for_first_mint(amount0: U256, amount1: U256) -> Result<U256, AmmError> {
        let product = amount0.checked_mul(amount1).ok_or(AmmError::Overflow)?;
        let liquidity = Self::isqrt(product)
            .checked_sub(U256::from(MINIMUM_LIQUIDITY))
            .ok_or(AmmError::InsufficientLiquidityMinted)?;
        if liquidity.is_zero() {
            return Err(AmmError::InsufficientLiquidityMinted);
        }
        Ok(liquidity)
    }

    /// Liquidity minted by a deposit into a non-empty pool:
    /// `min(amount0 * total / reserve0, amount1 * total / reserve1)`.
    ///
    /// Taking the minimum credits a skewed deposit only for its limiting
    /// side; the excess of the other asset is a donation to existing
    /// holders and is never refunded by this layer.
    pub fn liquidity_for_subsequent_mint(
        amount0: U256,
        amount1: U256,
        reserve0: u128,
        reserve1: u128,
        total_supply: U256,
    ) -> Result<U256, AmmError> {
        if reserve0 == 0 || reserve1 == 0 {
            return Err(AmmError::InsufficientLiquidity);
        }
        let share0 = amount0
            .checked_mul(total_supply)
            .ok_or(AmmError::Overflow)?
            / U256::from(reserve0);
        let share1 = amount1
            .checked_mul(total_supply)
            .ok_or(AmmError::Overflow)?
            / U256::from(reserve1);
        let liquidity = share0.min(share1);
        if liquidity.is_zero() {
            return Err(AmmError::InsufficientLiquidityMinted);
        }
        Ok(liquidity)
    }

    /// Pro-rata withdrawal amounts for burning `liquidity` shares:
    /// `liquidity * balance / total_supply` per asset, floor division.
    ///
    /// Balances rather than reserves are distributed so that donations
    /// sitting in the pool are shared out too.
    pub fn amounts_for_burn(
        liquidity: U256,
        total_supply: U256,
        balance0: U256,
        balance1: U256,
    ) -> Result<(U256, U256), AmmError> {
        if total_supply.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }
        let amount0 = liquidity
            .checked_mul(balance0)
            .ok_or(AmmError::Overflow)?
            / total_supply;
        let amount1 = liquidity
            .checked_mul(balance1)
            .ok_or(AmmError::Overflow)?
            / total_supply;
        if amount0.is_zero() || amount1.is_zero() {
            return Err(AmmError::InsufficientLiquidityBurned);
        }
        Ok((amount0, amount1))
    }

    /// The central correctness property of every swap: after deducting the
    /// fee from whichever side received input, the product of the adjusted
    /// balances must not fall below the pre-swap reserve product.
    ///
    /// `adjusted = balance * fee_den - amount_in * fee_num`, compared
    /// against `reserve0 * reserve1 * fee_den^2`.
    #[allow(clippy::too_many_arguments)]
    pub fn validate_swap_invariant(
        balance0: U256,
        balance1: U256,
        reserve0: u128,
        reserve1: u128,
        amount0_in: U256,
        amount1_in: U256,
        fee_num: u32,
        fee_den: u32,
    ) -> Result<(), AmmError> {
        let adjust = |balance: U256, amount_in: U256| {
            balance
                .checked_mul(U256::from(fee_den))
                .and_then(|scaled| {
                    amount_in
                        .checked_mul(U256::from(fee_num))
                        .and_then(|fee| scaled.checked_sub(fee))
                })
                .ok_or(AmmError::Overflow)
        };
        let adjusted0 = adjust(balance0, amount0_in)?;
        let adjusted1 = adjust(balance1, amount1_in)?;
        let lhs = adjusted0.checked_mul(adjusted1).ok_or(AmmError::Overflow)?;
        let rhs = U256::from(reserve0)
            * U256::from(reserve1)
            * U256::from(fee_den)
            * U256::from(fee_den);
        if lhs < rhs {
            return Err(AmmError::InvalidK);
        }
        Ok(())
    }

    /// Protocol-fee liquidity owed for pool growth since the last
    /// liquidity-changing event: `total * (√k - √k_last) / (5√k + √k_last)`,
    /// a one-sixth skim of growth, applied lazily at the next mint/burn.
    ///
    /// Returns `None` when the fee is disabled (`k_last == 0`), the pool
    /// has not grown, or the computed share amount floors to zero.
    pub fn protocol_fee_liquidity(
        k_last: U256,
        reserve0: u128,
        reserve1: u128,
        total_supply: U256,
    ) -> Option<U256> {
        if k_last.is_zero() {
            return None;
        }
        let root_k = Self::isqrt(U256::from(reserve0) * U256::from(reserve1));
        let root_k_last = Self::isqrt(k_last);
        if root_k <= root_k_last {
            return None;
        }
        let numerator = total_supply * (root_k - root_k_last);
        let denominator = root_k * U256::from(5u8) + root_k_last;
        let liquidity = numerator / denominator;
        if liquidity.is_zero() {
            None
        } else {
            Some(liquidity)
        }
    }

    /// Maximum output obtainable for an exact input:
    /// `in' = in * (fee_den - fee_num)`, then
    /// `out = in' * reserve_out / (reserve_in * fee_den + in')`.
    pub fn get_amount_out(
        amount_in: U256,
        reserve_in: u128,
        reserve_out: u128,
        fee_num: u32,
        fee_den: u32,
    ) -> Result<U256, AmmError> {
        if amount_in.is_zero() {
            return Err(AmmError::InsufficientInputAmount);
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::InsufficientLiquidity);
        }
        let amount_in_with_fee = amount_in
            .checked_mul(U256::from(fee_den - fee_num))
            .ok_or(AmmError::Overflow)?;
        let numerator = amount_in_with_fee
            .checked_mul(U256::from(reserve_out))
            .ok_or(AmmError::Overflow)?;
        let denominator = U256::from(reserve_in) * U256::from(fee_den) + amount_in_with_fee;
        Ok(numerator / denominator)
    }

    /// Minimum input required for an exact output; rounds up so the
    /// returned input always satisfies the invariant check.
    pub fn get_amount_in(
        amount_out: U256,
        reserve_in: u128,
        reserve_out: u128,
        fee_num: u32,
        fee_den: u32,
    ) -> Result<U256, AmmError> {
        if amount_out.is_zero() {
            return Err(AmmError::InsufficientOutputAmount);
        }
        if reserve_in == 0 || reserve_out == 0 || amount_out >= U256::from(reserve_out) {
            return Err(AmmError::InsufficientLiquidity);
        }
        let numerator = U256::from(reserve_in)
            .checked_mul(amount_out)
            .ok_or(AmmError::Overflow)?
            .checked_mul(U256::from(fee_den))
            .ok_or(AmmError::Overflow)?;
        let denominator =
            (U256::from(reserve_out) - amount_out) * U256::from(fee_den - fee_num);
        Ok(numerator / denominator + U256::one())
    }

    /// Integer square root via the Babylonian method, floor result.
    pub fn isqrt(n: U256) -> U256 {
        if n.is_zero() {
            return U256::zero();
        }
        let mut x = n;
        let mut y = (x + U256::one()) >> 1;
        while y < x {
            x = y;
            y = (x + n / x) >> 1;
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{DEFAULT_SWAP_FEE_DEN, DEFAULT_SWAP_FEE_NUM};

    fn wei(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn quote_scales_by_reserve_ratio() {
        let out = CpMath::quote(U256::from(100u64), 1_000, 2_000).unwrap();
        assert_eq!(out, U256::from(200u64));
    }

    #[test]
    fn quote_rejects_empty_pool_and_zero_amount() {
        assert_eq!(
            CpMath::quote(U256::from(1u64), 0, 2_000),
            Err(AmmError::InsufficientLiquidity)
        );
        assert_eq!(
            CpMath::quote(U256::zero(), 1_000, 2_000),
            Err(AmmError::InsufficientAmount)
        );
    }

    #[test]
    fn first_mint_is_geometric_mean_less_lockup() {
        // sqrt(1e18 * 4e18) = 2e18
        let liquidity = CpMath::liquidity_for_first_mint(wei(1), wei(4)).unwrap();
        assert_eq!(liquidity, wei(2) - U256::from(MINIMUM_LIQUIDITY));
    }

    #[test]
    fn first_mint_below_lockup_is_rejected() {
        assert_eq!(
            CpMath::liquidity_for_first_mint(U256::from(1_000u64), U256::from(1_000u64)),
            Err(AmmError::InsufficientLiquidityMinted)
        );
    }

    #[test]
    fn subsequent_mint_credits_limiting_side_only() {
        let total = wei(2);
        // Balanced deposit doubles the pool.
        let balanced =
            CpMath::liquidity_for_subsequent_mint(wei(1), wei(4), 10u128.pow(18), 4 * 10u128.pow(18), total)
                .unwrap();
        assert_eq!(balanced, wei(2));
        // Skewed deposit is credited for the smaller ratio.
        let skewed =
            CpMath::liquidity_for_subsequent_mint(wei(1), wei(8), 10u128.pow(18), 4 * 10u128.pow(18), total)
                .unwrap();
        assert_eq!(skewed, wei(2));
    }

    #[test]
    fn burn_amounts_are_floored_pro_rata() {
        let (a0, a1) =
            CpMath::amounts_for_burn(U256::from(3u64), U256::from(10u64), U256::from(100u64), U256::from(7u64))
                .unwrap();
        assert_eq!(a0, U256::from(30u64));
        assert_eq!(a1, U256::from(2u64)); // floor(3 * 7 / 10)
    }

    #[test]
    fn burn_rejects_zero_side() {
        assert_eq!(
            CpMath::amounts_for_burn(
                U256::from(1u64),
                U256::from(10u64),
                U256::from(100u64),
                U256::from(5u64)
            ),
            Err(AmmError::InsufficientLiquidityBurned)
        );
    }

    #[test]
    fn exact_output_matches_the_closed_form() {
        // 100 in against 1000:2000 reserves at 0.3%:
        // 99700 * 2000 / (1000 * 1000 + 99700) = 181 (floor)
        let out = CpMath::get_amount_out(
            U256::from(100u64),
            1_000,
            2_000,
            DEFAULT_SWAP_FEE_NUM,
            DEFAULT_SWAP_FEE_DEN,
        )
        .unwrap();
        assert_eq!(out, U256::from(181u64));
    }

    #[test]
    fn amount_in_rounds_against_caller() {
        let amount_in = CpMath::get_amount_in(
            U256::from(181u64),
            1_000,
            2_000,
            DEFAULT_SWAP_FEE_NUM,
            DEFAULT_SWAP_FEE_DEN,
        )
        .unwrap();
        assert_eq!(amount_in, U256::from(100u64));
    }

    #[test]
    fn invariant_accepts_priced_swap_and_rejects_one_extra_unit() {
        let (r0, r1) = (1_000u128, 2_000u128);
        let amount_in = U256::from(100u64);
        let out = CpMath::get_amount_out(amount_in, r0, r1, 3, 1_000).unwrap();

        let balance0 = U256::from(r0) + amount_in;
        let balance1 = U256::from(r1) - out;
        CpMath::validate_swap_invariant(balance0, balance1, r0, r1, amount_in, U256::zero(), 3, 1_000)
            .unwrap();

        let greedy = balance1 - U256::one();
        assert_eq!(
            CpMath::validate_swap_invariant(balance0, greedy, r0, r1, amount_in, U256::zero(), 3, 1_000),
            Err(AmmError::InvalidK)
        );
    }

    #[test]
    fn protocol_fee_skims_one_sixth_of_growth() {
        // Pool doubled linearly: sqrt(k) went from 1e18 to 2e18.
        let k_last = wei(1) * wei(1);
        let liquidity = CpMath::protocol_fee_liquidity(
            k_last,
            2 * 10u128.pow(18),
            2 * 10u128.pow(18),
            wei(1),
        )
        .unwrap();
        // total * (2e18 - 1e18) / (5 * 2e18 + 1e18) = 1e18 / 11
        assert_eq!(liquidity, wei(1) * wei(1) / (U256::from(11u64) * wei(1)));
    }

    #[test]
    fn protocol_fee_disabled_or_flat_is_none() {
        assert_eq!(
            CpMath::protocol_fee_liquidity(U256::zero(), 1_000, 1_000, wei(1)),
            None
        );
        let k_last = U256::from(1_000u64) * U256::from(1_000u64);
        assert_eq!(CpMath::protocol_fee_liquidity(k_last, 1_000, 1_000, wei(1)), None);
    }

    #[test]
    fn isqrt_floors() {
        assert_eq!(CpMath::isqrt(U256::zero()), U256::zero());
        assert_eq!(CpMath::isqrt(U256::one()), U256::one());
        assert_eq!(CpMath::isqrt(U256::from(3u64)), U256::one());
        assert_eq!(CpMath::isqrt(U256::from(4u64)), U256::from(2u64));
        assert_eq!(CpMath::isqrt(wei(4) * wei(1)), wei(2));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The forward pricing formula must never produce an output the
            // invariant check would reject.
            #[test]
            fn priced_output_always_satisfies_the_invariant(
                amount_in in 1u64..,
                reserve_in in 1_000u64..,
                reserve_out in 1_000u64..,
            ) {
                let out = CpMath::get_amount_out(
                    U256::from(amount_in),
                    reserve_in as u128,
                    reserve_out as u128,
                    3,
                    1_000,
                )
                .unwrap();
                prop_assert!(out < U256::from(reserve_out));

                let balance_in = U256::from(reserve_in) + U256::from(amount_in);
                let balance_out = U256::from(reserve_out) - out;
                CpMath::validate_swap_invariant(
                    balance_in,
                    balance_out,
                    reserve_in as u128,
                    reserve_out as u128,
                    U256::from(amount_in),
                    U256::zero(),
                    3,
                    1_000,
                )
                .unwrap();
            }

            // Round-tripping through the inverse formula always buys at
            // least the requested output.
            #[test]
            fn amount_in_is_always_sufficient(
                amount_out in 1u64..500,
                reserve_in in 10_000u64..,
                reserve_out in 10_000u64..,
            ) {
                let needed = CpMath::get_amount_in(
                    U256::from(amount_out),
                    reserve_in as u128,
                    reserve_out as u128,
                    3,
                    1_000,
                )
                .unwrap();
                let bought = CpMath::get_amount_out(
                    needed,
                    reserve_in as u128,
                    reserve_out as u128,
                    3,
                    1_000,
                )
                .unwrap();
                prop_assert!(bought >= U256::from(amount_out));
            }
        }
    }
}
