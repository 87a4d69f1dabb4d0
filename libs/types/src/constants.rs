//! Protocol constants.
//!
//! These values are part of the wire-level protocol definition: changing any
//! of them changes every derived pool address, minted liquidity amount and
//! permit digest, so they live here rather than in configuration.

use ethers_core::types::H160;

use crate::identifiers::Address;

/// Liquidity shares permanently locked on the first mint into a pool.
///
/// Locked shares are minted to [`LOCKED_LIQUIDITY_ADDRESS`] and never
/// returned to any depositor. This forecloses the first-depositor attack
/// where an empty pool's creator mints dust-cost shares that later rounding
/// makes disproportionately valuable.
pub const MINIMUM_LIQUIDITY: u64 = 1_000;

/// The unspendable sentinel the minimum-liquidity lockup is minted to.
///
/// No key exists for address `0x…01`; shares sent there are gone for good.
pub const LOCKED_LIQUIDITY_ADDRESS: Address =
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

/// Reserves are bounded to 112 bits; a held balance above this cannot be
/// committed by `sync`/`mint`/`swap`.
pub const MAX_RESERVE: u128 = (1u128 << 112) - 1;

/// Default swap fee numerator (fee retained in the pool): 3 / 1000 = 0.3%.
pub const DEFAULT_SWAP_FEE_NUM: u32 = 3;

/// Default swap fee denominator.
pub const DEFAULT_SWAP_FEE_DEN: u32 = 1_000;

/// Version string baked into the permit domain separator.
pub const SHARE_TOKEN_VERSION: &str = "1";
