//! # XYK AMM Library - Exact Constant-Product Mathematics
//!
//! ## Purpose
//!
//! Pure, stateless mathematics for the constant-product invariant engine:
//! deposit quoting, liquidity share mint/burn ratios, fee-adjusted swap
//! invariant validation, the lazy protocol-fee skim, and the UQ112.112
//! fixed-point encoding behind the cumulative price counters. Every
//! function is integer-exact over `U256` — floor division where the
//! protocol floors, round-up where the protocol rounds up — so results are
//! reproducible bit-for-bit by any off-chain verifier.
//!
//! ## Integration Points
//!
//! - **Input Sources**: reserve and balance snapshots from the pair engine,
//!   caller-supplied amounts from the router
//! - **Output Destinations**: pair engine state transitions, router
//!   quoting and slippage checks
//! - **Precision**: no floating point, no decimal scaling; reserves are
//!   112-bit bounded (`u128` parameters), amounts and share supplies are
//!   `U256`
//!
//! ## Architecture Role
//!
//! ```text
//! Router amounts ──► [quote / get_amount_out / get_amount_in] ──► slippage guards
//! Pair balances  ──► [liquidity_for_*_mint / amounts_for_burn] ──► share ledger
//! Pair reserves  ──► [validate_swap_invariant]                 ──► commit / InvalidK
//! k_last         ──► [protocol_fee_liquidity]                  ──► fee-recipient mint
//! ```
//!
//! The engine owns all state; nothing in this crate mutates anything.

pub mod fixed_point;
pub mod math;

pub use math::{AmmError, CpMath};

/// 256-bit integer every amount-level calculation runs at.
pub use ethers_core::types::U256;
