//! # XYK Types - Shared Identifiers and Observable Events
//!
//! ## Purpose
//!
//! Foundational type crate for the XYK constant-product exchange engine.
//! Provides the 20-byte asset/pool address aliases, the 256-bit integer
//! primitives every reserve calculation runs on, the protocol constants
//! (minimum liquidity lockup, reserve bit-width bound, default swap fee),
//! and the event enum that every state change in the engine is reported
//! through.
//!
//! ## Integration Points
//!
//! - **Math layer** (`xyk-amm`): consumes `U256` and the fee/lockup constants
//! - **Engine** (`xyk-engine`): addresses every pair, token and caller with
//!   these aliases and broadcasts `EngineEvent` values to subscribers
//! - **Router** (`xyk-router`): canonical asset ordering via [`sort_assets`]
//! - **Indexers**: consume `EngineEvent` streams off a channel; the variants
//!   mirror the deltas an external indexer needs to rebuild pool state
//!
//! Addresses are Ethereum-shaped (`H160`) so that pool address derivation
//! and permit digests are reproducible bit-for-bit by any external party
//! holding only public identifiers.

pub mod constants;
pub mod events;
pub mod identifiers;

pub use constants::{
    DEFAULT_SWAP_FEE_DEN, DEFAULT_SWAP_FEE_NUM, LOCKED_LIQUIDITY_ADDRESS, MAX_RESERVE,
    MINIMUM_LIQUIDITY, SHARE_TOKEN_VERSION,
};
pub use events::EngineEvent;
pub use identifiers::{short_hex, sort_assets, Address, AssetId, PairAddress};

// 256-bit arithmetic and hash primitives used across every crate.
pub use ethers_core::types::{H256, U256};
