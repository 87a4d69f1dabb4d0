//! # XYK Router - Liquidity Orchestration
//!
//! ## Purpose
//!
//! Convenience layer over the exchange store: computes deposit ratios,
//! enforces caller-specified slippage bounds and deadlines, sequences
//! token transfers ahead of the unconditional pair-engine calls, and
//! handles wrapping/unwrapping of the native currency. The engine itself
//! knows nothing of deadlines or minimums — every guard here is checked
//! before the first transfer moves.
//!
//! ## Integration Points
//!
//! - **Downstream**: `xyk-engine` pair operations and registry lookups,
//!   token collaborators for caller-to-pool transfers
//! - **Credentials**: consumes share permits (the router is the spender)
//!   so removal needs no prior approval call
//! - **Scope**: single-pair swaps only; multi-hop path routing is out of
//!   scope
//!
//! Calls that touch more than one pool commit pool-by-pool; the router
//! provides no cross-pool atomicity beyond what the store gives a single
//! operation.

pub mod error;
pub mod orchestrator;

pub use error::RouterError;
pub use orchestrator::Router;
