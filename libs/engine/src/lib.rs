//! # XYK Engine - Deterministic Constant-Product Exchange Ledger
//!
//! ## Purpose
//!
//! The invariant engine of the XYK exchange protocol: per-pool reserve
//! bookkeeping, liquidity-share minting and burning, swap-fee accounting
//! with the lazy protocol-fee skim, deterministic pool addressing through
//! the registry, and signature-based approval of share spending (permit).
//! Every state transition is bit-exact reproducible by an off-chain
//! verifier holding the same event stream.
//!
//! ## Integration Points
//!
//! - **Input Sources**: router-orchestrated token transfers and pair
//!   calls, direct engine calls from embedding hosts
//! - **Output Destinations**: [`types::EngineEvent`] streams for indexers,
//!   bincode snapshots for persistence
//! - **Collaborators**: external fungible-token ledgers behind
//!   [`token::TokenLedger`]; the engine trusts observed balances, never
//!   caller-declared amounts
//! - **Determinism**: time enters only through [`clock::Clock`]; protocol
//!   constants live in `types`, deployment parameters in
//!   [`config::EngineConfig`]
//!
//! ## Architecture Role
//!
//! ```text
//! Router transfers ──► [Exchange store] ──► [Pair engine] ──► reserve commits
//!        ↓                   ↓                   ↓                 ↓
//!  Token ledgers        Registry lookup     Invariant check    EngineEvent
//!  (balance deltas)     (create-once)       (fee-adjusted k)   broadcast
//!                       Fee admin slot      Share ledger       Snapshots
//!                                           + permit nonces
//! ```
//!
//! ## Concurrency Model
//!
//! The store serializes mutation per pool with a write lock; reads come
//! from committed state. An operation either commits in full or fails
//! with no effect — validation always completes before the first
//! mutation. There are no background tasks and no retries.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod exchange;
pub mod pair;
pub mod permit;
pub mod registry;
pub mod share;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::EngineError;
pub use exchange::Exchange;
pub use pair::Pair;
pub use registry::{pair_address_for, Registry, PAIR_TEMPLATE_HASH};
pub use share::ShareLedger;
pub use token::{MemoryToken, TokenError, TokenLedger, WrappedNative};
