//! Engine error taxonomy.
//!
//! Every failure is synchronous, terminal for its call, and leaves all
//! touched state exactly as it was. Authorization failures carry both the
//! offending caller and the expected authority for diagnostics.

use thiserror::Error;
use types::{Address, AssetId, PairAddress};
use xyk_amm::AmmError;

use crate::token::TokenError;

/// Failures surfaced by the pair engine, registry, share ledger and store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("identical assets supplied for pool creation")]
    IdenticalAssets,

    #[error("zero address is not a valid asset identifier")]
    ZeroAddress,

    #[error("pool already exists: {pair:?}")]
    PairExists { pair: PairAddress },

    #[error("no pool at address {pair:?}")]
    PairNotFound { pair: PairAddress },

    #[error("no token ledger registered for asset {asset:?}")]
    TokenNotRegistered { asset: AssetId },

    #[error("forbidden: caller {caller:?} is not admin {admin:?}")]
    Forbidden { caller: Address, admin: Address },

    #[error("deadline has passed")]
    Expired,

    #[error("invalid recipient {to:?}: pooled asset addresses cannot receive swap output")]
    InvalidTo { to: Address },

    #[error("reserve balance exceeds the 112-bit bound")]
    Overflow,

    #[error("invalid signature: recovered signer does not match owner")]
    InvalidSignature,

    #[error("insufficient share balance for {owner:?}")]
    InsufficientShares { owner: Address },

    #[error("insufficient share allowance from {owner:?} to {spender:?}")]
    InsufficientAllowance { owner: Address, spender: Address },

    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("snapshot decode failed: {reason}")]
    Snapshot { reason: String },

    #[error(transparent)]
    Math(#[from] AmmError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
