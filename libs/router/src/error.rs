//! Orchestrator error taxonomy: deadline and slippage guards, plus
//! pass-through of engine failures.

use ethers_core::types::U256;
use thiserror::Error;
use xyk_amm::AmmError;
use xyk_engine::{EngineError, TokenError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("deadline has passed")]
    Expired,

    #[error("insufficient A-side amount: {actual} below minimum {minimum}")]
    InsufficientAAmount { actual: U256, minimum: U256 },

    #[error("insufficient B-side amount: {actual} below minimum {minimum}")]
    InsufficientBAmount { actual: U256, minimum: U256 },

    #[error("insufficient output amount: {actual} below minimum {minimum}")]
    InsufficientOutputAmount { actual: U256, minimum: U256 },

    #[error("excessive input amount: {actual} above maximum {maximum}")]
    ExcessiveInputAmount { actual: U256, maximum: U256 },

    #[error("no pool exists for the asset pair")]
    PairMissing,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Math(#[from] AmmError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
