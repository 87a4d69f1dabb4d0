//! Engine configuration.
//!
//! Everything here is host-deployment detail, not protocol definition:
//! protocol constants that affect derived addresses or digests live in
//! `types::constants`. Loadable from TOML with full defaults so embedded
//! use needs no file at all.

use ethers_core::utils::keccak256;
use serde::{Deserialize, Serialize};
use types::{Address, DEFAULT_SWAP_FEE_DEN, DEFAULT_SWAP_FEE_NUM};

use crate::error::EngineError;

/// Deployment parameters of one exchange instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chain identifier baked into every permit domain separator.
    pub chain_id: u64,
    /// Registry identity hashed into every derived pool address.
    pub registry: Address,
    /// Swap fee numerator retained by the pool.
    pub swap_fee_num: u32,
    /// Swap fee denominator.
    pub swap_fee_den: u32,
    /// Name of the liquidity share token, part of the permit domain.
    pub share_token_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            registry: Address::from_slice(&keccak256(b"xyk/registry/v1")[12..]),
            swap_fee_num: DEFAULT_SWAP_FEE_NUM,
            swap_fee_den: DEFAULT_SWAP_FEE_DEN,
            share_token_name: "XYK Liquidity".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document; absent keys fall back to defaults.
    pub fn from_toml(document: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(document).map_err(|parse_err| {
            EngineError::InvalidConfig {
                reason: parse_err.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run under.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.swap_fee_den == 0 || self.swap_fee_num >= self.swap_fee_den {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "swap fee {}/{} must be a proper fraction",
                    self.swap_fee_num, self.swap_fee_den
                ),
            });
        }
        if self.registry.is_zero() {
            return Err(EngineError::InvalidConfig {
                reason: "registry identity cannot be the zero address".to_string(),
            });
        }
        if self.share_token_name.is_empty() {
            return Err(EngineError::InvalidConfig {
                reason: "share token name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
