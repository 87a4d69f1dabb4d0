//! Pool registry: deterministic addressing and the fee-admin slot.
//!
//! Pool addresses are a pure function of `(registry identity, sorted asset
//! pair, pair template hash)`, so any external party can compute a pool's
//! address before it exists. The registry only enforces create-once per
//! unordered pair and gates the protocol-fee destination.

use std::collections::HashMap;

use ethers_core::types::H256;
use ethers_core::utils::keccak256;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::{short_hex, sort_assets, Address, AssetId, PairAddress};

use crate::error::EngineError;

/// Fixed fingerprint of the pair implementation, the third input of the
/// address derivation. Bumping the template version changes every derived
/// address, which is exactly the intent.
pub static PAIR_TEMPLATE_HASH: Lazy<H256> =
    Lazy::new(|| H256(keccak256(b"xyk/pair-template/v1")));

/// Derives a pool address from public inputs only:
/// `keccak256(0xff ‖ registry ‖ keccak256(asset0 ‖ asset1) ‖ template)[12..]`.
///
/// Order-independent: assets are always hashed in sorted order.
pub fn pair_address_for(registry: Address, asset_a: AssetId, asset_b: AssetId) -> PairAddress {
    let (asset0, asset1) = sort_assets(asset_a, asset_b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(asset0.as_bytes());
    packed[20..].copy_from_slice(asset1.as_bytes());
    let salt = keccak256(packed);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(registry.as_bytes());
    preimage.extend_from_slice(&salt);
    preimage.extend_from_slice(PAIR_TEMPLATE_HASH.as_bytes());
    Address::from_slice(&keccak256(preimage)[12..])
}

/// Durable registry state: the bidirectional pair lookup, the append-only
/// creation-ordered pool list, and the fee slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    address: Address,
    fee_admin: Address,
    fee_recipient: Option<Address>,
    lookup: HashMap<(AssetId, AssetId), PairAddress>,
    all_pairs: Vec<PairAddress>,
}

impl Registry {
    pub fn new(address: Address, fee_admin: Address) -> Self {
        Self {
            address,
            fee_admin,
            fee_recipient: None,
            lookup: HashMap::new(),
            all_pairs: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn fee_admin(&self) -> Address {
        self.fee_admin
    }

    pub fn fee_recipient(&self) -> Option<Address> {
        self.fee_recipient
    }

    /// Resolves a pool for an unordered pair; both argument orders hit.
    pub fn get_pair(&self, asset_a: AssetId, asset_b: AssetId) -> Option<PairAddress> {
        self.lookup.get(&(asset_a, asset_b)).copied()
    }

    /// Pools in creation order; the length is the authoritative count.
    pub fn all_pairs(&self) -> &[PairAddress] {
        &self.all_pairs
    }

    pub fn pair_count(&self) -> u64 {
        self.all_pairs.len() as u64
    }

    /// Registers a pool for a new unordered pair. Returns the canonical
    /// assets, the derived address, and the 1-based creation index.
    pub(crate) fn create(
        &mut self,
        asset_a: AssetId,
        asset_b: AssetId,
    ) -> Result<(AssetId, AssetId, PairAddress, u64), EngineError> {
        if asset_a == asset_b {
            return Err(EngineError::IdenticalAssets);
        }
        if asset_a.is_zero() || asset_b.is_zero() {
            return Err(EngineError::ZeroAddress);
        }
        let (asset0, asset1) = sort_assets(asset_a, asset_b);
        if let Some(existing) = self.lookup.get(&(asset0, asset1)) {
            return Err(EngineError::PairExists { pair: *existing });
        }

        let pair = pair_address_for(self.address, asset0, asset1);
        self.lookup.insert((asset0, asset1), pair);
        self.lookup.insert((asset1, asset0), pair);
        self.all_pairs.push(pair);
        let index = self.pair_count();
        info!(
            pair = %short_hex(&pair),
            asset0 = %short_hex(&asset0),
            asset1 = %short_hex(&asset1),
            index,
            "pool created"
        );
        Ok((asset0, asset1, pair, index))
    }

    pub fn set_fee_recipient(
        &mut self,
        caller: Address,
        recipient: Option<Address>,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.fee_recipient = recipient;
        Ok(())
    }

    pub fn set_fee_admin(&mut self, caller: Address, admin: Address) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        info!(old = %short_hex(&self.fee_admin), new = %short_hex(&admin), "fee admin changed");
        self.fee_admin = admin;
        Ok(())
    }

    fn require_admin(&self, caller: Address) -> Result<(), EngineError> {
        if caller != self.fee_admin {
            return Err(EngineError::Forbidden {
                caller,
                admin: self.fee_admin,
            });
        }
        Ok(())
    }
}
