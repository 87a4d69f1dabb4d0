//! Liquidity-share ledger.
//!
//! Each pair owns one of these: a fungible claim on the pool's reserves
//! with balances, allowances and the per-owner permit nonces. Minting and
//! burning are engine-internal; everything else is caller-facing through
//! the exchange store.

use std::collections::HashMap;

use ethers_core::types::{Signature, H256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{Address, SHARE_TOKEN_VERSION};

use crate::error::EngineError;
use crate::permit::{domain_separator, permit_digest, recover_signer};

/// Fungible share ledger for a single pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLedger {
    name: String,
    domain_separator: H256,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
}

impl ShareLedger {
    pub fn new(name: impl Into<String>, chain_id: u64, pair: Address) -> Self {
        let name = name.into();
        let domain_separator = domain_separator(&name, SHARE_TOKEN_VERSION, chain_id, pair);
        Self {
            name,
            domain_separator,
            total_supply: U256::zero(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain_separator(&self) -> H256 {
        self.domain_separator
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn nonce_of(&self, owner: Address) -> U256 {
        self.nonces.get(&owner).copied().unwrap_or_default()
    }

    pub(crate) fn mint(&mut self, to: Address, value: U256) {
        *self.balances.entry(to).or_default() += value;
        self.total_supply += value;
    }

    pub(crate) fn burn(&mut self, from: Address, value: U256) -> Result<(), EngineError> {
        let balance = self.balances.entry(from).or_default();
        if *balance < value {
            return Err(EngineError::InsufficientShares { owner: from });
        }
        *balance -= value;
        self.total_supply -= value;
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, value: U256) {
        self.allowances.insert((owner, spender), value);
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), EngineError> {
        let from_balance = self.balances.entry(from).or_default();
        if *from_balance < value {
            return Err(EngineError::InsufficientShares { owner: from });
        }
        *from_balance -= value;
        *self.balances.entry(to).or_default() += value;
        Ok(())
    }

    /// Spender-mediated transfer. An unlimited (`U256::MAX`) allowance is
    /// never decremented.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), EngineError> {
        let allowance = self.allowance(from, spender);
        if allowance != U256::MAX {
            if allowance < value {
                return Err(EngineError::InsufficientAllowance {
                    owner: from,
                    spender,
                });
            }
            self.allowances.insert((from, spender), allowance - value);
        }
        self.transfer(from, to, value)
    }

    /// Verifies an off-chain-signed approval and consumes the owner's
    /// nonce. The only path by which a signed message stands in for a
    /// direct approval call.
    pub fn permit(
        &mut self,
        now: u64,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: u64,
        signature: &Signature,
    ) -> Result<(), EngineError> {
        if now > deadline {
            return Err(EngineError::Expired);
        }
        let nonce = self.nonce_of(owner);
        let digest = permit_digest(self.domain_separator, owner, spender, value, nonce, deadline);
        let signer = recover_signer(digest, signature)?;
        if signer.is_zero() || signer != owner {
            return Err(EngineError::InvalidSignature);
        }
        self.nonces.insert(owner, nonce + U256::one());
        self.approve(owner, spender, value);
        debug!(?owner, ?spender, %value, "permit consumed");
        Ok(())
    }
}
