//! Token collaborator interface.
//!
//! The engine consumes pooled assets exclusively through [`TokenLedger`]
//! and trusts only *observed balances* — never a caller-supplied amount —
//! when computing inbound transfers. That keeps the invariant math correct
//! for assets with non-standard transfer behavior (fee-on-transfer,
//! rebasing) as long as `balance_of` is accurate.

use dashmap::DashMap;
use ethers_core::types::U256;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;
use types::Address;

/// Failures raised by a token ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance: {owner:?} holds less than the transfer amount")]
    InsufficientBalance { owner: Address },
}

/// Narrow view of an external fungible-token ledger.
pub trait TokenLedger: Send + Sync {
    /// Balance currently held by `owner`.
    fn balance_of(&self, owner: Address) -> U256;

    /// Total outstanding supply.
    fn total_supply(&self) -> U256;

    /// Moves `value` from `from` to `to`; the engine is a trusted caller.
    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), TokenError>;
}

/// In-memory reference ledger, used by tests and the wrapped-native
/// collaborator.
#[derive(Debug, Default)]
pub struct MemoryToken {
    symbol: String,
    balances: DashMap<Address, U256>,
    total_supply: RwLock<U256>,
}

impl MemoryToken {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            balances: DashMap::new(),
            total_supply: RwLock::new(U256::zero()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Credits `to` with newly issued units.
    pub fn mint(&self, to: Address, value: U256) {
        *self.balances.entry(to).or_insert_with(U256::zero) += value;
        *self.total_supply.write() += value;
    }

    /// Destroys `value` units held by `from`.
    pub fn burn(&self, from: Address, value: U256) -> Result<(), TokenError> {
        let mut balance = self
            .balances
            .get_mut(&from)
            .ok_or(TokenError::InsufficientBalance { owner: from })?;
        if *balance < value {
            return Err(TokenError::InsufficientBalance { owner: from });
        }
        *balance -= value;
        drop(balance);
        *self.total_supply.write() -= value;
        Ok(())
    }
}

impl TokenLedger for MemoryToken {
    fn balance_of(&self, owner: Address) -> U256 {
        self.balances
            .get(&owner)
            .map(|balance| *balance)
            .unwrap_or_else(U256::zero)
    }

    fn total_supply(&self) -> U256 {
        *self.total_supply.read()
    }

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), TokenError> {
        {
            let mut from_balance = self
                .balances
                .get_mut(&from)
                .ok_or(TokenError::InsufficientBalance { owner: from })?;
            if *from_balance < value {
                return Err(TokenError::InsufficientBalance { owner: from });
            }
            *from_balance -= value;
        }
        *self.balances.entry(to).or_insert_with(U256::zero) += value;
        debug!(token = %self.symbol, ?from, ?to, %value, "token transfer");
        Ok(())
    }
}

/// Wrapped-native-currency collaborator: native value enters the ledger by
/// `deposit` and leaves it by `withdraw`; in between it is an ordinary
/// fungible token.
#[derive(Debug, Default)]
pub struct WrappedNative {
    token: MemoryToken,
}

impl WrappedNative {
    pub fn new() -> Self {
        Self {
            token: MemoryToken::new("WNATIVE"),
        }
    }

    /// Credits `to` with wrapped units equal to the native value sent.
    pub fn deposit(&self, to: Address, value: U256) {
        self.token.mint(to, value);
    }

    /// Burns wrapped units, releasing the native value back to `owner`.
    pub fn withdraw(&self, owner: Address, value: U256) -> Result<(), TokenError> {
        self.token.burn(owner, value)
    }
}

impl TokenLedger for WrappedNative {
    fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(owner)
    }

    fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), TokenError> {
        self.token.transfer(from, to, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn transfer_moves_balance() {
        let token = MemoryToken::new("TKNA");
        token.mint(addr(1), U256::from(100u64));
        token.transfer(addr(1), addr(2), U256::from(40u64)).unwrap();
        assert_eq!(token.balance_of(addr(1)), U256::from(60u64));
        assert_eq!(token.balance_of(addr(2)), U256::from(40u64));
        assert_eq!(token.total_supply(), U256::from(100u64));
    }

    #[test]
    fn overdraft_is_rejected_without_state_change() {
        let token = MemoryToken::new("TKNA");
        token.mint(addr(1), U256::from(10u64));
        let result = token.transfer(addr(1), addr(2), U256::from(11u64));
        assert_eq!(
            result,
            Err(TokenError::InsufficientBalance { owner: addr(1) })
        );
        assert_eq!(token.balance_of(addr(1)), U256::from(10u64));
        assert_eq!(token.balance_of(addr(2)), U256::zero());
    }

    #[test]
    fn wrapped_native_round_trip() {
        let wrapped = WrappedNative::new();
        wrapped.deposit(addr(5), U256::from(1_000u64));
        assert_eq!(wrapped.total_supply(), U256::from(1_000u64));
        wrapped.withdraw(addr(5), U256::from(400u64)).unwrap();
        assert_eq!(wrapped.balance_of(addr(5)), U256::from(600u64));
        assert_eq!(wrapped.total_supply(), U256::from(600u64));
    }
}
