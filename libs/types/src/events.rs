//! Observable state deltas emitted by the engine.
//!
//! Each variant carries everything an external indexer needs to mirror the
//! change without querying the engine. Events are emitted after the
//! operation they describe has committed; a failed operation emits nothing.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use crate::identifiers::{Address, AssetId, PairAddress};

/// State change notifications broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A pool was created for a new unordered asset pair.
    PairCreated {
        asset0: AssetId,
        asset1: AssetId,
        pair: PairAddress,
        /// 1-based pool count after this creation (creation order index).
        index: u64,
    },
    /// Reserves were committed to match held balances.
    Sync {
        pair: PairAddress,
        reserve0: u128,
        reserve1: u128,
    },
    /// Liquidity was deposited and shares minted.
    Mint {
        pair: PairAddress,
        sender: Address,
        amount0: U256,
        amount1: U256,
    },
    /// Liquidity shares were burned and reserves withdrawn.
    Burn {
        pair: PairAddress,
        sender: Address,
        amount0: U256,
        amount1: U256,
        to: Address,
    },
    /// A swap committed against the pool.
    Swap {
        pair: PairAddress,
        sender: Address,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
    },
    /// Liquidity shares moved between holders (zero address = mint/burn).
    ShareTransfer {
        pair: PairAddress,
        from: Address,
        to: Address,
        value: U256,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_json() {
        let event = EngineEvent::Swap {
            pair: Address::from_low_u64_be(1),
            sender: Address::from_low_u64_be(2),
            amount0_in: U256::from(100u64),
            amount1_in: U256::zero(),
            amount0_out: U256::zero(),
            amount1_out: U256::from(181u64),
            to: Address::from_low_u64_be(3),
        };
        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: EngineEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, event);
    }
}

