//! Shared harness for engine integration tests: one exchange over a
//! manual clock with two in-memory tokens and a funded depositor.

#![allow(dead_code)]

use std::sync::Arc;

use ethers_core::types::U256;
use types::{Address, PairAddress};
use xyk_engine::{EngineConfig, Exchange, ManualClock, MemoryToken, TokenLedger};

pub const START_TIME: u64 = 1_700_000_000;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn wei(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub struct Harness {
    pub exchange: Exchange,
    pub clock: Arc<ManualClock>,
    pub asset0: Address,
    pub asset1: Address,
    pub token0: Arc<MemoryToken>,
    pub token1: Arc<MemoryToken>,
    pub alice: Address,
    pub admin: Address,
}

pub fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let clock = Arc::new(ManualClock::new(START_TIME));
    let admin = addr(0xAD317);
    let exchange = Exchange::new(EngineConfig::default(), admin, clock.clone()).unwrap();

    let asset0 = addr(0x1000_0000);
    let asset1 = addr(0x2000_0000);
    let token0 = Arc::new(MemoryToken::new("TKNA"));
    let token1 = Arc::new(MemoryToken::new("TKNB"));
    exchange.register_token(asset0, token0.clone() as Arc<dyn TokenLedger>);
    exchange.register_token(asset1, token1.clone() as Arc<dyn TokenLedger>);

    let alice = addr(0xA11CE);
    token0.mint(alice, wei(10_000));
    token1.mint(alice, wei(10_000));

    Harness {
        exchange,
        clock,
        asset0,
        asset1,
        token0,
        token1,
        alice,
        admin,
    }
}

impl Harness {
    pub fn create_pair(&self) -> PairAddress {
        self.exchange.create_pair(self.asset0, self.asset1).unwrap()
    }

    /// Transfers both amounts into the pool and mints to `alice`.
    pub fn seed_liquidity(&self, pair: PairAddress, amount0: U256, amount1: U256) -> U256 {
        self.token0.transfer(self.alice, pair, amount0).unwrap();
        self.token1.transfer(self.alice, pair, amount1).unwrap();
        self.exchange.mint(self.alice, pair, self.alice).unwrap()
    }
}
