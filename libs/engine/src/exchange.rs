//! Exchange store: the explicit handle every operation runs against.
//!
//! One `Exchange` owns the registry, every pair, the token collaborator
//! map and the clock. Per-pool mutation is serialized by the pool's write
//! lock; read-only queries are served from the latest committed state.
//! Sequences of calls across pools are not atomic as a group — each call
//! commits or fails on its own.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use dashmap::DashMap;
use ethers_core::types::{Signature, H256, U256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::{short_hex, Address, AssetId, EngineEvent, PairAddress};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::EventBroadcaster;
use crate::pair::{Pair, PairOps};
use crate::registry::Registry;
use crate::token::TokenLedger;

/// Durable state captured by [`Exchange::snapshot`].
#[derive(Serialize, Deserialize)]
struct ExchangeSnapshot {
    registry: Registry,
    pairs: Vec<Pair>,
}

/// The deterministic exchange ledger.
pub struct Exchange {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    tokens: DashMap<AssetId, Arc<dyn TokenLedger>>,
    pairs: DashMap<PairAddress, Arc<RwLock<Pair>>>,
    registry: RwLock<Registry>,
    events: EventBroadcaster,
}

impl Exchange {
    pub fn new(
        config: EngineConfig,
        fee_admin: Address,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = Registry::new(config.registry, fee_admin);
        Ok(Self {
            config,
            clock,
            tokens: DashMap::new(),
            pairs: DashMap::new(),
            registry: RwLock::new(registry),
            events: EventBroadcaster::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current time from the store's clock, in seconds.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Makes an asset's ledger available to the engine.
    pub fn register_token(&self, asset: AssetId, ledger: Arc<dyn TokenLedger>) {
        self.tokens.insert(asset, ledger);
    }

    pub fn token(&self, asset: AssetId) -> Result<Arc<dyn TokenLedger>, EngineError> {
        self.tokens
            .get(&asset)
            .map(|entry| entry.clone())
            .ok_or(EngineError::TokenNotRegistered { asset })
    }

    /// Registers an event subscriber.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ---- registry surface ----

    /// Creates the pool for a new unordered asset pair and returns its
    /// deterministically derived address.
    pub fn create_pair(
        &self,
        asset_a: AssetId,
        asset_b: AssetId,
    ) -> Result<PairAddress, EngineError> {
        self.token(asset_a)?;
        self.token(asset_b)?;

        let (asset0, asset1, address, index) = {
            let mut registry = self.registry.write();
            let created = registry.create(asset_a, asset_b)?;
            let pair = Pair::new(
                created.2,
                created.0,
                created.1,
                &self.config.share_token_name,
                self.config.chain_id,
            );
            // Inserted under the registry lock so a lookup never resolves
            // to a pool the store does not hold yet.
            self.pairs.insert(created.2, Arc::new(RwLock::new(pair)));
            created
        };
        self.events.emit(EngineEvent::PairCreated {
            asset0,
            asset1,
            pair: address,
            index,
        });
        Ok(address)
    }

    /// Resolves the pool for an unordered pair, either argument order.
    pub fn pair_for(&self, asset_a: AssetId, asset_b: AssetId) -> Option<PairAddress> {
        self.registry.read().get_pair(asset_a, asset_b)
    }

    pub fn all_pairs(&self) -> Vec<PairAddress> {
        self.registry.read().all_pairs().to_vec()
    }

    pub fn pair_count(&self) -> u64 {
        self.registry.read().pair_count()
    }

    pub fn fee_admin(&self) -> Address {
        self.registry.read().fee_admin()
    }

    pub fn fee_recipient(&self) -> Option<Address> {
        self.registry.read().fee_recipient()
    }

    pub fn set_fee_recipient(
        &self,
        caller: Address,
        recipient: Option<Address>,
    ) -> Result<(), EngineError> {
        self.registry.write().set_fee_recipient(caller, recipient)
    }

    pub fn set_fee_admin(&self, caller: Address, admin: Address) -> Result<(), EngineError> {
        self.registry.write().set_fee_admin(caller, admin)
    }

    // ---- pair operations ----

    pub fn mint(
        &self,
        caller: Address,
        pair: PairAddress,
        to: Address,
    ) -> Result<U256, EngineError> {
        self.with_pair(pair, |pool, ops| pool.mint(ops, caller, to))
    }

    pub fn burn(
        &self,
        caller: Address,
        pair: PairAddress,
        to: Address,
    ) -> Result<(U256, U256), EngineError> {
        self.with_pair(pair, |pool, ops| pool.burn(ops, caller, to))
    }

    pub fn swap(
        &self,
        caller: Address,
        pair: PairAddress,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
    ) -> Result<(), EngineError> {
        self.with_pair(pair, |pool, ops| {
            pool.swap(ops, caller, amount0_out, amount1_out, to)
        })
    }

    pub fn sync(&self, pair: PairAddress) -> Result<(), EngineError> {
        self.with_pair(pair, |pool, ops| pool.sync(ops))
    }

    pub fn skim(&self, pair: PairAddress, to: Address) -> Result<(), EngineError> {
        self.with_pair(pair, |pool, ops| pool.skim(ops, to))
    }

    // ---- committed-state queries ----

    pub fn assets_of(&self, pair: PairAddress) -> Result<(AssetId, AssetId), EngineError> {
        Ok(self.pair_arc(pair)?.read().assets())
    }

    pub fn reserves(&self, pair: PairAddress) -> Result<(u128, u128, u32), EngineError> {
        Ok(self.pair_arc(pair)?.read().reserves())
    }

    pub fn price_cumulatives(&self, pair: PairAddress) -> Result<(U256, U256), EngineError> {
        Ok(self.pair_arc(pair)?.read().price_cumulatives())
    }

    pub fn k_last(&self, pair: PairAddress) -> Result<U256, EngineError> {
        Ok(self.pair_arc(pair)?.read().k_last())
    }

    // ---- liquidity share surface ----

    pub fn share_total_supply(&self, pair: PairAddress) -> Result<U256, EngineError> {
        Ok(self.pair_arc(pair)?.read().shares().total_supply())
    }

    pub fn share_balance_of(
        &self,
        pair: PairAddress,
        owner: Address,
    ) -> Result<U256, EngineError> {
        Ok(self.pair_arc(pair)?.read().shares().balance_of(owner))
    }

    pub fn share_allowance(
        &self,
        pair: PairAddress,
        owner: Address,
        spender: Address,
    ) -> Result<U256, EngineError> {
        Ok(self.pair_arc(pair)?.read().shares().allowance(owner, spender))
    }

    pub fn share_nonce(&self, pair: PairAddress, owner: Address) -> Result<U256, EngineError> {
        Ok(self.pair_arc(pair)?.read().shares().nonce_of(owner))
    }

    /// Domain separator a permit signer commits to for this pool.
    pub fn share_domain_separator(&self, pair: PairAddress) -> Result<H256, EngineError> {
        Ok(self.pair_arc(pair)?.read().shares().domain_separator())
    }

    pub fn share_approve(
        &self,
        caller: Address,
        pair: PairAddress,
        spender: Address,
        value: U256,
    ) -> Result<(), EngineError> {
        self.pair_arc(pair)?
            .write()
            .shares_mut()
            .approve(caller, spender, value);
        Ok(())
    }

    pub fn share_transfer(
        &self,
        caller: Address,
        pair: PairAddress,
        to: Address,
        value: U256,
    ) -> Result<(), EngineError> {
        self.pair_arc(pair)?
            .write()
            .shares_mut()
            .transfer(caller, to, value)?;
        self.events.emit(EngineEvent::ShareTransfer {
            pair,
            from: caller,
            to,
            value,
        });
        Ok(())
    }

    pub fn share_transfer_from(
        &self,
        caller: Address,
        pair: PairAddress,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), EngineError> {
        self.pair_arc(pair)?
            .write()
            .shares_mut()
            .transfer_from(caller, from, to, value)?;
        self.events.emit(EngineEvent::ShareTransfer {
            pair,
            from,
            to,
            value,
        });
        Ok(())
    }

    /// Consumes a signed approval for a pool's shares.
    pub fn permit(
        &self,
        pair: PairAddress,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: u64,
        signature: &Signature,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.pair_arc(pair)?
            .write()
            .shares_mut()
            .permit(now, owner, spender, value, deadline, signature)
    }

    // ---- persistence ----

    /// Serializes the durable state: registry plus every pair's scalar
    /// fields and share ledger. Token collaborators are external and are
    /// not captured.
    pub fn snapshot(&self) -> Vec<u8> {
        let registry = self.registry.read().clone();
        let pairs: Vec<Pair> = registry
            .all_pairs()
            .iter()
            .filter_map(|address| self.pairs.get(address))
            .map(|entry| entry.value().read().clone())
            .collect();
        bincode::serialize(&ExchangeSnapshot { registry, pairs }).unwrap_or_default()
    }

    /// Replaces all durable state from a snapshot. Tokens must be
    /// registered again by the host before pools are operated on.
    pub fn restore(&self, snapshot: &[u8]) -> Result<(), EngineError> {
        let decoded: ExchangeSnapshot =
            bincode::deserialize(snapshot).map_err(|decode_err| EngineError::Snapshot {
                reason: decode_err.to_string(),
            })?;
        *self.registry.write() = decoded.registry;
        self.pairs.clear();
        for pair in decoded.pairs {
            self.pairs
                .insert(pair.address(), Arc::new(RwLock::new(pair)));
        }
        info!(pairs = self.pairs.len(), "state restored from snapshot");
        Ok(())
    }

    // ---- internals ----

    fn pair_arc(&self, pair: PairAddress) -> Result<Arc<RwLock<Pair>>, EngineError> {
        self.pairs
            .get(&pair)
            .map(|entry| entry.clone())
            .ok_or(EngineError::PairNotFound { pair })
    }

    fn with_pair<R>(
        &self,
        pair: PairAddress,
        operation: impl FnOnce(&mut Pair, &PairOps<'_>) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let pair_arc = self.pair_arc(pair)?;
        let fee_recipient = self.registry.read().fee_recipient();
        let mut pool = pair_arc.write();
        let (asset0, asset1) = pool.assets();
        let token0 = self.token(asset0)?;
        let token1 = self.token(asset1)?;
        let ops = PairOps {
            token0: token0.as_ref(),
            token1: token1.as_ref(),
            fee_recipient,
            fee_num: self.config.swap_fee_num,
            fee_den: self.config.swap_fee_den,
            now: self.clock.now(),
            events: &self.events,
        };
        operation(&mut pool, &ops)
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Exchange")
            .field("pairs", &self.pairs.len())
            .field("tokens", &self.tokens.len())
            .field("registry", &short_hex(&self.config.registry))
            .finish()
    }
}
