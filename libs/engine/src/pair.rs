//! Pair engine: one pool's reserve bookkeeping and state transitions.
//!
//! A pair starts Uninitialized (reserves zero, no shares) and becomes
//! Active on its first successful `mint`; it is never destroyed, even when
//! fully withdrawn. Inbound amounts are always inferred from observed
//! balance deltas. Every operation validates completely before mutating
//! anything, so a failed call leaves the pool, its share ledger and the
//! token collaborators untouched.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{
    short_hex, Address, AssetId, EngineEvent, PairAddress, LOCKED_LIQUIDITY_ADDRESS, MAX_RESERVE,
    MINIMUM_LIQUIDITY,
};
use xyk_amm::{fixed_point, AmmError, CpMath};

use crate::error::EngineError;
use crate::events::EventBroadcaster;
use crate::share::ShareLedger;
use crate::token::TokenLedger;

/// Collaborators and call context the store assembles for each operation.
pub struct PairOps<'a> {
    pub token0: &'a dyn TokenLedger,
    pub token1: &'a dyn TokenLedger,
    pub fee_recipient: Option<Address>,
    pub fee_num: u32,
    pub fee_den: u32,
    pub now: u64,
    pub events: &'a EventBroadcaster,
}

/// Durable state of one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    address: PairAddress,
    asset0: AssetId,
    asset1: AssetId,
    reserve0: u128,
    reserve1: u128,
    block_timestamp_last: u32,
    price0_cumulative_last: U256,
    price1_cumulative_last: U256,
    k_last: U256,
    shares: ShareLedger,
}

impl Pair {
    pub fn new(
        address: PairAddress,
        asset0: AssetId,
        asset1: AssetId,
        share_name: &str,
        chain_id: u64,
    ) -> Self {
        debug_assert!(asset0 < asset1);
        Self {
            address,
            asset0,
            asset1,
            reserve0: 0,
            reserve1: 0,
            block_timestamp_last: 0,
            price0_cumulative_last: U256::zero(),
            price1_cumulative_last: U256::zero(),
            k_last: U256::zero(),
            shares: ShareLedger::new(share_name, chain_id, address),
        }
    }

    pub fn address(&self) -> PairAddress {
        self.address
    }

    pub fn assets(&self) -> (AssetId, AssetId) {
        (self.asset0, self.asset1)
    }

    /// Committed reserves and the timestamp of their last update.
    pub fn reserves(&self) -> (u128, u128, u32) {
        (self.reserve0, self.reserve1, self.block_timestamp_last)
    }

    /// Time-weighted cumulative price counters (UQ112.112, wrapping).
    pub fn price_cumulatives(&self) -> (U256, U256) {
        (self.price0_cumulative_last, self.price1_cumulative_last)
    }

    pub fn k_last(&self) -> U256 {
        self.k_last
    }

    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    pub(crate) fn shares_mut(&mut self) -> &mut ShareLedger {
        &mut self.shares
    }

    /// Deposits the balance delta and mints liquidity shares to `to`.
    pub fn mint(
        &mut self,
        ops: &PairOps<'_>,
        caller: Address,
        to: Address,
    ) -> Result<U256, EngineError> {
        let balance0 = ops.token0.balance_of(self.address);
        let balance1 = ops.token1.balance_of(self.address);
        let amount0 = balance0
            .checked_sub(U256::from(self.reserve0))
            .ok_or(EngineError::Overflow)?;
        let amount1 = balance1
            .checked_sub(U256::from(self.reserve1))
            .ok_or(EngineError::Overflow)?;
        self.check_reserve_bounds(balance0, balance1)?;

        let fee_liquidity = self.pending_fee_liquidity(ops);
        let total_supply = self.shares.total_supply() + fee_liquidity.unwrap_or_default();
        let first_mint = total_supply.is_zero();
        let liquidity = if first_mint {
            CpMath::liquidity_for_first_mint(amount0, amount1)?
        } else {
            CpMath::liquidity_for_subsequent_mint(
                amount0,
                amount1,
                self.reserve0,
                self.reserve1,
                total_supply,
            )?
        };

        // Commit: every rejection above happened before this point.
        self.apply_fee_mint(ops, fee_liquidity);
        if first_mint {
            self.shares
                .mint(LOCKED_LIQUIDITY_ADDRESS, U256::from(MINIMUM_LIQUIDITY));
            ops.events.emit(EngineEvent::ShareTransfer {
                pair: self.address,
                from: Address::zero(),
                to: LOCKED_LIQUIDITY_ADDRESS,
                value: U256::from(MINIMUM_LIQUIDITY),
            });
        }
        self.shares.mint(to, liquidity);
        ops.events.emit(EngineEvent::ShareTransfer {
            pair: self.address,
            from: Address::zero(),
            to,
            value: liquidity,
        });
        self.update(ops, balance0, balance1);
        self.refresh_k_last(ops.fee_recipient.is_some());
        ops.events.emit(EngineEvent::Mint {
            pair: self.address,
            sender: caller,
            amount0,
            amount1,
        });
        debug!(pair = %short_hex(&self.address), %liquidity, "liquidity minted");
        Ok(liquidity)
    }

    /// Burns the shares held by the pool itself and pays out pro rata.
    pub fn burn(
        &mut self,
        ops: &PairOps<'_>,
        caller: Address,
        to: Address,
    ) -> Result<(U256, U256), EngineError> {
        let balance0 = ops.token0.balance_of(self.address);
        let balance1 = ops.token1.balance_of(self.address);
        let liquidity = self.shares.balance_of(self.address);

        let fee_liquidity = self.pending_fee_liquidity(ops);
        let total_supply = self.shares.total_supply() + fee_liquidity.unwrap_or_default();
        let (amount0, amount1) =
            CpMath::amounts_for_burn(liquidity, total_supply, balance0, balance1)?;
        self.check_reserve_bounds(balance0 - amount0, balance1 - amount1)?;

        // Commit.
        self.apply_fee_mint(ops, fee_liquidity);
        self.shares.burn(self.address, liquidity)?;
        ops.events.emit(EngineEvent::ShareTransfer {
            pair: self.address,
            from: self.address,
            to: Address::zero(),
            value: liquidity,
        });
        ops.token0.transfer(self.address, to, amount0)?;
        ops.token1.transfer(self.address, to, amount1)?;
        let balance0 = ops.token0.balance_of(self.address);
        let balance1 = ops.token1.balance_of(self.address);
        self.update(ops, balance0, balance1);
        self.refresh_k_last(ops.fee_recipient.is_some());
        ops.events.emit(EngineEvent::Burn {
            pair: self.address,
            sender: caller,
            amount0,
            amount1,
            to,
        });
        Ok((amount0, amount1))
    }

    /// Swaps against the pool: outputs requested explicitly, inputs
    /// inferred from balances already transferred in by the caller.
    ///
    /// Tentative post-transfer balances are validated against the
    /// fee-adjusted invariant before any value moves, making the whole
    /// operation a single atomic commit.
    pub fn swap(
        &mut self,
        ops: &PairOps<'_>,
        caller: Address,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
    ) -> Result<(), EngineError> {
        if amount0_out.is_zero() && amount1_out.is_zero() {
            return Err(AmmError::InsufficientOutputAmount.into());
        }
        if amount0_out >= U256::from(self.reserve0) || amount1_out >= U256::from(self.reserve1) {
            return Err(AmmError::InsufficientLiquidity.into());
        }
        if to == self.asset0 || to == self.asset1 {
            return Err(EngineError::InvalidTo { to });
        }

        let balance0 = ops
            .token0
            .balance_of(self.address)
            .checked_sub(amount0_out)
            .ok_or(EngineError::Overflow)?;
        let balance1 = ops
            .token1
            .balance_of(self.address)
            .checked_sub(amount1_out)
            .ok_or(EngineError::Overflow)?;
        let amount0_in = balance0.saturating_sub(U256::from(self.reserve0) - amount0_out);
        let amount1_in = balance1.saturating_sub(U256::from(self.reserve1) - amount1_out);
        if amount0_in.is_zero() && amount1_in.is_zero() {
            return Err(AmmError::InsufficientInputAmount.into());
        }
        CpMath::validate_swap_invariant(
            balance0,
            balance1,
            self.reserve0,
            self.reserve1,
            amount0_in,
            amount1_in,
            ops.fee_num,
            ops.fee_den,
        )?;
        self.check_reserve_bounds(balance0, balance1)?;

        // Commit.
        if !amount0_out.is_zero() {
            ops.token0.transfer(self.address, to, amount0_out)?;
        }
        if !amount1_out.is_zero() {
            ops.token1.transfer(self.address, to, amount1_out)?;
        }
        self.update(ops, balance0, balance1);
        ops.events.emit(EngineEvent::Swap {
            pair: self.address,
            sender: caller,
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
            to,
        });
        Ok(())
    }

    /// Forces reserves to match held balances; recovers from donation-only
    /// transfers.
    pub fn sync(&mut self, ops: &PairOps<'_>) -> Result<(), EngineError> {
        let balance0 = ops.token0.balance_of(self.address);
        let balance1 = ops.token1.balance_of(self.address);
        self.check_reserve_bounds(balance0, balance1)?;
        self.update(ops, balance0, balance1);
        Ok(())
    }

    /// Pays out any held-balance excess over reserves; the inverse recovery
    /// path to [`Pair::sync`].
    pub fn skim(&self, ops: &PairOps<'_>, to: Address) -> Result<(), EngineError> {
        let excess0 = ops
            .token0
            .balance_of(self.address)
            .checked_sub(U256::from(self.reserve0))
            .ok_or(EngineError::Overflow)?;
        let excess1 = ops
            .token1
            .balance_of(self.address)
            .checked_sub(U256::from(self.reserve1))
            .ok_or(EngineError::Overflow)?;
        if !excess0.is_zero() {
            ops.token0.transfer(self.address, to, excess0)?;
        }
        if !excess1.is_zero() {
            ops.token1.transfer(self.address, to, excess1)?;
        }
        Ok(())
    }

    /// Protocol-fee liquidity owed since the last liquidity event, if the
    /// fee is switched on and the pool has grown.
    fn pending_fee_liquidity(&self, ops: &PairOps<'_>) -> Option<U256> {
        ops.fee_recipient?;
        CpMath::protocol_fee_liquidity(
            self.k_last,
            self.reserve0,
            self.reserve1,
            self.shares.total_supply(),
        )
    }

    fn apply_fee_mint(&mut self, ops: &PairOps<'_>, fee_liquidity: Option<U256>) {
        if let (Some(liquidity), Some(recipient)) = (fee_liquidity, ops.fee_recipient) {
            self.shares.mint(recipient, liquidity);
            ops.events.emit(EngineEvent::ShareTransfer {
                pair: self.address,
                from: Address::zero(),
                to: recipient,
                value: liquidity,
            });
            debug!(pair = %short_hex(&self.address), %liquidity, "protocol fee skimmed");
        }
    }

    fn check_reserve_bounds(&self, balance0: U256, balance1: U256) -> Result<(), EngineError> {
        if balance0 > U256::from(MAX_RESERVE) || balance1 > U256::from(MAX_RESERVE) {
            return Err(EngineError::Overflow);
        }
        Ok(())
    }

    /// Commits reserves and ticks the cumulative price counters. Balances
    /// are 112-bit bounded by the caller's `check_reserve_bounds`.
    fn update(&mut self, ops: &PairOps<'_>, balance0: U256, balance1: U256) {
        let now = (ops.now % (1u64 << 32)) as u32;
        let elapsed = now.wrapping_sub(self.block_timestamp_last);
        if elapsed > 0 && self.reserve0 != 0 && self.reserve1 != 0 {
            self.price0_cumulative_last = fixed_point::accumulate(
                self.price0_cumulative_last,
                self.reserve1,
                self.reserve0,
                elapsed,
            );
            self.price1_cumulative_last = fixed_point::accumulate(
                self.price1_cumulative_last,
                self.reserve0,
                self.reserve1,
                elapsed,
            );
        }
        self.reserve0 = balance0.as_u128();
        self.reserve1 = balance1.as_u128();
        self.block_timestamp_last = now;
        ops.events.emit(EngineEvent::Sync {
            pair: self.address,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
        });
    }

    fn refresh_k_last(&mut self, fee_on: bool) {
        self.k_last = if fee_on {
            U256::from(self.reserve0) * U256::from(self.reserve1)
        } else {
            U256::zero()
        };
    }
}
