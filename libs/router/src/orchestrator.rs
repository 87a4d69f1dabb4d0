//! The orchestrator: ratio computation, guard checks and call sequencing.

use std::sync::Arc;

use ethers_core::types::{Signature, U256};
use tracing::debug;
use types::{sort_assets, Address, AssetId, PairAddress};
use xyk_amm::CpMath;
use xyk_engine::{Exchange, TokenError, WrappedNative};

use crate::error::RouterError;

/// Liquidity orchestrator bound to one exchange store.
///
/// The router acts under its own address: it is the `sender` the engine
/// sees and the spender a permit credential names.
pub struct Router {
    exchange: Arc<Exchange>,
    address: Address,
    native_asset: AssetId,
    wrapped_native: Arc<WrappedNative>,
}

impl Router {
    /// `native_asset` must be registered on the exchange and backed by
    /// `wrapped_native`.
    pub fn new(
        exchange: Arc<Exchange>,
        address: Address,
        native_asset: AssetId,
        wrapped_native: Arc<WrappedNative>,
    ) -> Self {
        Self {
            exchange,
            address,
            native_asset,
            wrapped_native,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn native_asset(&self) -> AssetId {
        self.native_asset
    }

    // ---- liquidity provision ----

    /// Deposits both assets at the pool's current ratio and mints shares
    /// to `to`. Creates the pool when absent. Returns the amounts actually
    /// deposited and the liquidity minted.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        caller: Address,
        asset_a: AssetId,
        asset_b: AssetId,
        amount_a_desired: U256,
        amount_b_desired: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        to: Address,
        deadline: u64,
    ) -> Result<(U256, U256, U256), RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = match self.exchange.pair_for(asset_a, asset_b) {
            Some(existing) => existing,
            None => self.exchange.create_pair(asset_a, asset_b)?,
        };
        let (amount_a, amount_b) = self.liquidity_amounts(
            pair,
            asset_a,
            amount_a_desired,
            amount_b_desired,
            amount_a_min,
            amount_b_min,
        )?;
        self.ensure_funded(asset_a, caller, amount_a)?;
        self.ensure_funded(asset_b, caller, amount_b)?;

        self.exchange
            .token(asset_a)?
            .transfer(caller, pair, amount_a)?;
        self.exchange
            .token(asset_b)?
            .transfer(caller, pair, amount_b)?;
        let liquidity = self.exchange.mint(self.address, pair, to)?;
        debug!(%amount_a, %amount_b, %liquidity, "liquidity added");
        Ok((amount_a, amount_b, liquidity))
    }

    /// As [`Router::add_liquidity`] with the B side paid in native
    /// currency. Exactly the consumed amount is wrapped into the pool;
    /// the remainder of `native_value` never leaves the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity_native(
        &self,
        caller: Address,
        asset: AssetId,
        amount_desired: U256,
        amount_min: U256,
        native_min: U256,
        to: Address,
        deadline: u64,
        native_value: U256,
    ) -> Result<(U256, U256, U256), RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = match self.exchange.pair_for(asset, self.native_asset) {
            Some(existing) => existing,
            None => self.exchange.create_pair(asset, self.native_asset)?,
        };
        let (amount_token, amount_native) = self.liquidity_amounts(
            pair,
            asset,
            amount_desired,
            native_value,
            amount_min,
            native_min,
        )?;
        self.ensure_funded(asset, caller, amount_token)?;

        self.exchange
            .token(asset)?
            .transfer(caller, pair, amount_token)?;
        self.wrapped_native.deposit(pair, amount_native);
        let liquidity = self.exchange.mint(self.address, pair, to)?;
        Ok((amount_token, amount_native, liquidity))
    }

    // ---- liquidity withdrawal ----

    /// Moves `liquidity` shares into the pool (consuming the router's
    /// allowance from `caller`), burns them to `to`, and enforces the
    /// per-side minimums on what came back.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &self,
        caller: Address,
        asset_a: AssetId,
        asset_b: AssetId,
        liquidity: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        to: Address,
        deadline: u64,
    ) -> Result<(U256, U256), RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = self
            .exchange
            .pair_for(asset_a, asset_b)
            .ok_or(RouterError::PairMissing)?;

        // Predict the burn so a violated minimum aborts before any state
        // moves; the post-burn check below only fires if another caller
        // shifted the pool between prediction and commit.
        let predicted = self.predict_burn(pair, asset_a, liquidity)?;
        self.check_minimums(predicted, amount_a_min, amount_b_min)?;

        self.exchange
            .share_transfer_from(self.address, pair, caller, pair, liquidity)?;
        let (amount0, amount1) = self.exchange.burn(self.address, pair, to)?;

        let (asset0, _) = sort_assets(asset_a, asset_b);
        let (amount_a, amount_b) = if asset_a == asset0 {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };
        self.check_minimums((amount_a, amount_b), amount_a_min, amount_b_min)?;
        Ok((amount_a, amount_b))
    }

    /// Burns a position against the native-currency pool, paying the asset
    /// side to `to` and unwrapping the native side back out of the ledger.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity_native(
        &self,
        caller: Address,
        asset: AssetId,
        liquidity: U256,
        amount_min: U256,
        native_min: U256,
        to: Address,
        deadline: u64,
    ) -> Result<(U256, U256), RouterError> {
        let (amount_token, amount_native) = self.remove_liquidity(
            caller,
            asset,
            self.native_asset,
            liquidity,
            amount_min,
            native_min,
            self.address,
            deadline,
        )?;
        self.exchange
            .token(asset)?
            .transfer(self.address, to, amount_token)?;
        self.wrapped_native.withdraw(self.address, amount_native)?;
        Ok((amount_token, amount_native))
    }

    /// [`Router::remove_liquidity`] with the share allowance granted by a
    /// permit credential instead of a prior approval call.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity_with_permit(
        &self,
        caller: Address,
        asset_a: AssetId,
        asset_b: AssetId,
        liquidity: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        to: Address,
        deadline: u64,
        approve_max: bool,
        signature: &Signature,
    ) -> Result<(U256, U256), RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = self
            .exchange
            .pair_for(asset_a, asset_b)
            .ok_or(RouterError::PairMissing)?;
        let value = if approve_max { U256::MAX } else { liquidity };
        self.exchange
            .permit(pair, caller, self.address, value, deadline, signature)?;
        self.remove_liquidity(
            caller,
            asset_a,
            asset_b,
            liquidity,
            amount_a_min,
            amount_b_min,
            to,
            deadline,
        )
    }

    // ---- single-pair swaps ----

    /// Swaps an exact input for at least `amount_out_min` of the other
    /// asset. Returns the output amount.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_tokens_for_tokens(
        &self,
        caller: Address,
        amount_in: U256,
        amount_out_min: U256,
        asset_in: AssetId,
        asset_out: AssetId,
        to: Address,
        deadline: u64,
    ) -> Result<U256, RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = self
            .exchange
            .pair_for(asset_in, asset_out)
            .ok_or(RouterError::PairMissing)?;
        let (reserve_in, reserve_out) = self.oriented_reserves(pair, asset_in)?;
        let config = self.exchange.config();
        let amount_out = CpMath::get_amount_out(
            amount_in,
            reserve_in,
            reserve_out,
            config.swap_fee_num,
            config.swap_fee_den,
        )?;
        if amount_out < amount_out_min {
            return Err(RouterError::InsufficientOutputAmount {
                actual: amount_out,
                minimum: amount_out_min,
            });
        }
        self.execute_swap(caller, pair, asset_in, amount_in, amount_out, to)?;
        Ok(amount_out)
    }

    /// Swaps at most `amount_in_max` for an exact output. Returns the
    /// input amount actually charged.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_tokens_for_exact_tokens(
        &self,
        caller: Address,
        amount_out: U256,
        amount_in_max: U256,
        asset_in: AssetId,
        asset_out: AssetId,
        to: Address,
        deadline: u64,
    ) -> Result<U256, RouterError> {
        self.ensure_deadline(deadline)?;
        let pair = self
            .exchange
            .pair_for(asset_in, asset_out)
            .ok_or(RouterError::PairMissing)?;
        let (reserve_in, reserve_out) = self.oriented_reserves(pair, asset_in)?;
        let config = self.exchange.config();
        let amount_in = CpMath::get_amount_in(
            amount_out,
            reserve_in,
            reserve_out,
            config.swap_fee_num,
            config.swap_fee_den,
        )?;
        if amount_in > amount_in_max {
            return Err(RouterError::ExcessiveInputAmount {
                actual: amount_in,
                maximum: amount_in_max,
            });
        }
        self.execute_swap(caller, pair, asset_in, amount_in, amount_out, to)?;
        Ok(amount_in)
    }

    // ---- internals ----

    fn ensure_deadline(&self, deadline: u64) -> Result<(), RouterError> {
        if self.exchange.now() > deadline {
            return Err(RouterError::Expired);
        }
        Ok(())
    }

    fn ensure_funded(
        &self,
        asset: AssetId,
        owner: Address,
        amount: U256,
    ) -> Result<(), RouterError> {
        if self.exchange.token(asset)?.balance_of(owner) < amount {
            return Err(TokenError::InsufficientBalance { owner }.into());
        }
        Ok(())
    }

    /// Replays the engine's burn arithmetic against committed state:
    /// pending fee skim included, pro-rata floor shares of held balances.
    fn predict_burn(
        &self,
        pair: PairAddress,
        asset_a: AssetId,
        liquidity: U256,
    ) -> Result<(U256, U256), RouterError> {
        let (asset0, asset1) = self.exchange.assets_of(pair)?;
        let balance0 = self.exchange.token(asset0)?.balance_of(pair);
        let balance1 = self.exchange.token(asset1)?.balance_of(pair);
        let (reserve0, reserve1, _) = self.exchange.reserves(pair)?;
        let mut total_supply = self.exchange.share_total_supply(pair)?;
        if self.exchange.fee_recipient().is_some() {
            if let Some(fee) = CpMath::protocol_fee_liquidity(
                self.exchange.k_last(pair)?,
                reserve0,
                reserve1,
                total_supply,
            ) {
                total_supply += fee;
            }
        }
        let (amount0, amount1) =
            CpMath::amounts_for_burn(liquidity, total_supply, balance0, balance1)?;
        Ok(if asset_a == asset0 {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        })
    }

    fn check_minimums(
        &self,
        (amount_a, amount_b): (U256, U256),
        amount_a_min: U256,
        amount_b_min: U256,
    ) -> Result<(), RouterError> {
        if amount_a < amount_a_min {
            return Err(RouterError::InsufficientAAmount {
                actual: amount_a,
                minimum: amount_a_min,
            });
        }
        if amount_b < amount_b_min {
            return Err(RouterError::InsufficientBAmount {
                actual: amount_b,
                minimum: amount_b_min,
            });
        }
        Ok(())
    }

    /// Deposit amounts honoring the current reserve ratio: the first
    /// deposit takes both desired amounts verbatim, later deposits scale
    /// one side down to the quoted ratio and check it against its minimum.
    fn liquidity_amounts(
        &self,
        pair: PairAddress,
        asset_a: AssetId,
        amount_a_desired: U256,
        amount_b_desired: U256,
        amount_a_min: U256,
        amount_b_min: U256,
    ) -> Result<(U256, U256), RouterError> {
        let (reserve_a, reserve_b) = self.oriented_reserves(pair, asset_a)?;
        if reserve_a == 0 && reserve_b == 0 {
            return Ok((amount_a_desired, amount_b_desired));
        }
        let amount_b_optimal = CpMath::quote(amount_a_desired, reserve_a, reserve_b)?;
        if amount_b_optimal <= amount_b_desired {
            if amount_b_optimal < amount_b_min {
                return Err(RouterError::InsufficientBAmount {
                    actual: amount_b_optimal,
                    minimum: amount_b_min,
                });
            }
            return Ok((amount_a_desired, amount_b_optimal));
        }
        let amount_a_optimal = CpMath::quote(amount_b_desired, reserve_b, reserve_a)?;
        debug_assert!(amount_a_optimal <= amount_a_desired);
        if amount_a_optimal < amount_a_min {
            return Err(RouterError::InsufficientAAmount {
                actual: amount_a_optimal,
                minimum: amount_a_min,
            });
        }
        Ok((amount_a_optimal, amount_b_desired))
    }

    fn oriented_reserves(
        &self,
        pair: PairAddress,
        asset_in: AssetId,
    ) -> Result<(u128, u128), RouterError> {
        let (asset0, _) = self.exchange.assets_of(pair)?;
        let (reserve0, reserve1, _) = self.exchange.reserves(pair)?;
        Ok(if asset_in == asset0 {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        })
    }

    fn execute_swap(
        &self,
        caller: Address,
        pair: PairAddress,
        asset_in: AssetId,
        amount_in: U256,
        amount_out: U256,
        to: Address,
    ) -> Result<(), RouterError> {
        self.exchange
            .token(asset_in)?
            .transfer(caller, pair, amount_in)?;
        let (asset0, _) = self.exchange.assets_of(pair)?;
        let (amount0_out, amount1_out) = if asset_in == asset0 {
            (U256::zero(), amount_out)
        } else {
            (amount_out, U256::zero())
        };
        self.exchange
            .swap(self.address, pair, amount0_out, amount1_out, to)?;
        Ok(())
    }
}
