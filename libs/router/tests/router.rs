//! Orchestrator integration: ratio-true deposits, slippage and deadline
//! guards, native wrapping, permit-driven removal and single-pair swaps.

use std::sync::Arc;

use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::U256;
use types::{Address, MINIMUM_LIQUIDITY};
use xyk_amm::CpMath;
use xyk_engine::permit::permit_digest;
use xyk_engine::{
    EngineConfig, Exchange, ManualClock, MemoryToken, TokenLedger, WrappedNative,
};
use xyk_router::{Router, RouterError};

const START_TIME: u64 = 1_700_000_000;

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn wei(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

struct Harness {
    exchange: Arc<Exchange>,
    router: Router,
    clock: Arc<ManualClock>,
    asset_a: Address,
    asset_b: Address,
    native_asset: Address,
    token_a: Arc<MemoryToken>,
    token_b: Arc<MemoryToken>,
    wrapped: Arc<WrappedNative>,
    alice: Address,
    deadline: u64,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let clock = Arc::new(ManualClock::new(START_TIME));
    let exchange = Arc::new(
        Exchange::new(EngineConfig::default(), addr(0xAD317), clock.clone()).unwrap(),
    );

    let asset_a = addr(0x1000_0000);
    let asset_b = addr(0x2000_0000);
    let native_asset = addr(0x3000_0000);
    let token_a = Arc::new(MemoryToken::new("TKNA"));
    let token_b = Arc::new(MemoryToken::new("TKNB"));
    let wrapped = Arc::new(WrappedNative::new());
    exchange.register_token(asset_a, token_a.clone() as Arc<dyn TokenLedger>);
    exchange.register_token(asset_b, token_b.clone() as Arc<dyn TokenLedger>);
    exchange.register_token(native_asset, wrapped.clone() as Arc<dyn TokenLedger>);

    let router = Router::new(
        exchange.clone(),
        addr(0x407E3),
        native_asset,
        wrapped.clone(),
    );

    let alice = addr(0xA11CE);
    token_a.mint(alice, wei(10_000));
    token_b.mint(alice, wei(10_000));

    Harness {
        exchange,
        router,
        clock,
        asset_a,
        asset_b,
        native_asset,
        token_a,
        token_b,
        wrapped,
        alice,
        deadline: START_TIME + 3_600,
    }
}

#[test]
fn add_liquidity_bootstraps_the_pool() {
    let h = harness();
    let (amount_a, amount_b, liquidity) = h
        .router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(1),
            wei(4),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();

    assert_eq!(amount_a, wei(1));
    assert_eq!(amount_b, wei(4));
    assert_eq!(liquidity, wei(2) - U256::from(MINIMUM_LIQUIDITY));

    let pair = h.exchange.pair_for(h.asset_a, h.asset_b).unwrap();
    assert_eq!(h.exchange.share_balance_of(pair, h.alice).unwrap(), liquidity);
}

#[test]
fn later_deposits_are_scaled_to_the_reserve_ratio() {
    let h = harness();
    h.router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(1),
            wei(4),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();

    // B is abundant: scale B down to the quoted 1:4 ratio.
    let (amount_a, amount_b, _) = h
        .router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(2),
            wei(100),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();
    assert_eq!(amount_a, wei(2));
    assert_eq!(amount_b, wei(8));

    // A minimum that the scaled amount cannot meet aborts the deposit.
    let result = h.router.add_liquidity(
        h.alice,
        h.asset_a,
        h.asset_b,
        wei(2),
        wei(100),
        U256::zero(),
        wei(9),
        h.alice,
        h.deadline,
    );
    assert_eq!(
        result,
        Err(RouterError::InsufficientBAmount {
            actual: wei(8),
            minimum: wei(9)
        })
    );

    // A is the limiting side instead.
    let result = h.router.add_liquidity(
        h.alice,
        h.asset_a,
        h.asset_b,
        wei(2),
        wei(4),
        wei(2),
        U256::zero(),
        h.alice,
        h.deadline,
    );
    assert_eq!(
        result,
        Err(RouterError::InsufficientAAmount {
            actual: wei(1),
            minimum: wei(2)
        })
    );
}

#[test]
fn every_entry_point_checks_the_deadline_first() {
    let h = harness();
    h.clock.set(h.deadline + 1);
    let result = h.router.add_liquidity(
        h.alice,
        h.asset_a,
        h.asset_b,
        wei(1),
        wei(4),
        U256::zero(),
        U256::zero(),
        h.alice,
        h.deadline,
    );
    assert_eq!(result, Err(RouterError::Expired));
    // Nothing was created on the failed path.
    assert_eq!(h.exchange.pair_count(), 0);
}

#[test]
fn remove_liquidity_enforces_minimums() {
    let h = harness();
    let (_, _, liquidity) = h
        .router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(1),
            wei(4),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();
    let pair = h.exchange.pair_for(h.asset_a, h.asset_b).unwrap();
    h.exchange
        .share_approve(h.alice, pair, h.router.address(), U256::MAX)
        .unwrap();

    // The locked minimum keeps its slice, so a full-amount minimum fails.
    let result = h.router.remove_liquidity(
        h.alice,
        h.asset_a,
        h.asset_b,
        liquidity,
        wei(1),
        U256::zero(),
        h.alice,
        h.deadline,
    );
    assert!(matches!(
        result,
        Err(RouterError::InsufficientAAmount { .. })
    ));
    // The aborted removal left the position untouched.
    assert_eq!(
        h.exchange.share_balance_of(pair, h.alice).unwrap(),
        liquidity
    );

    let (amount_a, amount_b) = h
        .router
        .remove_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            liquidity,
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();
    assert_eq!(amount_a, wei(1) - U256::from(500u64));
    assert_eq!(amount_b, wei(4) - U256::from(2_000u64));
}

#[test]
fn native_liquidity_wraps_only_what_is_consumed() {
    let h = harness();
    let (amount_token, amount_native, liquidity) = h
        .router
        .add_liquidity_native(
            h.alice,
            h.asset_a,
            wei(1),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
            wei(4),
        )
        .unwrap();
    assert_eq!(amount_token, wei(1));
    assert_eq!(amount_native, wei(4));
    // Exactly the consumed native value entered the wrapped ledger.
    assert_eq!(h.wrapped.total_supply(), wei(4));

    let pair = h.exchange.pair_for(h.asset_a, h.native_asset).unwrap();
    h.exchange
        .share_approve(h.alice, pair, h.router.address(), U256::MAX)
        .unwrap();

    let bob = addr(0xB0B);
    let (out_token, out_native) = h
        .router
        .remove_liquidity_native(
            h.alice,
            h.asset_a,
            liquidity,
            U256::zero(),
            U256::zero(),
            bob,
            h.deadline,
        )
        .unwrap();
    assert_eq!(out_token, wei(1) - U256::from(500u64));
    assert_eq!(out_native, wei(4) - U256::from(2_000u64));
    assert_eq!(h.token_a.balance_of(bob), out_token);
    // The withdrawn native value was burned out of the wrapped supply.
    assert_eq!(h.wrapped.total_supply(), U256::from(2_000u64));
}

#[test]
fn permit_replaces_the_approval_call_for_removal() {
    let h = harness();
    let owner_wallet = LocalWallet::from_bytes(&[0x42; 32]).unwrap();
    let owner = owner_wallet.address();
    h.token_a.mint(owner, wei(1));
    h.token_b.mint(owner, wei(4));

    let (_, _, liquidity) = h
        .router
        .add_liquidity(
            owner,
            h.asset_a,
            h.asset_b,
            wei(1),
            wei(4),
            U256::zero(),
            U256::zero(),
            owner,
            h.deadline,
        )
        .unwrap();

    let pair = h.exchange.pair_for(h.asset_a, h.asset_b).unwrap();
    let domain = h.exchange.share_domain_separator(pair).unwrap();
    let digest = permit_digest(
        domain,
        owner,
        h.router.address(),
        liquidity,
        U256::zero(),
        h.deadline,
    );
    let signature = owner_wallet.sign_hash(digest).unwrap();

    let (amount_a, amount_b) = h
        .router
        .remove_liquidity_with_permit(
            owner,
            h.asset_a,
            h.asset_b,
            liquidity,
            U256::zero(),
            U256::zero(),
            owner,
            h.deadline,
            false,
            &signature,
        )
        .unwrap();
    assert_eq!(amount_a, wei(1) - U256::from(500u64));
    assert_eq!(amount_b, wei(4) - U256::from(2_000u64));
}

#[test]
fn exact_input_swap_prices_through_the_math_layer() {
    let h = harness();
    h.router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(5),
            wei(10),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();

    let amount_in = wei(1);
    let expected_out = CpMath::get_amount_out(
        amount_in,
        5 * 10u128.pow(18),
        10 * 10u128.pow(18),
        3,
        1_000,
    )
    .unwrap();

    let bob = addr(0xB0B);
    let amount_out = h
        .router
        .swap_exact_tokens_for_tokens(
            h.alice,
            amount_in,
            U256::zero(),
            h.asset_a,
            h.asset_b,
            bob,
            h.deadline,
        )
        .unwrap();
    assert_eq!(amount_out, expected_out);
    assert_eq!(h.token_b.balance_of(bob), expected_out);

    // A minimum above the achievable output aborts before any transfer.
    let result = h.router.swap_exact_tokens_for_tokens(
        h.alice,
        amount_in,
        wei(10),
        h.asset_a,
        h.asset_b,
        bob,
        h.deadline,
    );
    assert!(matches!(
        result,
        Err(RouterError::InsufficientOutputAmount { .. })
    ));
}

#[test]
fn exact_output_swap_charges_the_computed_input() {
    let h = harness();
    h.router
        .add_liquidity(
            h.alice,
            h.asset_a,
            h.asset_b,
            wei(5),
            wei(10),
            U256::zero(),
            U256::zero(),
            h.alice,
            h.deadline,
        )
        .unwrap();

    let amount_out = wei(1);
    let expected_in = CpMath::get_amount_in(
        amount_out,
        5 * 10u128.pow(18),
        10 * 10u128.pow(18),
        3,
        1_000,
    )
    .unwrap();

    let balance_before = h.token_a.balance_of(h.alice);
    let bob = addr(0xB0B);
    let amount_in = h
        .router
        .swap_tokens_for_exact_tokens(
            h.alice,
            amount_out,
            U256::MAX,
            h.asset_a,
            h.asset_b,
            bob,
            h.deadline,
        )
        .unwrap();
    assert_eq!(amount_in, expected_in);
    assert_eq!(h.token_a.balance_of(h.alice), balance_before - expected_in);
    assert_eq!(h.token_b.balance_of(bob), amount_out);

    // A cap below the required input aborts the swap.
    let result = h.router.swap_tokens_for_exact_tokens(
        h.alice,
        amount_out,
        U256::one(),
        h.asset_a,
        h.asset_b,
        bob,
        h.deadline,
    );
    assert!(matches!(
        result,
        Err(RouterError::ExcessiveInputAmount { .. })
    ));
}
