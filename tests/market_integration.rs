//! Market Integration Tests for SHADE
//!
//! End-to-end flows through the public market surface:
//! - Liquidity bootstrap and proportional deposits
//! - No-op behaviour on underfunded legs, allowances and share burns
//! - Grant scoping across the two ledgers and the pool
//! - Swaps, snapshots and serialized concurrent submitters

mod common;

use std::sync::Arc;
use std::thread;

use common::Fixture;
use shade::auth::AuthError;
use shade::token::LedgerError;
use shade::prelude::*;

// =============================================================================
// LIQUIDITY TESTS
// =============================================================================

mod liquidity_tests {
    use super::*;

    #[test]
    fn test_two_providers_scenario() {
        let mut f = Fixture::deploy();
        let (alice, bob) = (f.alice.account(), f.bob.account());
        f.fund(&alice, 1_000, 1_000);
        f.fund(&bob, 1_000, 1_000);

        f.approve_pool(&alice, 100, 200);
        f.add_liquidity(&alice, 100, 200);
        let alice_shares = f.shares(&f.alice);
        assert!(alice_shares > 0);
        assert_eq!(f.reserves(), (100, 200));
        assert_eq!(f.constant_product(), 20_000);

        f.approve_pool(&bob, 50, 100);
        f.add_liquidity(&bob, 50, 100);
        assert_eq!(f.reserves(), (150, 300));
        assert_eq!(f.constant_product(), 45_000);
        assert_eq!(f.shares(&f.bob), alice_shares / 2);
        assert_eq!(f.total_shares(), alice_shares + alice_shares / 2);

        assert_eq!(f.status(&f.carol), PoolStatus::Active);
    }

    #[test]
    fn test_underfunded_leg_does_not_revert() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        f.fund(&alice, 100, 5_000);
        f.approve_pool(&alice, 1_000, 1_000);

        f.add_liquidity(&alice, 1_000, 1_000);

        // A leg is a no-op; B leg is covered and moves on its own
        assert_eq!(f.reserves(), (0, 1_000));
        assert_eq!(f.balances(&f.alice), (100, 4_000));
        assert_eq!(f.shares(&f.alice), 0);
        assert_eq!(f.total_shares(), 0);
    }

    #[test]
    fn test_missing_allowance_moves_nothing() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        f.fund(&alice, 500, 500);
        f.approve_pool(&alice, 100, 100);

        f.add_liquidity(&alice, 300, 50);
        assert_eq!(f.reserves(), (0, 50));
        assert_eq!(f.balances(&f.alice), (500, 450));
    }

    #[test]
    fn test_remove_liquidity_returns_backing() {
        let mut f = Fixture::deploy();
        let (alice, bob) = (f.alice.account(), f.bob.account());
        f.fund(&alice, 1_000, 4_000);
        f.fund(&bob, 500, 2_000);
        f.approve_pool(&alice, 1_000, 4_000);
        f.add_liquidity(&alice, 1_000, 4_000);
        f.approve_pool(&bob, 500, 2_000);
        f.add_liquidity(&bob, 500, 2_000);
        assert_eq!((f.shares(&f.alice), f.shares(&f.bob)), (2_000, 1_000));

        f.remove_liquidity(&bob, 1_000);
        assert_eq!(f.balances(&f.bob), (500, 2_000));
        assert_eq!(f.reserves(), (1_000, 4_000));
        assert_eq!(f.total_shares(), 2_000);

        // More than held: nothing burned
        f.remove_liquidity(&alice, 2_001);
        assert_eq!(f.shares(&f.alice), 2_000);
        assert_eq!(f.reserves(), (1_000, 4_000));
    }
}

// =============================================================================
// LEDGER TESTS
// =============================================================================

mod ledger_tests {
    use super::*;

    #[test]
    fn test_transfer_from_shortfall_leaves_balance() {
        let mut f = Fixture::deploy();
        let (alice, bob, carol) = (f.alice.account(), f.bob.account(), f.carol.account());
        let token_a = f.market.token_a_id();
        f.fund(&alice, 40, 0);

        let allowance = f.enc(1_000);
        f.market.approve(&alice, token_a, &bob, &allowance).unwrap();
        let amount = f.enc(41);
        f.market.transfer_from(&bob, token_a, &alice, &carol, &amount).unwrap();

        assert_eq!(f.balances(&f.alice).0, 40);
        assert_eq!(f.balances(&f.carol).0, 0);
        assert_eq!(f.allowance(&f.alice, token_a, &bob), 1_000);
    }

    #[test]
    fn test_mint_is_owner_only() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        let token_b = f.market.token_b_id();
        let err = f.market.mint(&alice, token_b, 1).unwrap_err();
        assert!(matches!(err, CfmmError::Ledger(_)));
        assert_eq!(f.market.ledger(token_b).unwrap().total_supply(), 0);
    }

    #[test]
    fn test_supply_is_conserved_by_transfers() {
        let mut f = Fixture::deploy();
        let (alice, bob) = (f.alice.account(), f.bob.account());
        let token_a = f.market.token_a_id();
        f.fund(&alice, 700, 0);
        f.fund(&bob, 300, 0);

        for (from, to, amount) in [(alice, bob, 250u32), (bob, alice, 900), (bob, alice, 50)] {
            let input = f.enc(amount);
            f.market.transfer(&from, token_a, &to, &input).unwrap();
        }

        let (a, b) = (f.balances(&f.alice).0, f.balances(&f.bob).0);
        assert_eq!((a, b), (500, 500));
        assert_eq!(a + b, f.market.ledger(token_a).unwrap().total_supply());
    }
}

// =============================================================================
// AUTHORIZATION TESTS
// =============================================================================

mod authorization_tests {
    use super::*;

    #[test]
    fn test_grant_decrypts_own_instance_only() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        let token_a = f.market.token_a_id();
        f.fund(&alice, 20_000, 0);

        let token_grant = f.grant(&f.alice, token_a);
        assert_eq!(f.open(f.market.reveal_balance(token_a, &token_grant)), 20_000);

        let pool_grant = f.grant(&f.alice, f.market.pool_id());
        let err = f.market.reveal_balance(token_a, &pool_grant).unwrap_err();
        assert!(matches!(err, CfmmError::Ledger(LedgerError::Auth(AuthError::GrantMismatch(_)))));

        let token_b_grant = f.grant(&f.alice, f.market.token_b_id());
        let err = f.market.reveal_reserve_a(&token_b_grant).unwrap_err();
        assert!(matches!(err, CfmmError::Auth(AuthError::GrantMismatch(_))));
    }

    #[test]
    fn test_token_grant_cannot_read_pool_reserves() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        f.fund(&alice, 100, 200);
        f.approve_pool(&alice, 100, 200);
        f.add_liquidity(&alice, 100, 200);

        // A ledger grant only ever keys that ledger's own slots
        let token_grant = f.grant(&f.alice, f.market.token_a_id());
        for read in [Market::reveal_reserve_a, Market::reveal_reserve_b, Market::reveal_total_shares] {
            let err = read(&f.market, &token_grant).unwrap_err();
            assert!(matches!(err, CfmmError::Auth(AuthError::GrantMismatch(_))));
        }
        let err = f.market.reveal_shares(&token_grant).unwrap_err();
        assert!(matches!(err, CfmmError::Auth(AuthError::GrantMismatch(_))));
    }

    #[test]
    fn test_token_signature_not_replayable_on_pool() {
        let f = Fixture::deploy();
        let domain = f.market.domain(&f.market.token_a_id()).unwrap();
        let signature = f.alice.sign_reencrypt(&domain, &f.keypair.public_key());

        let err = f
            .market
            .request_grant(f.market.pool_id(), f.alice.account(), f.keypair.public_key(), signature)
            .unwrap_err();
        assert_eq!(err, CfmmError::Auth(AuthError::InvalidSignature));
    }

    #[test]
    fn test_balances_are_private_to_holder() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        f.fund(&alice, 5, 5);

        let token_a = f.market.token_a_id();
        let bob_grant = f.grant(&f.bob, token_a);
        // Bob's grant is keyed to his own slot whatever he asks for
        assert_eq!(f.open(f.market.reveal_balance(token_a, &bob_grant)), 0);
        assert_eq!(f.open(f.market.reveal_allowance(token_a, &alice, &bob_grant)), 0);
        assert_eq!(f.balances(&f.alice), (5, 5));

        // The public handle carries Alice's scope and stays sealed to her
        let handle = f.market.balance_of(token_a, &alice).unwrap();
        assert_eq!(handle.owner(), Some(alice));
        assert_eq!(handle.instance(), token_a);
    }

    #[test]
    fn test_grant_reusable_within_session() {
        let mut f = Fixture::deploy();
        let alice = f.alice.account();
        f.fund(&alice, 100, 200);
        f.approve_pool(&alice, 100, 200);
        f.add_liquidity(&alice, 100, 200);

        let grant = f.grant(&f.alice, f.market.pool_id());
        let values = vec![
            f.open(f.market.reveal_reserve_a(&grant)),
            f.open(f.market.reveal_reserve_b(&grant)),
            f.open(f.market.reveal_constant_product(&grant)),
            f.open(f.market.reveal_shares(&grant)),
        ];
        assert_eq!(values, vec![100, 200, 20_000, 141]);
    }
}

// =============================================================================
// SWAP TESTS
// =============================================================================

mod swap_tests {
    use super::*;

    fn seeded() -> Fixture {
        let mut f = Fixture::deploy();
        let (alice, bob) = (f.alice.account(), f.bob.account());
        f.fund(&alice, 10_000, 10_000);
        f.fund(&bob, 1_000, 1_000);
        f.approve_pool(&alice, 10_000, 10_000);
        f.add_liquidity(&alice, 10_000, 10_000);
        f
    }

    #[test]
    fn test_swap_round_trip() {
        let mut f = seeded();
        let bob = f.bob.account();
        let product = f.constant_product();

        f.approve_pool(&bob, 1_000, 1_000);
        f.swap(&bob, SwapDirection::AtoB, 1_000, 900);
        // 10000 * 1000 / 11000
        assert_eq!(f.balances(&f.bob), (0, 1_909));
        assert_eq!(f.reserves(), (11_000, 9_091));
        assert!(f.constant_product() >= product);
    }

    #[test]
    fn test_slippage_refund() {
        let mut f = seeded();
        let bob = f.bob.account();
        f.approve_pool(&bob, 1_000, 1_000);
        f.swap(&bob, SwapDirection::BtoA, 1_000, 950);
        assert_eq!(f.balances(&f.bob), (1_000, 1_000));
        assert_eq!(f.reserves(), (10_000, 10_000));
    }
}

// =============================================================================
// EXECUTION ENVIRONMENT TESTS
// =============================================================================

mod environment_tests {
    use super::*;

    #[test]
    fn test_snapshot_resume_with_same_keys() {
        let deployer = LocalSigner::from_label("deployer");
        let alice = LocalSigner::from_label("alice");
        let backend = SimulatedBackend::generate();
        let keys = backend.export_keys();
        let mut market =
            Market::deploy(Arc::new(backend), &MarketConfig::default(), deployer.account()).unwrap();
        let token_a = market.token_a_id();
        market.mint(&deployer.account(), token_a, 64).unwrap();

        let json = market.snapshot().to_json().unwrap();
        let restored_backend: Arc<dyn FheBackend> = Arc::new(SimulatedBackend::from_keys(keys));
        let mut restored = Market::from_state(restored_backend, MarketState::from_json(&json).unwrap());

        let input = EncryptedInput::encrypt(14, &restored.network_public_key()).unwrap();
        restored.transfer(&deployer.account(), token_a, &alice.account(), &input).unwrap();

        let keypair = ReencryptionKeypair::generate();
        let domain = restored.domain(&token_a).unwrap();
        let signature = deployer.sign_reencrypt(&domain, &keypair.public_key());
        let grant = restored
            .request_grant(token_a, deployer.account(), keypair.public_key(), signature)
            .unwrap();
        assert_eq!(keypair.open(&restored.reveal_balance(token_a, &grant).unwrap()).unwrap(), 50);
    }

    #[test]
    fn test_concurrent_providers_are_serialized() {
        let mut f = Fixture::deploy();
        let providers: Vec<LocalSigner> = ["alice", "bob", "carol"].into_iter().map(LocalSigner::from_label).collect();
        for p in &providers {
            let account = p.account();
            f.fund(&account, 100, 100);
            f.approve_pool(&account, 100, 100);
        }
        let network = f.market.network_public_key();
        let Fixture { market, deployer, keypair, .. } = f;
        let shared = SharedMarket::new(market);

        let handles: Vec<_> = providers
            .iter()
            .map(|p| {
                let shared = shared.clone();
                let account = p.account();
                thread::spawn(move || {
                    let a = EncryptedInput::encrypt(100, &network).unwrap();
                    let b = EncryptedInput::encrypt(100, &network).unwrap();
                    shared.execute(|m| m.add_liquidity(&account, &a, &b)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total = shared.read(|m| {
            let pool = m.pool_id();
            let domain = m.domain(&pool).unwrap();
            let signature = deployer.sign_reencrypt(&domain, &keypair.public_key());
            let grant = m.request_grant(pool, deployer.account(), keypair.public_key(), signature).unwrap();
            keypair.open(&m.reveal_total_shares(&grant).unwrap()).unwrap()
        });
        assert_eq!(total, 300);
    }
}
