#![allow(non_snake_case)]

use collab_shooter::{
    AccountController,
    ControllerSettings,
    PresencePolicy,
    ReadinessState,
    derivation::{
        USER_ACCOUNT_TAG,
        derive_address,
    },
    test_helpers::{
        FixturePayer,
        InMemoryProgram,
        ScriptedWallet,
        random_wallet_address,
    },
};
use fuels::types::Address;

type Controller = AccountController<ScriptedWallet, InMemoryProgram, InMemoryProgram>;

fn controller(program: &InMemoryProgram, wallet: Address, presence: PresencePolicy) -> Controller {
    let settings = ControllerSettings::new(
        program.program_id(),
        program.base_account_id(),
        FixturePayer::authority(),
    )
    .with_presence(presence);
    AccountController::new(
        ScriptedWallet::accepting(wallet),
        program.clone(),
        program.clone(),
        settings,
    )
}

#[tokio::test]
async fn new_player__initializes_both_accounts_and_reaches_ready() {
    // given
    let program = InMemoryProgram::new().with_initial_enemies(1);
    let wallet = random_wallet_address();
    let mut controller = controller(&program, wallet, PresencePolicy::default());
    assert_eq!(controller.state(), ReadinessState::Disconnected);

    // when
    let after_connect = controller.connect_wallet("secret").await;
    let after_base = controller.create_base_account().await;
    let after_user = controller.create_user_account().await;

    // then
    assert_eq!(after_connect, ReadinessState::NeedsBaseInit);
    assert_eq!(after_base, ReadinessState::NeedsUserInit);
    assert_eq!(after_user, ReadinessState::Ready);
    let expected = derive_address(&program.program_id(), USER_ACCOUNT_TAG, &wallet);
    assert_eq!(controller.snapshot().user_account, Some(expected));
}

#[tokio::test]
async fn ready_player__each_add_enemy_increments_both_counters_by_one() {
    // given
    let program = InMemoryProgram::new();
    let wallet = random_wallet_address();
    program.seed_base_account(5);
    program.seed_user_account(&wallet, 2);
    let mut controller = controller(&program, wallet, PresencePolicy::default());
    controller.connect_wallet("secret").await;

    for round in 1..=3u64 {
        // when
        let state = controller.add_enemy().await;

        // then
        assert_eq!(state, ReadinessState::Ready);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.enemy_count, 5 + round);
        assert_eq!(snapshot.enemies_added, 2 + round);
    }
    assert_eq!(program.base_enemies(), Some(8));
    assert_eq!(program.user_enemies(&wallet), Some(5));
}

#[tokio::test]
async fn zero_enemy_base_account__stays_in_needs_base_init_under_default_policy() {
    // given
    let program = InMemoryProgram::new();
    let mut controller = controller(&program, random_wallet_address(), PresencePolicy::default());
    controller.connect_wallet("secret").await;

    // when
    let first = controller.create_base_account().await;
    let second = controller.create_base_account().await;

    // then
    assert_eq!(first, ReadinessState::NeedsBaseInit);
    assert_eq!(second, ReadinessState::NeedsBaseInit);
    let snapshot = controller.snapshot();
    assert!(snapshot.base_exists);
    assert_eq!(snapshot.enemy_count, 0);
    // the second attempt reaches the contract and is rejected as a duplicate
    assert_eq!(program.base_payers().len(), 1);
}

#[tokio::test]
async fn initialized_base_account__second_creation_changes_nothing() {
    // given
    let program = InMemoryProgram::new().with_initial_enemies(1);
    let mut controller = controller(&program, random_wallet_address(), PresencePolicy::default());
    controller.connect_wallet("secret").await;
    let after_first = controller.create_base_account().await;
    let snapshot_before = controller.snapshot();

    // when
    let after_second = controller.create_base_account().await;

    // then
    assert_eq!(after_first, after_second);
    assert_eq!(controller.snapshot(), snapshot_before);
    assert_eq!(program.base_enemies(), Some(1));
}

#[tokio::test]
async fn two_players__share_the_base_counter_but_not_user_accounts() {
    // given
    let program = InMemoryProgram::new();
    program.seed_base_account(1);
    let alice = random_wallet_address();
    let bob = random_wallet_address();
    let mut alice_controller = controller(&program, alice, PresencePolicy::default());
    let mut bob_controller = controller(&program, bob, PresencePolicy::default());
    alice_controller.connect_wallet("a").await;
    alice_controller.create_user_account().await;
    bob_controller.connect_wallet("b").await;
    bob_controller.create_user_account().await;

    // when
    alice_controller.add_enemy().await;
    bob_controller.add_enemy().await;
    bob_controller.add_enemy().await;
    alice_controller.refresh().await;

    // then
    assert_eq!(alice_controller.snapshot().enemy_count, 4);
    assert_eq!(alice_controller.snapshot().enemies_added, 1);
    assert_eq!(bob_controller.snapshot().enemies_added, 2);
    assert_ne!(
        alice_controller.user_address(),
        bob_controller.user_address()
    );
}

#[tokio::test]
async fn reconnecting_after_disconnect__restores_ready_from_chain_state() {
    // given
    let program = InMemoryProgram::new();
    let wallet = random_wallet_address();
    program.seed_base_account(2);
    program.seed_user_account(&wallet, 1);
    let mut controller = controller(&program, wallet, PresencePolicy::default());
    controller.connect_wallet("secret").await;
    controller.disconnect();

    // when
    let state = controller.connect_wallet("secret").await;

    // then
    assert_eq!(state, ReadinessState::Ready);
    assert_eq!(controller.snapshot().enemies_added, 1);
}

#[tokio::test]
async fn transient_outage__recovers_on_refresh() {
    // given
    let program = InMemoryProgram::new();
    let wallet = random_wallet_address();
    program.seed_base_account(2);
    program.seed_user_account(&wallet, 1);
    program.fail_next_fetches(2);
    let mut controller = controller(&program, wallet, PresencePolicy::default());

    // when
    let degraded = controller.connect_wallet("secret").await;
    let recovered = controller.refresh().await;

    // then
    assert_eq!(degraded, ReadinessState::NeedsBaseInit);
    assert_eq!(recovered, ReadinessState::Ready);
}
