//! Integration tests for `PgProgressionRepository` and the reward outbox.

use diana_core::model::{
    ChoiceId, ClueId, FragmentId, UserDecisionLog, UserId, UserNarrativeState,
};
use diana_core::repository::{ProgressionRepository, ProgressionTransaction};
use diana_core::rewards::{RewardGrant, RewardGranter};
use diana_store::pg_progression_repository::PgProgressionRepository;
use diana_store::rewards::PgRewardOutbox;
use diana_test_support::{ChoiceBuilder, fixed_now};
use sqlx::PgPool;
use uuid::Uuid;

const USER: UserId = UserId(1001);

fn make_decision(fragment: &str, minutes: i64) -> UserDecisionLog {
    UserDecisionLog {
        decision_id: Uuid::now_v7(),
        user_id: USER,
        fragment_id: FragmentId::from(fragment),
        choice_id: ChoiceId::from("go"),
        choice_index: 1,
        choice_text: "Go".to_owned(),
        reward_amount: 5,
        clues_unlocked: vec![ClueId::from("clue_a")],
        correlation_id: Uuid::new_v4(),
        made_at: fixed_now() + chrono::Duration::minutes(minutes),
    }
}

fn advanced_state() -> UserNarrativeState {
    let mut state = UserNarrativeState::new(USER, FragmentId::from("f1"), fixed_now());
    let choice = ChoiceBuilder::new("go", "Go")
        .next("f2")
        .unlocks("clue_a")
        .build();
    state.apply_choice(&FragmentId::from("f1"), &choice, fixed_now());
    state
}

// --- state ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_committed_state_round_trips(pool: PgPool) {
    // Arrange
    let repo = PgProgressionRepository::new(pool);
    let state = advanced_state();

    // Act
    let mut tx = repo.begin().await.unwrap();
    tx.save_state(&state).await.unwrap();
    tx.commit().await.unwrap();

    // Assert
    let loaded = repo.load_state(USER).await.unwrap().unwrap();
    assert_eq!(loaded, state);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_dropped_transaction_writes_nothing(pool: PgPool) {
    // Arrange
    let repo = PgProgressionRepository::new(pool);

    // Act
    {
        let mut tx = repo.begin().await.unwrap();
        tx.append_decision(&make_decision("f1", 0)).await.unwrap();
        tx.save_state(&advanced_state()).await.unwrap();
    }

    // Assert
    assert!(repo.load_state(USER).await.unwrap().is_none());
    assert!(repo.load_decisions(USER, 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_load_for_update_sees_own_writes(pool: PgPool) {
    let repo = PgProgressionRepository::new(pool);
    let state = advanced_state();

    let mut tx = repo.begin().await.unwrap();
    tx.save_state(&state).await.unwrap();
    let seen = tx.load_state_for_update(USER).await.unwrap();

    assert_eq!(seen, Some(state));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_first_contact_from_two_transactions_keeps_unlocked_clue(pool: PgPool) {
    // Arrange: a choice transaction holds the user before any state exists.
    let repo = PgProgressionRepository::new(pool);
    let mut tx_choice = repo.begin().await.unwrap();
    assert!(tx_choice.load_state_for_update(USER).await.unwrap().is_none());

    let enter_repo = repo.clone();
    let enter = tokio::spawn(async move {
        let mut tx_enter = enter_repo.begin().await.unwrap();
        let seen = tx_enter.load_state_for_update(USER).await.unwrap();
        if seen.is_none() {
            let fresh = UserNarrativeState::new(USER, FragmentId::from("f1"), fixed_now());
            tx_enter.save_state(&fresh).await.unwrap();
        }
        tx_enter.commit().await.unwrap();
        seen
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // Act
    tx_choice
        .append_decision(&make_decision("f1", 0))
        .await
        .unwrap();
    tx_choice.save_state(&advanced_state()).await.unwrap();
    tx_choice.commit().await.unwrap();
    let seen_by_enter = enter.await.unwrap();

    // Assert
    assert_eq!(seen_by_enter, Some(advanced_state()));
    let stored = repo.load_state(USER).await.unwrap().unwrap();
    assert!(stored.has_clue(&ClueId::from("clue_a")));
    assert_eq!(stored.current_fragment_id, Some(FragmentId::from("f2")));
}

// --- decisions ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_decisions_are_returned_newest_first(pool: PgPool) {
    // Arrange
    let repo = PgProgressionRepository::new(pool);
    let first = make_decision("f1", 0);
    let second = make_decision("f2", 1);
    let mut tx = repo.begin().await.unwrap();
    tx.append_decision(&first).await.unwrap();
    tx.append_decision(&second).await.unwrap();
    tx.commit().await.unwrap();

    // Act
    let loaded = repo.load_decisions(USER, 1).await.unwrap();

    // Assert
    assert_eq!(loaded, vec![second]);
}

// --- reward outbox ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_outbox_records_each_decision_once(pool: PgPool) {
    // Arrange
    let outbox = PgRewardOutbox::new(pool.clone());
    let grant = RewardGrant {
        user_id: USER,
        amount: 10,
        fragment_id: FragmentId::from("f1"),
        decision_id: Uuid::now_v7(),
    };

    // Act
    outbox.grant(&grant).await.unwrap();
    outbox.grant(&grant).await.unwrap();

    // Assert
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reward_grants")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
