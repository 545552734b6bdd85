//! Credit ledger integration tests.
//!
//! These require a Postgres instance reachable via DATABASE_URL and skip
//! themselves otherwise.

use skillswap::credits::services::{
    add_credits, deduct_credits, get_user_credit_history, get_user_credits, transfer_credits,
};
use skillswap::credits::TransactionType;
use skillswap::CoreError;
use uuid::Uuid;

mod common;
use common::{seed_user, seed_user_with_credits, test_state};

#[tokio::test]
async fn transfer_moves_balances_and_writes_paired_rows() {
    require_database!();
    let state = test_state().await;

    let alice = seed_user_with_credits(&state, "alice", 10).await;
    let bob = seed_user_with_credits(&state, "bob", 5).await;

    transfer_credits(&state, alice.id, bob.id, 2, "lesson payment", None)
        .await
        .expect("transfer should succeed");

    assert_eq!(get_user_credits(&state, alice.id).await.unwrap(), 8);
    assert_eq!(get_user_credits(&state, bob.id).await.unwrap(), 7);

    let alice_history = get_user_credit_history(&state, alice.id, Some(1)).await.unwrap();
    let debit = &alice_history[0];
    assert_eq!(debit.amount, -2);
    assert_eq!(debit.balance_after, 8);
    assert_eq!(debit.transaction_type, TransactionType::ExchangeCompletion);
    assert_eq!(debit.related_user_id, Some(bob.id));
    assert_eq!(debit.reason, "lesson payment");

    let bob_history = get_user_credit_history(&state, bob.id, Some(1)).await.unwrap();
    let credit = &bob_history[0];
    assert_eq!(credit.amount, 2);
    assert_eq!(credit.balance_after, 7);
    assert_eq!(credit.transaction_type, TransactionType::ExchangeCompletion);
    assert_eq!(credit.related_user_id, Some(alice.id));
}

#[tokio::test]
async fn transfer_rejects_non_positive_amounts() {
    require_database!();
    let state = test_state().await;

    let alice = seed_user_with_credits(&state, "alice", 10).await;
    let bob = seed_user(&state, "bob").await;

    for amount in [0, -5] {
        let err = transfer_credits(&state, alice.id, bob.id, amount, "bad", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)), "amount {amount}");
    }

    // Nothing moved, nothing logged.
    assert_eq!(get_user_credits(&state, alice.id).await.unwrap(), 10);
    assert_eq!(get_user_credits(&state, bob.id).await.unwrap(), 0);
    let seed_rows = 1; // alice's seed adjustment
    assert_eq!(
        get_user_credit_history(&state, alice.id, None).await.unwrap().len(),
        seed_rows
    );
    assert!(get_user_credit_history(&state, bob.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_rejects_self_transfer_regardless_of_balance() {
    require_database!();
    let state = test_state().await;

    let alice = seed_user_with_credits(&state, "alice", 10).await;
    let err = transfer_credits(&state, alice.id, alice.id, 1, "self", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
    assert_eq!(get_user_credits(&state, alice.id).await.unwrap(), 10);
}

#[tokio::test]
async fn transfer_rejects_unknown_users() {
    require_database!();
    let state = test_state().await;

    let alice = seed_user_with_credits(&state, "alice", 10).await;
    let ghost = Uuid::new_v4();

    let err = transfer_credits(&state, alice.id, ghost, 1, "to ghost", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = transfer_credits(&state, ghost, alice.id, 1, "from ghost", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    assert_eq!(get_user_credits(&state, alice.id).await.unwrap(), 10);
}

#[tokio::test]
async fn transfer_rejects_insufficient_balance_and_is_a_noop() {
    require_database!();
    let state = test_state().await;

    let alice = seed_user_with_credits(&state, "alice", 3).await;
    let bob = seed_user(&state, "bob").await;

    let err = transfer_credits(&state, alice.id, bob.id, 4, "too much", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert!(err.to_string().contains("insufficient credits"));

    assert_eq!(get_user_credits(&state, alice.id).await.unwrap(), 3);
    assert_eq!(get_user_credits(&state, bob.id).await.unwrap(), 0);
    assert!(get_user_credit_history(&state, bob.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_adjustments_write_single_rows() {
    require_database!();
    let state = test_state().await;

    let user = seed_user(&state, "carol").await;

    add_credits(&state, user.id, 5, "welcome bonus").await.unwrap();
    assert_eq!(get_user_credits(&state, user.id).await.unwrap(), 5);

    deduct_credits(&state, user.id, 2, "penalty").await.unwrap();
    assert_eq!(get_user_credits(&state, user.id).await.unwrap(), 3);

    let history = get_user_credit_history(&state, user.id, None).await.unwrap();
    assert_eq!(history.len(), 2);
    // Newest first.
    assert_eq!(history[0].amount, -2);
    assert_eq!(history[0].balance_after, 3);
    assert_eq!(history[1].amount, 5);
    assert_eq!(history[1].balance_after, 5);
    for row in &history {
        assert_eq!(row.transaction_type, TransactionType::AdminAdjustment);
        assert_eq!(row.related_user_id, None);
        assert_eq!(row.exchange_id, None);
    }
}

#[tokio::test]
async fn deduct_beyond_balance_fails() {
    require_database!();
    let state = test_state().await;

    let user = seed_user_with_credits(&state, "dave", 1).await;
    let err = deduct_credits(&state, user.id, 2, "overdraw").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert_eq!(get_user_credits(&state, user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn adjustment_amount_must_be_positive() {
    require_database!();
    let state = test_state().await;

    let user = seed_user(&state, "erin").await;
    for amount in [0, -1] {
        assert!(matches!(
            add_credits(&state, user.id, amount, "bad").await.unwrap_err(),
            CoreError::InvalidArgument(_)
        ));
        assert!(matches!(
            deduct_credits(&state, user.id, amount, "bad").await.unwrap_err(),
            CoreError::InvalidArgument(_)
        ));
    }
}

#[tokio::test]
async fn unknown_user_reads_are_lenient() {
    require_database!();
    let state = test_state().await;

    let ghost = Uuid::new_v4();
    assert_eq!(get_user_credits(&state, ghost).await.unwrap(), 0);
    assert!(get_user_credit_history(&state, ghost, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_newest_first_and_respects_limit() {
    require_database!();
    let state = test_state().await;

    let user = seed_user(&state, "fred").await;
    add_credits(&state, user.id, 1, "first").await.unwrap();
    add_credits(&state, user.id, 2, "second").await.unwrap();
    add_credits(&state, user.id, 3, "third").await.unwrap();

    let all = get_user_credit_history(&state, user.id, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].reason, "third");
    assert_eq!(all[2].reason, "first");

    let capped = get_user_credit_history(&state, user.id, Some(2)).await.unwrap();
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].reason, "third");
}
