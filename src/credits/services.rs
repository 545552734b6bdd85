use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::credits::repo::{self, CreditTransaction, TransactionType};
use crate::error::{CoreError, Result};
use crate::state::AppState;

/// Move `amount` credits from one user to another.
///
/// Both balance updates and both ledger rows commit as one transaction;
/// a failure at any step leaves no observable change.
pub async fn transfer_credits(
    state: &AppState,
    from_user: Uuid,
    to_user: Uuid,
    amount: i32,
    reason: &str,
    exchange_id: Option<Uuid>,
) -> Result<()> {
    let mut tx = state.db.begin().await?;
    let (debit, credit) =
        transfer_in_tx(&mut tx, from_user, to_user, amount, reason, exchange_id).await?;
    tx.commit().await?;

    info!(%from_user, %to_user, amount, "credits transferred");
    notify_credits(state, &debit).await;
    notify_credits(state, &credit).await;
    Ok(())
}

/// Transfer primitive that participates in the caller's transaction scope.
/// Used directly by exchange completion so the status change and the
/// ledger movement commit or roll back together.
pub(crate) async fn transfer_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    from_user: Uuid,
    to_user: Uuid,
    amount: i32,
    reason: &str,
    exchange_id: Option<Uuid>,
) -> Result<(CreditTransaction, CreditTransaction)> {
    if from_user == to_user {
        return Err(CoreError::InvalidArgument(
            "cannot transfer credits to yourself".into(),
        ));
    }
    if amount <= 0 {
        return Err(CoreError::InvalidArgument("amount must be positive".into()));
    }

    // Lock both rows in ascending id order so two opposing transfers
    // running concurrently cannot deadlock.
    let (first, second) = if from_user < to_user {
        (from_user, to_user)
    } else {
        (to_user, from_user)
    };
    let first_balance = repo::lock_balance(tx, first).await?;
    let second_balance = repo::lock_balance(tx, second).await?;
    let (Some(first_balance), Some(second_balance)) = (first_balance, second_balance) else {
        return Err(CoreError::NotFound("one or both users".into()));
    };
    let (from_balance, to_balance) = if first == from_user {
        (first_balance, second_balance)
    } else {
        (second_balance, first_balance)
    };

    if from_balance < amount {
        return Err(CoreError::InvalidOperation("insufficient credits".into()));
    }

    let from_after = from_balance - amount;
    let to_after = to_balance + amount;
    repo::set_balance(tx, from_user, from_after).await?;
    repo::set_balance(tx, to_user, to_after).await?;

    let debit = repo::insert_transaction(
        tx,
        from_user,
        -amount,
        from_after,
        TransactionType::ExchangeCompletion,
        reason,
        Some(to_user),
        exchange_id,
    )
    .await?;
    let credit = repo::insert_transaction(
        tx,
        to_user,
        amount,
        to_after,
        TransactionType::ExchangeCompletion,
        reason,
        Some(from_user),
        exchange_id,
    )
    .await?;

    Ok((debit, credit))
}

pub async fn add_credits(
    state: &AppState,
    user_id: Uuid,
    amount: i32,
    reason: &str,
) -> Result<CreditTransaction> {
    if amount <= 0 {
        return Err(CoreError::InvalidArgument("amount must be positive".into()));
    }
    adjust(state, user_id, amount, reason).await
}

pub async fn deduct_credits(
    state: &AppState,
    user_id: Uuid,
    amount: i32,
    reason: &str,
) -> Result<CreditTransaction> {
    if amount <= 0 {
        return Err(CoreError::InvalidArgument("amount must be positive".into()));
    }
    adjust(state, user_id, -amount, reason).await
}

async fn adjust(
    state: &AppState,
    user_id: Uuid,
    signed_amount: i32,
    reason: &str,
) -> Result<CreditTransaction> {
    let mut tx = state.db.begin().await?;
    let balance = repo::lock_balance(&mut tx, user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
    let after = balance + signed_amount;
    if after < 0 {
        return Err(CoreError::InvalidOperation("insufficient credits".into()));
    }
    repo::set_balance(&mut tx, user_id, after).await?;
    let txn = repo::insert_transaction(
        &mut tx,
        user_id,
        signed_amount,
        after,
        TransactionType::AdminAdjustment,
        reason,
        None,
        None,
    )
    .await?;
    tx.commit().await?;

    info!(%user_id, signed_amount, balance_after = after, "credits adjusted");
    notify_credits(state, &txn).await;
    Ok(txn)
}

/// Lenient read: unknown users simply have a zero balance.
pub async fn get_user_credits(state: &AppState, user_id: Uuid) -> Result<i32> {
    Ok(repo::balance(&state.db, user_id).await?.unwrap_or(0))
}

pub async fn get_user_credit_history(
    state: &AppState,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<CreditTransaction>> {
    repo::history(&state.db, user_id, limit).await
}

async fn notify_credits(state: &AppState, txn: &CreditTransaction) {
    if let Err(e) = state
        .notifier
        .credits_changed(txn.user_id, txn.amount, txn.balance_after)
        .await
    {
        warn!(error = %e, user_id = %txn.user_id, "credit notification dispatch failed");
    }
}
