use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credit_transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    ExchangeCompletion,
    AdminAdjustment,
}

/// One append-only ledger row. `balance_after` is authoritative for the
/// user's balance at this point in the log; balances are never recomputed
/// by summing amounts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub amount: i32,
    pub balance_after: i32,
    pub transaction_type: TransactionType,
    pub reason: String,
    pub related_user_id: Option<Uuid>,
    pub exchange_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// Read a user's balance and lock the row for the rest of the transaction.
pub(crate) async fn lock_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Option<i32>> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT time_credits FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.map(|(balance,)| balance))
}

pub(crate) async fn set_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    balance: i32,
) -> Result<()> {
    sqlx::query("UPDATE users SET time_credits = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(balance)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i32,
    balance_after: i32,
    transaction_type: TransactionType,
    reason: &str,
    related_user_id: Option<Uuid>,
    exchange_id: Option<Uuid>,
) -> Result<CreditTransaction> {
    let row = sqlx::query_as::<_, CreditTransaction>(
        r#"
        INSERT INTO credit_transactions
            (user_id, amount, balance_after, transaction_type, reason,
             related_user_id, exchange_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, amount, balance_after, transaction_type, reason,
                  related_user_id, exchange_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(balance_after)
    .bind(transaction_type)
    .bind(reason)
    .bind(related_user_id)
    .bind(exchange_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

pub(crate) async fn balance(db: &PgPool, user_id: Uuid) -> Result<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT time_credits FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(balance,)| balance))
}

/// Ledger rows for a user, newest first. A NULL limit means no cap.
pub(crate) async fn history(
    db: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<CreditTransaction>> {
    let rows = sqlx::query_as::<_, CreditTransaction>(
        r#"
        SELECT id, user_id, amount, balance_after, transaction_type, reason,
               related_user_id, exchange_id, created_at
        FROM credit_transactions
        WHERE user_id = $1
        ORDER BY id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
