use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Result;
use crate::exchanges::status::ExchangeStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillExchange {
    pub id: Uuid,
    pub offerer_id: Uuid,
    pub learner_id: Uuid,
    pub skill_id: Uuid,
    pub scheduled_at: OffsetDateTime,
    pub duration_minutes: i32,
    pub status: ExchangeStatus,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One audit-trail row. `from_status` is NULL only on the creation record;
/// rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExchangeStatusHistory {
    pub id: i64,
    pub exchange_id: Uuid,
    pub from_status: Option<ExchangeStatus>,
    pub to_status: ExchangeStatus,
    pub changed_by: Uuid,
    pub reason: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewExchange {
    pub learner_id: Uuid,
    pub offerer_id: Uuid,
    pub skill_id: Uuid,
    pub scheduled_at: OffsetDateTime,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

impl SkillExchange {
    pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<SkillExchange>> {
        let exchange = sqlx::query_as::<_, SkillExchange>(
            r#"
            SELECT id, offerer_id, learner_id, skill_id, scheduled_at, duration_minutes,
                   status, meeting_link, notes, created_at, updated_at
            FROM skill_exchanges
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(exchange)
    }

    /// Everything the user participates in, most recent first.
    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<SkillExchange>> {
        let rows = sqlx::query_as::<_, SkillExchange>(
            r#"
            SELECT id, offerer_id, learner_id, skill_id, scheduled_at, duration_minutes,
                   status, meeting_link, notes, created_at, updated_at
            FROM skill_exchanges
            WHERE offerer_id = $1 OR learner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewExchange,
) -> Result<SkillExchange> {
    let exchange = sqlx::query_as::<_, SkillExchange>(
        r#"
        INSERT INTO skill_exchanges
            (offerer_id, learner_id, skill_id, scheduled_at, duration_minutes, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, offerer_id, learner_id, skill_id, scheduled_at, duration_minutes,
                  status, meeting_link, notes, created_at, updated_at
        "#,
    )
    .bind(new.offerer_id)
    .bind(new.learner_id)
    .bind(new.skill_id)
    .bind(new.scheduled_at)
    .bind(new.duration_minutes)
    .bind(new.notes.as_deref())
    .fetch_one(&mut **tx)
    .await?;
    Ok(exchange)
}

/// Load the exchange row and hold a row lock until the transaction ends,
/// so concurrent transitions serialize on the same exchange.
pub(crate) async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<SkillExchange>> {
    let exchange = sqlx::query_as::<_, SkillExchange>(
        r#"
        SELECT id, offerer_id, learner_id, skill_id, scheduled_at, duration_minutes,
               status, meeting_link, notes, created_at, updated_at
        FROM skill_exchanges
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(exchange)
}

pub(crate) async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: ExchangeStatus,
) -> Result<SkillExchange> {
    let exchange = sqlx::query_as::<_, SkillExchange>(
        r#"
        UPDATE skill_exchanges
        SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING id, offerer_id, learner_id, skill_id, scheduled_at, duration_minutes,
                  status, meeting_link, notes, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;
    Ok(exchange)
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_history(
    tx: &mut Transaction<'_, Postgres>,
    exchange_id: Uuid,
    from_status: Option<ExchangeStatus>,
    to_status: ExchangeStatus,
    changed_by: Uuid,
    reason: Option<&str>,
    user_agent: Option<&str>,
) -> Result<ExchangeStatusHistory> {
    let row = sqlx::query_as::<_, ExchangeStatusHistory>(
        r#"
        INSERT INTO exchange_status_history
            (exchange_id, from_status, to_status, changed_by, reason, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, exchange_id, from_status, to_status, changed_by, reason,
                  user_agent, created_at
        "#,
    )
    .bind(exchange_id)
    .bind(from_status)
    .bind(to_status)
    .bind(changed_by)
    .bind(reason)
    .bind(user_agent)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

/// Full audit trail for an exchange, oldest first.
pub(crate) async fn history(db: &PgPool, exchange_id: Uuid) -> Result<Vec<ExchangeStatusHistory>> {
    let rows = sqlx::query_as::<_, ExchangeStatusHistory>(
        r#"
        SELECT id, exchange_id, from_status, to_status, changed_by, reason,
               user_agent, created_at
        FROM exchange_status_history
        WHERE exchange_id = $1
        ORDER BY id
        "#,
    )
    .bind(exchange_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
