use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::exchanges::repo::{self, ExchangeStatusHistory, NewExchange, SkillExchange};
use crate::exchanges::status::{next_status, ActorRole, ExchangeAction, ExchangeStatus};
use crate::skills::repo::Skill;
use crate::state::AppState;
use crate::users::repo::User;

/// Optional context recorded on the history row for a transition.
#[derive(Debug, Default, Clone)]
pub struct ActorContext {
    pub reason: Option<String>,
    pub user_agent: Option<String>,
}

/// Credit amount for a completed exchange: one credit per scheduled hour,
/// rounded half-up to the nearest whole credit, never below one.
pub fn credits_for_duration(duration_minutes: i32) -> i32 {
    ((duration_minutes + 30) / 60).max(1)
}

/// Create a Pending exchange on behalf of the learner, together with the
/// creation history record (`from_status` NULL).
pub async fn create_exchange(state: &AppState, new: NewExchange) -> Result<SkillExchange> {
    if new.learner_id == new.offerer_id {
        return Err(CoreError::InvalidArgument(
            "cannot create an exchange with yourself".into(),
        ));
    }
    if new.duration_minutes <= 0 {
        return Err(CoreError::InvalidArgument(
            "duration must be positive".into(),
        ));
    }
    if User::find(&state.db, new.learner_id).await?.is_none()
        || User::find(&state.db, new.offerer_id).await?.is_none()
    {
        return Err(CoreError::NotFound("one or both users".into()));
    }
    if Skill::find(&state.db, new.skill_id).await?.is_none() {
        return Err(CoreError::NotFound(format!("skill {}", new.skill_id)));
    }

    let mut tx = state.db.begin().await?;
    let exchange = repo::insert(&mut tx, &new).await?;
    repo::insert_history(
        &mut tx,
        exchange.id,
        None,
        ExchangeStatus::Pending,
        new.learner_id,
        Some("exchange created"),
        None,
    )
    .await?;
    tx.commit().await?;

    info!(exchange_id = %exchange.id, learner = %new.learner_id, offerer = %new.offerer_id,
          "exchange created");
    notify_status(state, new.offerer_id, exchange.id, ExchangeStatus::Pending).await;
    Ok(exchange)
}

pub async fn accept_exchange(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    apply_transition(state, exchange_id, acting_user, ExchangeAction::Accept, ctx).await
}

pub async fn reject_exchange(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    apply_transition(state, exchange_id, acting_user, ExchangeAction::Reject, ctx).await
}

pub async fn cancel_exchange(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    apply_transition(state, exchange_id, acting_user, ExchangeAction::Cancel, ctx).await
}

/// Complete an Accepted exchange. The status change, its history record,
/// and the learner→offerer credit transfer commit in one transaction;
/// if the transfer fails nothing is applied.
pub async fn complete_exchange(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    apply_transition(state, exchange_id, acting_user, ExchangeAction::Complete, ctx).await
}

pub async fn mark_no_show(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    apply_transition(state, exchange_id, acting_user, ExchangeAction::MarkNoShow, ctx).await
}

async fn apply_transition(
    state: &AppState,
    exchange_id: Uuid,
    acting_user: Uuid,
    action: ExchangeAction,
    ctx: ActorContext,
) -> Result<SkillExchange> {
    let mut tx = state.db.begin().await?;
    let exchange = repo::find_for_update(&mut tx, exchange_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("exchange {exchange_id}")))?;

    let role = if acting_user == exchange.offerer_id {
        ActorRole::Offerer
    } else if acting_user == exchange.learner_id {
        ActorRole::Learner
    } else {
        return Err(CoreError::Unauthorized(
            "only exchange participants may act on it".into(),
        ));
    };
    let next = next_status(exchange.status, action, role)?;

    let amount = credits_for_duration(exchange.duration_minutes);
    let reason = if action == ExchangeAction::Complete {
        Some(format!("completed; {amount} credits transferred to offerer"))
    } else {
        ctx.reason
    };

    let updated = repo::set_status(&mut tx, exchange_id, next).await?;
    repo::insert_history(
        &mut tx,
        exchange_id,
        Some(exchange.status),
        next,
        acting_user,
        reason.as_deref(),
        ctx.user_agent.as_deref(),
    )
    .await?;

    if action == ExchangeAction::Complete {
        crate::credits::services::transfer_in_tx(
            &mut tx,
            exchange.learner_id,
            exchange.offerer_id,
            amount,
            "exchange completion",
            Some(exchange_id),
        )
        .await?;
    }

    tx.commit().await?;
    info!(%exchange_id, from = %exchange.status, to = %next, changed_by = %acting_user,
          "exchange transition");

    let counterparty = if acting_user == exchange.offerer_id {
        exchange.learner_id
    } else {
        exchange.offerer_id
    };
    notify_status(state, counterparty, exchange_id, next).await;
    Ok(updated)
}

pub async fn get_exchange(state: &AppState, exchange_id: Uuid) -> Result<SkillExchange> {
    SkillExchange::find(&state.db, exchange_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("exchange {exchange_id}")))
}

pub async fn list_user_exchanges(state: &AppState, user_id: Uuid) -> Result<Vec<SkillExchange>> {
    SkillExchange::list_for_user(&state.db, user_id).await
}

/// The full audit trail, oldest first.
pub async fn get_exchange_status_history(
    state: &AppState,
    exchange_id: Uuid,
) -> Result<Vec<ExchangeStatusHistory>> {
    if SkillExchange::find(&state.db, exchange_id).await?.is_none() {
        return Err(CoreError::NotFound(format!("exchange {exchange_id}")));
    }
    repo::history(&state.db, exchange_id).await
}

async fn notify_status(state: &AppState, user_id: Uuid, exchange_id: Uuid, status: ExchangeStatus) {
    if let Err(e) = state
        .notifier
        .exchange_status_changed(user_id, exchange_id, status)
        .await
    {
        warn!(error = %e, %user_id, %exchange_id, "exchange notification dispatch failed");
    }
}
