use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exchange_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Completed,
    Rejected,
    Cancelled,
    NoShow,
}

impl ExchangeStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExchangeStatus::Pending | ExchangeStatus::Accepted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Rejected => "rejected",
            ExchangeStatus::Cancelled => "cancelled",
            ExchangeStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeAction {
    Accept,
    Reject,
    Cancel,
    Complete,
    MarkNoShow,
}

impl ExchangeAction {
    pub fn target(self) -> ExchangeStatus {
        match self {
            ExchangeAction::Accept => ExchangeStatus::Accepted,
            ExchangeAction::Reject => ExchangeStatus::Rejected,
            ExchangeAction::Cancel => ExchangeStatus::Cancelled,
            ExchangeAction::Complete => ExchangeStatus::Completed,
            ExchangeAction::MarkNoShow => ExchangeStatus::NoShow,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ExchangeAction::Accept => "accept",
            ExchangeAction::Reject => "reject",
            ExchangeAction::Cancel => "cancel",
            ExchangeAction::Complete => "complete",
            ExchangeAction::MarkNoShow => "mark as no-show",
        }
    }
}

/// Which side of the exchange the acting user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Offerer,
    Learner,
}

struct Rule {
    from: ExchangeStatus,
    action: ExchangeAction,
    roles: &'static [ActorRole],
    to: ExchangeStatus,
}

const OFFERER_ONLY: &[ActorRole] = &[ActorRole::Offerer];
const EITHER_PARTY: &[ActorRole] = &[ActorRole::Offerer, ActorRole::Learner];

/// The complete set of legal transitions. Anything not listed here is
/// rejected before any mutation happens.
const TRANSITIONS: &[Rule] = &[
    Rule {
        from: ExchangeStatus::Pending,
        action: ExchangeAction::Accept,
        roles: OFFERER_ONLY,
        to: ExchangeStatus::Accepted,
    },
    Rule {
        from: ExchangeStatus::Pending,
        action: ExchangeAction::Reject,
        roles: OFFERER_ONLY,
        to: ExchangeStatus::Rejected,
    },
    Rule {
        from: ExchangeStatus::Pending,
        action: ExchangeAction::Cancel,
        roles: EITHER_PARTY,
        to: ExchangeStatus::Cancelled,
    },
    Rule {
        from: ExchangeStatus::Accepted,
        action: ExchangeAction::Cancel,
        roles: EITHER_PARTY,
        to: ExchangeStatus::Cancelled,
    },
    Rule {
        from: ExchangeStatus::Accepted,
        action: ExchangeAction::Complete,
        roles: OFFERER_ONLY,
        to: ExchangeStatus::Completed,
    },
    Rule {
        from: ExchangeStatus::Accepted,
        action: ExchangeAction::MarkNoShow,
        roles: EITHER_PARTY,
        to: ExchangeStatus::NoShow,
    },
];

/// Resolve the next status for `(current, action, role)`, or say why not.
/// An illegal move from the current state and an attempt by the wrong
/// party are distinct failures.
pub fn next_status(
    current: ExchangeStatus,
    action: ExchangeAction,
    role: ActorRole,
) -> Result<ExchangeStatus> {
    let rule = TRANSITIONS
        .iter()
        .find(|r| r.from == current && r.action == action);
    match rule {
        None => Err(CoreError::InvalidOperation(format!(
            "cannot transition from {current} to {}",
            action.target()
        ))),
        Some(rule) if !rule.roles.contains(&role) => Err(CoreError::Unauthorized(format!(
            "only the offerer may {} this exchange",
            action.verb()
        ))),
        Some(rule) => Ok(rule.to),
    }
}
