//! Role-based access control for handlers.
//!
//! [`ensure`] runs the access policy for the (optional) caller and turns a
//! deny into the matching 401/403 error.

use portal_core::actor::Actor;
use portal_core::policy::{self, Action, Decision, Resource, ResourceKind};

use crate::error::{AppError, AppResult};

/// Run the access policy and convert a deny into an error response.
pub fn ensure(
    actor: Option<&Actor>,
    action: Action,
    kind: ResourceKind,
    resource: Option<&Resource>,
) -> AppResult<()> {
    let decision = policy::authorize(actor, action, kind, resource);
    log_denial(actor, action, kind, decision);
    decision.into_result(action, kind).map_err(AppError::Core)
}

/// Check which work item fields the actor may change.
pub fn ensure_work_item_fields(
    actor: &Actor,
    kind: ResourceKind,
    fields: Vec<&'static str>,
) -> AppResult<()> {
    let decision = policy::authorize_work_item_fields(actor, fields);
    log_denial(Some(actor), Action::Update, kind, decision);
    decision
        .into_result(Action::Update, kind)
        .map_err(AppError::Core)
}

/// Check the account fields an update changes on an existing user.
pub fn ensure_user_fields(
    actor: &Actor,
    target: &Resource,
    fields: Vec<&'static str>,
) -> AppResult<()> {
    let decision = policy::authorize_user_fields(actor, target, fields);
    log_denial(Some(actor), Action::Update, ResourceKind::User, decision);
    decision
        .into_result(Action::Update, ResourceKind::User)
        .map_err(AppError::Core)
}

fn log_denial(actor: Option<&Actor>, action: Action, kind: ResourceKind, decision: Decision) {
    if let Decision::Deny(reason) = decision {
        tracing::warn!(
            user_id = actor.map(|a| a.id),
            action = action.verb(),
            kind = kind.label(),
            %reason,
            "Access denied"
        );
    }
}
