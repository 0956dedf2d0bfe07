//! Access-control policy.
//!
//! Two separate contracts:
//!
//! - [`authorize`] answers "may this actor perform this action on this kind
//!   (or on this concrete record)?" and produces an error outcome on deny.
//! - [`scope_filter`] produces the predicate that silently narrows list and
//!   stats queries to what the actor may see.
//!
//! Both match exhaustively on [`Role`], so a new role cannot slip through
//! without a decision.

use crate::actor::Actor;
use crate::announcement;
use crate::error::CoreError;
use crate::query::Predicate;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Kinds and actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Task,
    Assignment,
    Project,
    Document,
    Announcement,
}

impl ResourceKind {
    /// Entity name used in not-found errors.
    pub fn entity_name(self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::Task => "Task",
            ResourceKind::Assignment => "Assignment",
            ResourceKind::Project => "Project",
            ResourceKind::Document => "Document",
            ResourceKind::Announcement => "Announcement",
        }
    }

    /// Lowercase label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Task => "task",
            ResourceKind::Assignment => "assignment",
            ResourceKind::Project => "project",
            ResourceKind::Document => "document",
            ResourceKind::Announcement => "announcement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
    Stats,
    Comment,
    Download,
}

impl Action {
    pub fn verb(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Stats => "view stats for",
            Action::Comment => "comment on",
            Action::Download => "download",
        }
    }
}

/// The ownership-relevant facts of a concrete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    User {
        role: Role,
    },
    WorkItem {
        assigned_to: DbId,
        assigned_by: DbId,
    },
    Project {
        created_by: DbId,
    },
    Document {
        uploaded_by: DbId,
        is_public: bool,
    },
    Announcement {
        created_by: DbId,
        /// Whether the announcement is currently visible at evaluation time.
        visible: bool,
    },
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    InsufficientRole,
    NotOwner,
    ProtectedAccount,
    NotPublic,
    NotPublished,
    FieldNotEditable(&'static str),
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::NotAuthenticated => f.write_str("authentication required"),
            DenyReason::InsufficientRole => f.write_str("insufficient role"),
            DenyReason::NotOwner => f.write_str("not owner"),
            DenyReason::ProtectedAccount => f.write_str("protected account"),
            DenyReason::NotPublic => f.write_str("document is not public"),
            DenyReason::NotPublished => f.write_str("announcement is not published"),
            DenyReason::FieldNotEditable(field) => write!(f, "field '{field}' is not editable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Turn the decision into a result: 401 for unauthenticated callers,
    /// 403 for everything else.
    pub fn into_result(self, action: Action, kind: ResourceKind) -> Result<(), CoreError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NotAuthenticated) => Err(CoreError::Unauthorized(
                "Authentication required".to_string(),
            )),
            Decision::Deny(reason) => Err(CoreError::Forbidden(format!(
                "Not authorized to {} this {}: {reason}",
                action.verb(),
                kind.label()
            ))),
        }
    }
}

fn allow_if(condition: bool, reason: DenyReason) -> Decision {
    if condition {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

// ---------------------------------------------------------------------------
// authorize
// ---------------------------------------------------------------------------

/// Decide whether `actor` may perform `action` on `kind`.
///
/// With `resource == None` the kind-level permission is returned; passing
/// the concrete record additionally applies ownership and visibility rules.
pub fn authorize(
    actor: Option<&Actor>,
    action: Action,
    kind: ResourceKind,
    resource: Option<&Resource>,
) -> Decision {
    let Some(actor) = actor else {
        return authorize_anonymous(action, kind, resource);
    };

    match actor.role {
        Role::SuperAdmin | Role::Admin => authorize_privileged(action, resource),
        Role::Employee => match kind {
            ResourceKind::Task | ResourceKind::Assignment => {
                authorize_employee_work_item(actor, action, resource)
            }
            ResourceKind::Project | ResourceKind::User => {
                Decision::Deny(DenyReason::InsufficientRole)
            }
            ResourceKind::Document | ResourceKind::Announcement => {
                authorize_reader(actor, action, kind, resource)
            }
        },
        Role::User => authorize_reader(actor, action, kind, resource),
    }
}

fn authorize_privileged(action: Action, resource: Option<&Resource>) -> Decision {
    match (action, resource) {
        (
            Action::Delete,
            Some(Resource::User {
                role: Role::SuperAdmin,
            }),
        ) => Decision::Deny(DenyReason::ProtectedAccount),
        _ => Decision::Allow,
    }
}

fn authorize_employee_work_item(
    actor: &Actor,
    action: Action,
    resource: Option<&Resource>,
) -> Decision {
    match action {
        Action::List => Decision::Allow,
        Action::Read | Action::Update | Action::Comment => match resource {
            None => Decision::Allow,
            Some(Resource::WorkItem { assigned_to, .. }) => {
                allow_if(*assigned_to == actor.id, DenyReason::NotOwner)
            }
            Some(_) => Decision::Deny(DenyReason::NotOwner),
        },
        Action::Create | Action::Delete | Action::Stats | Action::Download => {
            Decision::Deny(DenyReason::InsufficientRole)
        }
    }
}

/// Read-only access shared by public users and employees outside their
/// work items.
fn authorize_reader(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
    resource: Option<&Resource>,
) -> Decision {
    match (kind, action) {
        (ResourceKind::Document, Action::List) => Decision::Allow,
        (ResourceKind::Document, Action::Read | Action::Download) => match resource {
            None => Decision::Allow,
            Some(Resource::Document {
                uploaded_by,
                is_public,
            }) => allow_if(*is_public || *uploaded_by == actor.id, DenyReason::NotPublic),
            Some(_) => Decision::Deny(DenyReason::NotPublic),
        },
        (ResourceKind::Announcement, Action::List | Action::Read) => {
            announcement_visibility(resource)
        }
        _ => Decision::Deny(DenyReason::InsufficientRole),
    }
}

fn authorize_anonymous(
    action: Action,
    kind: ResourceKind,
    resource: Option<&Resource>,
) -> Decision {
    match (kind, action) {
        (ResourceKind::Announcement, Action::List | Action::Read) => {
            announcement_visibility(resource)
        }
        _ => Decision::Deny(DenyReason::NotAuthenticated),
    }
}

fn announcement_visibility(resource: Option<&Resource>) -> Decision {
    match resource {
        None => Decision::Allow,
        Some(Resource::Announcement { visible, .. }) => {
            allow_if(*visible, DenyReason::NotPublished)
        }
        Some(_) => Decision::Deny(DenyReason::NotPublished),
    }
}

// ---------------------------------------------------------------------------
// Field-level rules
// ---------------------------------------------------------------------------

/// Work item fields an employee may change on their own items (wire names).
pub const EMPLOYEE_EDITABLE_FIELDS: &[&str] = &["status", "priority", "dueDate", "description"];

/// Check every field an update touches against the actor's field rights.
///
/// Privileged roles may change any field; employees only those in
/// [`EMPLOYEE_EDITABLE_FIELDS`]. Other roles never reach a work item update.
pub fn authorize_work_item_fields(
    actor: &Actor,
    fields: impl IntoIterator<Item = &'static str>,
) -> Decision {
    match actor.role {
        Role::SuperAdmin | Role::Admin => Decision::Allow,
        Role::Employee => fields
            .into_iter()
            .find(|field| !EMPLOYEE_EDITABLE_FIELDS.contains(field))
            .map_or(Decision::Allow, |field| {
                Decision::Deny(DenyReason::FieldNotEditable(field))
            }),
        Role::User => Decision::Deny(DenyReason::InsufficientRole),
    }
}

/// Account fields only a superadmin may change on another superadmin.
pub const PROTECTED_ACCOUNT_FIELDS: &[&str] = &["role", "isActive"];

/// Check the account fields an update actually changes on `target`.
///
/// Demoting or deactivating a superadmin would bypass the delete protection,
/// so those fields are reserved to superadmins.
pub fn authorize_user_fields(
    actor: &Actor,
    target: &Resource,
    fields: impl IntoIterator<Item = &'static str>,
) -> Decision {
    let protected = matches!(
        target,
        Resource::User {
            role: Role::SuperAdmin
        }
    );
    if !protected || actor.role == Role::SuperAdmin {
        return Decision::Allow;
    }
    if fields
        .into_iter()
        .any(|field| PROTECTED_ACCOUNT_FIELDS.contains(&field))
    {
        Decision::Deny(DenyReason::ProtectedAccount)
    } else {
        Decision::Allow
    }
}

// ---------------------------------------------------------------------------
// Scope filters
// ---------------------------------------------------------------------------

/// Predicate restricting list and stats queries of `kind` to what `actor`
/// may see at `now`.
pub fn scope_filter(actor: Option<&Actor>, kind: ResourceKind, now: Timestamp) -> Predicate {
    let Some(actor) = actor else {
        return match kind {
            ResourceKind::Announcement => announcement::visible_predicate(now),
            _ => Predicate::False,
        };
    };

    match actor.role {
        Role::SuperAdmin | Role::Admin => Predicate::True,
        Role::Employee | Role::User => match kind {
            ResourceKind::Task | ResourceKind::Assignment => {
                if actor.role == Role::Employee {
                    Predicate::eq("assigned_to", actor.id)
                } else {
                    Predicate::False
                }
            }
            ResourceKind::Document => Predicate::or([
                Predicate::eq("is_public", true),
                Predicate::eq("uploaded_by", actor.id),
            ]),
            ResourceKind::Announcement => announcement::visible_predicate(now),
            ResourceKind::Project | ResourceKind::User => Predicate::False,
        },
    }
}
