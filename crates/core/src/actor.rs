//! Request-scoped identity.

use crate::roles::Role;
use crate::types::DbId;

/// The authenticated identity making a request.
///
/// Built fresh for every request from the bearer token and the stored user
/// row, then passed explicitly into every policy, query and mutation call.
/// An unauthenticated caller is represented as `Option<&Actor>::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
    pub department: Option<String>,
}

impl Actor {
    pub fn new(id: DbId, role: Role) -> Self {
        Self {
            id,
            role,
            department: None,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}
