//! Account roles.
//!
//! The role decides what an actor may see and change across every resource
//! kind. It is a closed set: adding a variant forces every `match` in
//! [`crate::policy`] to be revisited.

define_name_enum! {
    /// Role carried by every user account.
    Role("role") {
        SuperAdmin = "superadmin",
        Admin = "admin",
        Employee = "employee",
        User = "user",
    }
}

impl Role {
    /// Superadmins and admins have full read/write access.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Roles that may be placed on a project's employee roster.
    pub fn can_join_projects(self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_name(role.name()).unwrap(), *role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = Role::from_name("root").unwrap_err();
        assert!(err.to_string().contains("Invalid role 'root'"));
    }

    #[test]
    fn test_privileged_roles() {
        assert!(Role::SuperAdmin.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(!Role::Employee.is_privileged());
        assert!(!Role::User.is_privileged());
    }

    #[test]
    fn test_project_roster_roles() {
        assert!(Role::Employee.can_join_projects());
        assert!(Role::Admin.can_join_projects());
        assert!(!Role::User.can_join_projects());
        assert!(!Role::SuperAdmin.can_join_projects());
    }

    #[test]
    fn test_serde_uses_stored_names() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"superadmin\"");
        let parsed: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(parsed, Role::Employee);
    }

    #[test]
    fn test_default_is_public_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
