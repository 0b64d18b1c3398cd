/// Authentication and authorization
///
/// - `jwt`: HS256 token creation and validation
/// - `password`: Argon2id hashing and verification
/// - `service`: login, refresh, logout, and password reset flows

pub mod jwt;
pub mod password;
pub mod service;

/// Identity attached to an authenticated request.
///
/// Built by the API layer after validating the bearer token; role checks
/// read the `roles` list carried in the access token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthContext {
    /// True if the user holds any of the given role names.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_has_any_role() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            email: None,
            roles: vec!["Editor".to_string()],
        };

        assert!(ctx.has_any_role(&["SuperAdmin", "Admin", "Editor"]));
        assert!(!ctx.has_any_role(&["SuperAdmin", "Admin"]));
        assert!(!ctx.has_any_role(&[]));
    }
}
