/// Role model and the fixed role hierarchy
///
/// Three roles exist: SuperAdmin, Admin, and Editor. All three may write
/// content; only Admin and SuperAdmin may delete. The base roles are
/// upserted at startup so a fresh database is immediately usable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// The built-in role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    SuperAdmin,
    Admin,
    Editor,
}

impl RoleName {
    pub const ALL: [RoleName; 3] = [RoleName::SuperAdmin, RoleName::Admin, RoleName::Editor];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "SuperAdmin",
            RoleName::Admin => "Admin",
            RoleName::Editor => "Editor",
        }
    }

    /// Parses a role name; unknown names are rejected rather than
    /// defaulted.
    pub fn parse(name: &str) -> Option<Self> {
        RoleName::ALL.into_iter().find(|role| role.as_str() == name)
    }

    /// Permission strings seeded for this role.
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            RoleName::SuperAdmin => &["content:read", "content:write", "content:delete", "users:manage"],
            RoleName::Admin => &["content:read", "content:write", "content:delete"],
            RoleName::Editor => &["content:read", "content:write"],
        }
    }
}

/// Roles allowed to create and update content.
pub const WRITE_ROLES: &[&str] = &["SuperAdmin", "Admin", "Editor"];

/// Roles allowed to delete content.
pub const DELETE_ROLES: &[&str] = &["SuperAdmin", "Admin"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Finds a role by name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, created_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Upserts the three base roles. Safe to run on every startup;
    /// permission lists are refreshed in place.
    pub async fn ensure_base_roles(pool: &PgPool) -> Result<(), sqlx::Error> {
        for role in RoleName::ALL {
            let permissions: Vec<String> =
                role.permissions().iter().map(|p| p.to_string()).collect();
            sqlx::query(
                "INSERT INTO roles (name, permissions) VALUES ($1, $2) \
                 ON CONFLICT (name) DO UPDATE SET permissions = EXCLUDED.permissions",
            )
            .bind(role.as_str())
            .bind(&permissions)
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        for name in WRITE_ROLES {
            assert!(RoleName::ALL.iter().any(|r| r.as_str() == *name));
        }
        assert!(DELETE_ROLES.contains(&"Admin"));
        assert!(DELETE_ROLES.contains(&"SuperAdmin"));
        assert!(!DELETE_ROLES.contains(&"Editor"));
    }

    #[test]
    fn test_parse_role_names() {
        assert_eq!(RoleName::parse("Admin"), Some(RoleName::Admin));
        assert_eq!(RoleName::parse("SuperAdmin"), Some(RoleName::SuperAdmin));
        assert_eq!(RoleName::parse("admin"), None);
        assert_eq!(RoleName::parse("Intruder"), None);
    }

    #[test]
    fn test_editor_cannot_delete() {
        assert!(!RoleName::Editor.permissions().contains(&"content:delete"));
        assert!(RoleName::Editor.permissions().contains(&"content:write"));
    }
}
