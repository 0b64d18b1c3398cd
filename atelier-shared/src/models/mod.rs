/// Domain models
///
/// Content entities are plain serde structs (camelCase JSON) implementing
/// [`crate::store::Document`]; auth state is typed column-per-field.

pub mod activity;
pub mod blog;
pub mod inquiry;
pub mod job;
pub mod page_content;
pub mod partner;
pub mod portfolio;
pub mod pricing;
pub mod refresh_token;
pub mod role;
pub mod seo;
pub mod service;
pub mod subscriber;
pub mod team;
pub mod tech_stack;
pub mod testimonial;
pub mod user;

use serde::{Deserialize, Serialize};

/// Publication status shared by most content entities.
///
/// Public list endpoints filter on `active`; inactive records are only
/// visible to authenticated editors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Active).unwrap(), "\"active\"");
        assert_eq!(
            serde_json::to_string(&Status::Inactive).unwrap(),
            "\"inactive\""
        );
    }

    #[test]
    fn test_status_defaults_to_active() {
        assert_eq!(Status::default(), Status::Active);
    }
}
