/// Team member profiles

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::Document;

/// Social profile links shown on a team member card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMember {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,

    pub image: Option<String>,
    pub social: SocialLinks,
    pub description: Option<String>,

    pub status: Status,
    pub order: i32,
}

impl Document for TeamMember {
    const COLLECTION: &'static str = "team_members";
    const ENTITY: &'static str = "TeamMember";
    const SEARCHABLE: &'static [&'static str] = &["name", "role"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_name_and_role() {
        let member = TeamMember {
            name: "Priya Shah".to_string(),
            ..Default::default()
        };
        assert!(member.validate().is_err());

        let member = TeamMember {
            name: "Priya Shah".to_string(),
            role: "Lead Designer".to_string(),
            ..Default::default()
        };
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_social_links_optional() {
        let member: TeamMember =
            serde_json::from_str(r#"{"name":"A","role":"B"}"#).unwrap();
        assert!(member.social.linkedin.is_none());
    }
}
