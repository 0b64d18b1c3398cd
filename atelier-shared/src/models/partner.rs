/// Partner logos shown on the marketing site

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::Document;

fn default_logo_color() -> Option<String> {
    Some("#005CFF".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Partner {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub logo: Option<String>,
    pub subtitle: Option<String>,
    pub logo_color: Option<String>,
    pub website: Option<String>,

    pub order: i32,
    pub status: Status,
}

impl Default for Partner {
    fn default() -> Self {
        Self {
            name: String::new(),
            logo: None,
            subtitle: None,
            logo_color: default_logo_color(),
            website: None,
            order: 0,
            status: Status::default(),
        }
    }
}

impl Document for Partner {
    const COLLECTION: &'static str = "partners";
    const ENTITY: &'static str = "Partner";
    const SEARCHABLE: &'static [&'static str] = &["name", "subtitle"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_color_default() {
        let partner: Partner = serde_json::from_str(r#"{"name":"Stripe"}"#).unwrap();
        assert_eq!(partner.logo_color.as_deref(), Some("#005CFF"));
    }
}
