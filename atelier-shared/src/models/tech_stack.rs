/// Technology stack entries

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechCategory {
    Frontend,
    Backend,
    Database,
    Cloud,
    Mobile,
    DevOps,
    #[default]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TechStackItem {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub icon: Option<String>,
    pub category: TechCategory,
    pub description: Option<String>,

    pub order: i32,
    pub status: Status,
}

impl Document for TechStackItem {
    const COLLECTION: &'static str = "tech_stack";
    const ENTITY: &'static str = "TechStack";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_variants_round_trip_as_written() {
        let item: TechStackItem =
            serde_json::from_str(r#"{"name":"PostgreSQL","category":"Database"}"#).unwrap();
        assert_eq!(item.category, TechCategory::Database);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["category"], "Database");
    }

    #[test]
    fn test_category_defaults_to_other() {
        let item: TechStackItem = serde_json::from_str(r#"{"name":"Figma"}"#).unwrap();
        assert_eq!(item.category, TechCategory::Other);
    }
}
