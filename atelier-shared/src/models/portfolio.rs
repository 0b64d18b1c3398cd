/// Portfolio case studies and categories

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::{CategoryLink, Document};

/// A client project case study.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioProject {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub category: Option<String>,
    pub category_id: Option<String>,

    pub client_name: Option<String>,
    pub timeline: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Vec<String>,
    pub screenshots: Vec<String>,

    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub slug: Option<String>,

    pub status: Status,
    pub featured: bool,
}

impl Document for PortfolioProject {
    const COLLECTION: &'static str = "portfolio_projects";
    const ENTITY: &'static str = "PortfolioProject";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("name");
    const CATEGORY: Option<CategoryLink> = Some(CategoryLink {
        collection: "portfolio_categories",
    });
}

/// Grouping for portfolio projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioCategory {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub slug: Option<String>,
    pub description: Option<String>,

    pub color: Option<String>,
    pub order: i32,
    pub status: Status,
}

impl Document for PortfolioCategory {
    const COLLECTION: &'static str = "portfolio_categories";
    const ENTITY: &'static str = "PortfolioCategory";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("name");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_defaults() {
        let project: PortfolioProject =
            serde_json::from_str(r#"{"name":"Acme Rebrand"}"#).unwrap();
        assert!(!project.featured);
        assert_eq!(project.status, Status::Active);
        assert!(project.screenshots.is_empty());
    }

    #[test]
    fn test_project_requires_name() {
        assert!(PortfolioProject::default().validate().is_err());
    }
}
