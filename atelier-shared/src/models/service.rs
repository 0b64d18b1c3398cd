/// Service offerings and their categories

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::{CategoryLink, Document};

/// A service the studio offers.
///
/// The slug is derived from `name` on every write; `category` and
/// `categoryId` are a denormalized pair resolved against
/// [`ServiceCategory`] records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub icon: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,

    pub category: Option<String>,
    pub category_id: Option<String>,

    pub seo_meta_title: Option<String>,
    pub seo_meta_description: Option<String>,
    pub slug: Option<String>,

    pub status: Status,
    pub order: i32,
}

impl Document for Service {
    const COLLECTION: &'static str = "services";
    const ENTITY: &'static str = "Service";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("name");
    const CATEGORY: Option<CategoryLink> = Some(CategoryLink {
        collection: "service_categories",
    });
}

/// Grouping for services; referenced by name and id from [`Service`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceCategory {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub slug: Option<String>,
    pub description: Option<String>,

    pub color: Option<String>,
    pub order: i32,
    pub status: Status,
}

impl Document for ServiceCategory {
    const COLLECTION: &'static str = "service_categories";
    const ENTITY: &'static str = "ServiceCategory";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("name");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_rejects_empty_name() {
        let service = Service::default();
        assert!(service.validate().is_err());

        let service = Service {
            name: "Web Development".to_string(),
            ..Default::default()
        };
        assert!(service.validate().is_ok());
    }

    #[test]
    fn test_service_json_shape_is_camel_case() {
        let service = Service {
            name: "Web Development".to_string(),
            category_id: Some("abc".to_string()),
            seo_meta_title: Some("Web Dev".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&service).unwrap();
        assert!(json.get("categoryId").is_some());
        assert!(json.get("seoMetaTitle").is_some());
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_service_deserializes_with_missing_fields() {
        let service: Service = serde_json::from_str(r#"{"name":"SEO"}"#).unwrap();
        assert_eq!(service.name, "SEO");
        assert_eq!(service.status, Status::Active);
        assert_eq!(service.order, 0);
        assert!(service.features.is_empty());
    }
}
