/// Blog posts and categories

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::Status;
use crate::store::{CategoryLink, Document};

/// Lifecycle of a blog post. Drafts never appear on public surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

/// A blog post.
///
/// `published_at` is stamped by the write path the first time status
/// becomes `published` and is never cleared afterwards, so unpublishing
/// and republishing keeps the original publication date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPost {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    pub description: Option<String>,
    pub content_html: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Vec<String>,

    pub category: Option<String>,
    pub category_id: Option<String>,

    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub slug: Option<String>,

    pub status: PostStatus,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Document for BlogPost {
    const COLLECTION: &'static str = "blog_posts";
    const ENTITY: &'static str = "BlogPost";
    const SEARCHABLE: &'static [&'static str] = &["title", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("title");
    const CATEGORY: Option<CategoryLink> = Some(CategoryLink {
        collection: "blog_categories",
    });

    fn prepare(doc: &mut Map<String, Value>) {
        let publishing = doc.get("status").and_then(Value::as_str) == Some("published");
        let unstamped = doc
            .get("publishedAt")
            .map_or(true, Value::is_null);
        if publishing && unstamped {
            doc.insert(
                "publishedAt".to_string(),
                serde_json::json!(chrono::Utc::now()),
            );
        }
    }
}

/// Grouping for blog posts; referenced by name and id from [`BlogPost`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogCategory {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub slug: Option<String>,
    pub description: Option<String>,

    pub color: Option<String>,
    pub order: i32,
    pub status: Status,
}

impl Document for BlogCategory {
    const COLLECTION: &'static str = "blog_categories";
    const ENTITY: &'static str = "BlogCategory";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
    const SLUG_SOURCE: Option<&'static str> = Some("name");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_defaults_to_draft() {
        let post: BlogPost = serde_json::from_str(r#"{"title":"Hello"}"#).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn test_prepare_stamps_published_at_on_publish() {
        let mut doc = serde_json::json!({"title": "Hello", "status": "published"})
            .as_object()
            .cloned()
            .unwrap();
        BlogPost::prepare(&mut doc);
        assert!(doc.get("publishedAt").is_some_and(|v| v.is_string()));
    }

    #[test]
    fn test_prepare_keeps_existing_published_at() {
        let stamp = "2026-01-01T00:00:00Z";
        let mut doc = serde_json::json!({
            "title": "Hello",
            "status": "published",
            "publishedAt": stamp,
        })
        .as_object()
        .cloned()
        .unwrap();
        BlogPost::prepare(&mut doc);
        assert_eq!(doc["publishedAt"], stamp);
    }

    #[test]
    fn test_prepare_leaves_drafts_unstamped() {
        let mut doc = serde_json::json!({"title": "Hello", "status": "draft"})
            .as_object()
            .cloned()
            .unwrap();
        BlogPost::prepare(&mut doc);
        assert!(doc.get("publishedAt").is_none());
    }
}
