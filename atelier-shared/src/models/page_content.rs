/// Per-page editable content blocks

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::store::Document;

/// One keyed content block inside a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSection {
    pub key: String,

    /// Free-form content; shape is owned by the frontend
    pub content: Value,
}

/// The editable content of one site page, identified by its unique
/// `page` key (e.g. "home", "about").
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContent {
    #[validate(length(min = 1, message = "page is required"))]
    pub page: String,

    pub sections: Vec<PageSection>,
}

impl Document for PageContent {
    const COLLECTION: &'static str = "page_contents";
    const ENTITY: &'static str = "PageContent";
    const SEARCHABLE: &'static [&'static str] = &["page"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_carry_arbitrary_content() {
        let page: PageContent = serde_json::from_str(
            r#"{"page":"home","sections":[{"key":"hero","content":{"headline":"Hi","ctas":[1,2]}}]}"#,
        )
        .unwrap();
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].content["headline"], "Hi");
    }
}
