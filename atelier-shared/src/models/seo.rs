/// Site-wide SEO settings

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::store::Document;

/// Global SEO defaults. The most recently updated record is the one in
/// effect; robots.txt is served from `robots_txt` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoSettings {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub robots_txt: Option<String>,
}

impl Document for SeoSettings {
    const COLLECTION: &'static str = "seo_settings";
    const ENTITY: &'static str = "SEOSettings";
}
