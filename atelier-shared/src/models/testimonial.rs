/// Client testimonials

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::Document;

/// Kind of work the testimonial refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestimonialCategory {
    App,
    #[default]
    Web,
    AI,
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    #[validate(length(min = 1, message = "clientName is required"))]
    pub client_name: String,

    #[validate(length(min = 1, message = "review is required"))]
    pub review: String,

    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,

    pub picture: Option<String>,
    pub category: TestimonialCategory,
    pub status: Status,
    pub featured: bool,
}

impl Document for Testimonial {
    const COLLECTION: &'static str = "testimonials";
    const ENTITY: &'static str = "Testimonial";
    const SEARCHABLE: &'static [&'static str] = &["clientName", "review"];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Testimonial {
        Testimonial {
            client_name: "Jordan Miles".to_string(),
            review: "Delivered ahead of schedule.".to_string(),
            rating: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(valid().validate().is_ok());

        let mut t = valid();
        t.rating = 0;
        assert!(t.validate().is_err());

        t.rating = 6;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_category_defaults_to_web() {
        let t: Testimonial =
            serde_json::from_str(r#"{"clientName":"A","review":"B","rating":4}"#).unwrap();
        assert_eq!(t.category, TestimonialCategory::Web);
    }
}
