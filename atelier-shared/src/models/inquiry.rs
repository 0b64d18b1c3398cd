/// Contact form inquiries

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::store::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryType {
    #[default]
    Contact,
    Quote,
    Hire,
    Newsletter,
    Other,
}

/// An inbound message from the public contact surfaces.
///
/// `resolved` is the triage flag: inquiries start unresolved and editors
/// flip the flag once handled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Inquiry {
    #[serde(rename = "type")]
    pub kind: InquiryType,

    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    pub phone: Option<String>,
    pub message: Option<String>,

    pub resolved: bool,
}

impl Document for Inquiry {
    const COLLECTION: &'static str = "inquiries";
    const ENTITY: &'static str = "Inquiry";
    const SEARCHABLE: &'static [&'static str] = &["name", "email", "message"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_field_round_trips() {
        let inquiry: Inquiry = serde_json::from_str(
            r#"{"type":"quote","name":"Ada","email":"ada@example.com"}"#,
        )
        .unwrap();
        assert_eq!(inquiry.kind, InquiryType::Quote);

        let json = serde_json::to_value(&inquiry).unwrap();
        assert_eq!(json["type"], "quote");
    }

    #[test]
    fn test_new_inquiries_are_unresolved() {
        let inquiry: Inquiry =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert!(!inquiry.resolved);
    }
}
