/// Newsletter subscribers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::Status;
use crate::store::Document;

/// A newsletter subscription. Emails are unique and stored lowercased.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscriber {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    pub status: Status,
}

impl Document for Subscriber {
    const COLLECTION: &'static str = "subscribers";
    const ENTITY: &'static str = "Subscriber";
    const SEARCHABLE: &'static [&'static str] = &["email"];

    fn prepare(doc: &mut Map<String, Value>) {
        if let Some(Value::String(email)) = doc.get("email") {
            let lowered = email.trim().to_lowercase();
            doc.insert("email".to_string(), Value::String(lowered));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_lowercases_email() {
        let mut doc = serde_json::json!({"email": "  Ada@Example.COM "})
            .as_object()
            .cloned()
            .unwrap();
        Subscriber::prepare(&mut doc);
        assert_eq!(doc["email"], "ada@example.com");
    }
}
