/// Minimal CSV writer for the admin exports
///
/// Inquiries and subscribers are exported as CSV downloads. The format
/// is simple enough that a serializer dependency isn't warranted: fields
/// containing commas, quotes, or newlines are quoted and embedded quotes
/// doubled, per RFC 4180.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// Escapes one field for CSV output.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders one CSV row with a trailing newline.
pub fn row(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Renders a full document: header row followed by data rows.
pub fn document(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = row(header);
    for data_row in rows {
        let fields: Vec<&str> = data_row.iter().map(String::as_str).collect();
        out.push_str(&row(&fields));
    }
    out
}

/// Extracts one document field as display text for a CSV cell.
pub fn field(doc: &Value, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Wraps a rendered CSV document as a file download response.
pub fn attachment(filename: &str, body: String) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields_unquoted() {
        assert_eq!(row(&["a", "b", "c"]), "a,b,c\n");
    }

    #[test]
    fn test_comma_and_quote_escaping() {
        assert_eq!(row(&["hello, world"]), "\"hello, world\"\n");
        assert_eq!(row(&["say \"hi\""]), "\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_newlines_are_quoted() {
        assert_eq!(row(&["line1\nline2"]), "\"line1\nline2\"\n");
    }

    #[test]
    fn test_document_layout() {
        let out = document(
            &["name", "email"],
            &[vec!["Ada".to_string(), "ada@example.com".to_string()]],
        );
        assert_eq!(out, "name,email\nAda,ada@example.com\n");
    }

    #[test]
    fn test_field_renders_scalars_and_skips_the_rest() {
        let doc = serde_json::json!({
            "name": "Ada",
            "resolved": false,
            "rating": 5,
            "tags": ["a", "b"],
        });
        assert_eq!(field(&doc, "name"), "Ada");
        assert_eq!(field(&doc, "resolved"), "false");
        assert_eq!(field(&doc, "rating"), "5");
        assert_eq!(field(&doc, "tags"), "");
        assert_eq!(field(&doc, "missing"), "");
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment("inquiries.csv", "a,b\n".to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"inquiries.csv\""
        );
    }
}
