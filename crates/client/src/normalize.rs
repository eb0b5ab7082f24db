//! Turning backend error bodies into one readable message

use serde_json::{Map, Value};

/// Pull a human-readable message out of an error response body.
///
/// In order of preference: a per-field error map (one `field: a, b` line per
/// field), an `error` string, a `detail` string, a bare JSON string. Returns
/// `None` when the body offers nothing usable, including non-JSON bodies.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value {
        Value::Object(map) => field_errors(&map)
            .or_else(|| string_field(&map, "error"))
            .or_else(|| string_field(&map, "detail")),
        Value::String(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}

fn field_errors(map: &Map<String, Value>) -> Option<String> {
    if !map.values().any(Value::is_array) {
        return None;
    }

    let lines: Vec<String> = map
        .iter()
        .filter_map(|(field, messages)| match messages {
            Value::Array(items) => {
                let joined = items.iter().map(render).collect::<Vec<_>>().join(", ");
                Some(format!("{field}: {joined}"))
            }
            Value::String(text) => Some(format!("{field}: {text}")),
            _ => None,
        })
        .collect();

    Some(lines.join("\n"))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_map() {
        let body = r#"{
            "email": ["A user with this email already exists."],
            "password1": ["This password is too short.", "This password is too common."]
        }"#;
        assert_eq!(
            extract_message(body).unwrap(),
            "email: A user with this email already exists.\n\
             password1: This password is too short., This password is too common."
        );
    }

    #[test]
    fn test_field_map_includes_string_entries() {
        let body = r#"{"location": ["This field is required."], "non_field": "Passwords differ"}"#;
        assert_eq!(
            extract_message(body).unwrap(),
            "location: This field is required.\nnon_field: Passwords differ"
        );
    }

    #[test]
    fn test_error_field() {
        assert_eq!(
            extract_message(r#"{"error": "Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn test_detail_field() {
        assert_eq!(
            extract_message(r#"{"detail": "Authentication credentials were not provided."}"#)
                .as_deref(),
            Some("Authentication credentials were not provided.")
        );
    }

    #[test]
    fn test_error_preferred_over_detail() {
        assert_eq!(
            extract_message(r#"{"detail": "d", "error": "e"}"#).as_deref(),
            Some("e")
        );
    }

    #[test]
    fn test_bare_string_body() {
        assert_eq!(
            extract_message(r#""Service unavailable""#).as_deref(),
            Some("Service unavailable")
        );
    }

    #[test]
    fn test_unusable_bodies() {
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_message(r#"{"code": 17}"#), None);
        assert_eq!(extract_message(r#"{"error": "  "}"#), None);
        assert_eq!(extract_message("[1, 2]"), None);
    }
}
