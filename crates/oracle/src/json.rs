use crate::error::{OracleError, Result};
use crate::JsonObject;
use serde_json::Value;

const PREVIEW_CHARS: usize = 200;

/// Parses model output as a JSON object.
///
/// Models often wrap JSON in prose or code fences; when the whole text does
/// not parse, the span from the first `{` to the last `}` is tried instead.
pub fn parse_json_object(content: &str) -> Result<JsonObject> {
    let value = match serde_json::from_str::<Value>(content.trim()) {
        Ok(value) => value,
        Err(_) => extract_braced(content)
            .and_then(|fragment| serde_json::from_str::<Value>(fragment).ok())
            .ok_or_else(|| OracleError::InvalidJson(preview(content)))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(OracleError::InvalidJson(format!(
            "expected a JSON object, got {}",
            kind_name(&other)
        ))),
    }
}

fn extract_braced(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let obj = parse_json_object(r#"{"best_new_url": "/a", "confidence": 0.5}"#).unwrap();
        assert_eq!(obj["best_new_url"], "/a");
    }

    #[test]
    fn repairs_fenced_or_chatty_output() {
        let content = "Sure! Here is the match:\n```json\n{\"best_new_url\": \"/shop\", \"confidence\": 0.7}\n```\nGood luck.";
        let obj = parse_json_object(content).unwrap();
        assert_eq!(obj["best_new_url"], "/shop");
    }

    #[test]
    fn rejects_unrecoverable_text() {
        let err = parse_json_object("no json here").unwrap_err();
        assert!(matches!(err, OracleError::InvalidJson(ref msg) if msg == "no json here"));

        assert!(parse_json_object("} backwards {").is_err());
        assert!(parse_json_object("{ broken: ").is_err());
    }

    #[test]
    fn rejects_non_object_json() {
        let err = parse_json_object("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"), "{err}");
    }

    #[test]
    fn preview_is_bounded() {
        let long = "x".repeat(1000);
        match parse_json_object(&long).unwrap_err() {
            OracleError::InvalidJson(msg) => assert_eq!(msg.chars().count(), PREVIEW_CHARS),
            other => panic!("unexpected error: {other}"),
        }
    }
}
