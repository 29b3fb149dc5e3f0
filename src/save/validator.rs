//! Save payload validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//! required fields, size, blank content, `timestamp`, `lastSavedAt`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Raw save body. Fields stay untyped so that wrong JSON types are reported
/// as validation failures rather than parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, rename = "lastSavedAt")]
    pub last_saved_at: Option<Value>,
}

/// A save request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSave {
    pub content: String,
    pub password: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: content and password")]
    MissingFields,

    #[error("Content too large: {}MB exceeds {}MB limit", megabytes(.size), megabytes(.max))]
    TooLarge { size: usize, max: usize },

    #[error("Content cannot be empty")]
    EmptyContent,

    #[error("Invalid timestamp format")]
    BadTimestamp,

    #[error("Invalid lastSavedAt format")]
    BadLastSavedAt,
}

fn megabytes(bytes: &usize) -> u64 {
    (*bytes as f64 / (1024.0 * 1024.0)).round() as u64
}

/// Validates save payloads against a maximum content size.
#[derive(Debug, Clone, Copy)]
pub struct ContentValidator {
    max_content_size: usize,
}

impl ContentValidator {
    pub fn new(max_content_size: usize) -> Self {
        Self { max_content_size }
    }

    pub fn max_content_size(&self) -> usize {
        self.max_content_size
    }

    pub fn validate(&self, payload: SaveRequest) -> Result<ValidatedSave, ValidationError> {
        let (content, password) = match (payload.content, payload.password) {
            (Some(Value::String(content)), Some(Value::String(password)))
                if !content.is_empty() && !password.is_empty() =>
            {
                (content, password)
            }
            _ => return Err(ValidationError::MissingFields),
        };

        let size = content.len();
        if size > self.max_content_size {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_content_size,
            });
        }

        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        let timestamp = payload
            .timestamp
            .as_ref()
            .map(|v| parse_datetime(v).ok_or(ValidationError::BadTimestamp))
            .transpose()?;

        let last_saved_at = payload
            .last_saved_at
            .as_ref()
            .map(|v| parse_datetime(v).ok_or(ValidationError::BadLastSavedAt))
            .transpose()?;

        Ok(ValidatedSave {
            content,
            password,
            timestamp,
            last_saved_at,
        })
    }
}

/// Accepts ISO-8601 / RFC 3339 strings only (offset optional, UTC assumed).
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SaveRequest {
        serde_json::from_value(body).unwrap()
    }

    fn validator() -> ContentValidator {
        ContentValidator::new(1024)
    }

    #[test]
    fn test_accepts_well_formed_payload_unchanged() {
        let content = "<html>\n  <body>wiki ✓</body>\n</html>\n";
        let validated = validator()
            .validate(request(json!({
                "content": content,
                "password": "secret",
                "timestamp": "2024-05-01T12:00:00.000Z",
                "lastSavedAt": "2024-05-01T11:59:00Z",
            })))
            .unwrap();

        assert_eq!(validated.content, content);
        assert_eq!(validated.password, "secret");
        assert_eq!(
            validated.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
        assert!(validated.last_saved_at.is_some());
    }

    #[test]
    fn test_missing_or_mistyped_fields() {
        for body in [
            json!({}),
            json!({ "content": "x" }),
            json!({ "password": "x" }),
            json!({ "content": "", "password": "x" }),
            json!({ "content": "x", "password": "" }),
            json!({ "content": 42, "password": "x" }),
            json!({ "content": "x", "password": null }),
        ] {
            assert_eq!(
                validator().validate(request(body.clone())),
                Err(ValidationError::MissingFields),
                "{body}"
            );
        }
    }

    #[test]
    fn test_rejects_oversized_content() {
        let err = ContentValidator::new(3 * 1024 * 1024)
            .validate(request(json!({
                "content": "a".repeat(5 * 1024 * 1024 + 10),
                "password": "x",
            })))
            .unwrap_err();
        assert_eq!(err.to_string(), "Content too large: 5MB exceeds 3MB limit");
    }

    #[test]
    fn test_size_counts_utf8_bytes() {
        // 4 chars, 12 bytes
        let validator = ContentValidator::new(10);
        let err = validator
            .validate(request(json!({ "content": "€€€€", "password": "x" })))
            .unwrap_err();
        assert_eq!(err, ValidationError::TooLarge { size: 12, max: 10 });
    }

    #[test]
    fn test_size_check_precedes_blank_check() {
        let err = ContentValidator::new(2)
            .validate(request(json!({ "content": "     ", "password": "x" })))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[test]
    fn test_rejects_whitespace_only_content() {
        let err = validator()
            .validate(request(json!({ "content": " \n\t ", "password": "x" })))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);
    }

    #[test]
    fn test_rejects_bad_timestamps() {
        let err = validator()
            .validate(request(json!({
                "content": "x",
                "password": "x",
                "timestamp": "yesterday-ish",
            })))
            .unwrap_err();
        assert_eq!(err, ValidationError::BadTimestamp);

        let err = validator()
            .validate(request(json!({
                "content": "x",
                "password": "x",
                "timestamp": "2024-05-01T12:00:00Z",
                "lastSavedAt": true,
            })))
            .unwrap_err();
        assert_eq!(err, ValidationError::BadLastSavedAt);
    }

    #[test]
    fn test_rejects_numeric_timestamps() {
        let err = validator()
            .validate(request(json!({
                "content": "x",
                "password": "x",
                "timestamp": 1_714_564_800_000u64,
                "lastSavedAt": 0,
            })))
            .unwrap_err();
        assert_eq!(err, ValidationError::BadTimestamp);

        let err = validator()
            .validate(request(json!({
                "content": "x",
                "password": "x",
                "lastSavedAt": 0,
            })))
            .unwrap_err();
        assert_eq!(err, ValidationError::BadLastSavedAt);
    }

    #[test]
    fn test_parse_datetime_forms() {
        let expected = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_datetime(&json!("2024-05-01T12:00:00Z")), Some(expected));
        assert_eq!(parse_datetime(&json!("2024-05-01T14:00:00+02:00")), Some(expected));
        assert_eq!(parse_datetime(&json!("2024-05-01T12:00:00")), Some(expected));
        assert!(parse_datetime(&json!(expected.timestamp_millis())).is_none());
        assert!(parse_datetime(&json!("2024-05-01")).is_some());
        assert!(parse_datetime(&json!("2024-13-01T00:00:00Z")).is_none());
        assert!(parse_datetime(&json!(["2024"])).is_none());
    }
}
