use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Closed set of value shapes admitted into record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    Str(String),
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<OffsetDateTime> for MetaValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// The normalized result every retrieval strategy returns. Exactly one of
/// the success shape (content present, no error) or the failure shape
/// (error present, no content) holds; the constructors keep it that way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub success: bool,
    pub error_message: String,
    /// Which strategy produced this record.
    pub source_method: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ContentRecord {
    #[must_use]
    pub fn ok(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        content_type: impl Into<String>,
        source_method: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            content_type: content_type.into(),
            success: true,
            error_message: String::new(),
            source_method: source_method.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn failed(
        url: impl Into<String>,
        error_message: impl Into<String>,
        source_method: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            content: String::new(),
            content_type: String::new(),
            success: false,
            error_message: error_message.into(),
            source_method: source_method.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn ok_records_carry_no_error() {
        let record = ContentRecord::ok(
            "https://example.com",
            "Example",
            "body text",
            "html",
            "scrape_attempt_1",
        );
        assert!(record.success);
        assert!(record.error_message.is_empty());
        assert_eq!(record.content, "body text");
    }

    #[test]
    fn failed_records_carry_no_content() {
        let record = ContentRecord::failed("https://example.com", "it broke", "scrape_failed");
        assert!(!record.success);
        assert!(record.content.is_empty());
        assert_eq!(record.error_message, "it broke");
    }

    #[test]
    fn metadata_builder_accumulates() {
        let record = ContentRecord::ok("u", "t", "c", "html", "m")
            .with_meta("stars", 42_i64)
            .with_meta("language", "Rust");
        assert_eq!(record.metadata.get("stars"), Some(&MetaValue::Int(42)));
        assert_eq!(
            record.metadata.get("language"),
            Some(&MetaValue::Str("Rust".to_string()))
        );
    }

    #[test]
    fn meta_values_round_trip_through_json() {
        let mut metadata = Metadata::new();
        metadata.insert("stars".to_string(), MetaValue::Int(7));
        metadata.insert("language".to_string(), MetaValue::Str("Rust".to_string()));
        metadata.insert(
            "updated_at".to_string(),
            MetaValue::Timestamp(datetime!(2024-05-01 12:30 UTC)),
        );

        let encoded = serde_json::to_string(&metadata).unwrap();
        let decoded: Metadata = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, metadata);
    }
}
