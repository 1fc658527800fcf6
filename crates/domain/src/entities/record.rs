//! Record entity - a single key/value row as the backend stores it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored key-value record
///
/// The key uniquely identifies the record in the backend table. The value is
/// an opaque string payload. `created_at` is set once at first insertion and
/// `updated_at` is refreshed on every successful write, including writes that
/// were redirected by chaos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (primary key in the backend)
    pub key: String,
    /// Opaque string payload
    pub value: String,
    /// When the record was first inserted
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a fresh record with both timestamps set to now
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the value and refresh `updated_at`, keeping `created_at`
    pub fn touch(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Key: {:<20} | Value: {:<20} | Created: {} | Updated: {}",
            self.key,
            self.value,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.updated_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_sets_both_timestamps() {
        let record = Record::new("cat", "meow");
        assert_eq!(record.key, "cat");
        assert_eq!(record.value, "meow");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn touch_preserves_created_at() {
        let mut record = Record::new("cat", "meow");
        let created = record.created_at;
        record.touch("purr");
        assert_eq!(record.value, "purr");
        assert_eq!(record.created_at, created);
        assert!(record.updated_at >= created);
    }

    #[test]
    fn display_contains_key_and_value() {
        let record = Record::new("cat", "meow");
        let rendered = record.to_string();
        assert!(rendered.contains("cat"));
        assert!(rendered.contains("meow"));
    }

    #[test]
    fn serialization_roundtrip() {
        let record = Record::new("cat", "meow");
        let json = serde_json::to_string(&record).unwrap();
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn empty_key_and_value_are_allowed() {
        // The store places no constraints on key or value contents
        let record = Record::new("", "");
        assert!(record.key.is_empty());
        assert!(record.value.is_empty());
    }
}
