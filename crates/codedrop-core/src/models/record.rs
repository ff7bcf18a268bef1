use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Code;

/// Metadata for one stored file.
///
/// Immutable once created: the content location, presented name, declared type
/// and size never change for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    content_location: String,
    original_name: String,
    mime_type: String,
    byte_size: u64,
}

impl ObjectRecord {
    pub fn new(
        content_location: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        byte_size: u64,
    ) -> Self {
        Self {
            content_location: content_location.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            byte_size,
        }
    }

    /// Storage key of the raw bytes in the content area.
    pub fn content_location(&self) -> &str {
        &self.content_location
    }

    /// Name presented to the receiver.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

/// TTL-bound mapping from a code to the files of one upload.
#[derive(Debug, Clone, Serialize)]
pub struct CodeEntry {
    code: Code,
    records: Vec<ObjectRecord>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CodeEntry {
    /// Create an entry expiring `ttl` after `created_at`.
    ///
    /// Callers are responsible for passing at least one record; the store rejects
    /// empty uploads before an entry is ever built.
    pub fn new(
        code: Code,
        records: Vec<ObjectRecord>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            code,
            records,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// An entry is expired at and after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    /// True when the entry is delivered as an archive rather than a single file.
    pub fn is_bundle(&self) -> bool {
        self.records.len() > 1
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(ObjectRecord::byte_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(records: Vec<ObjectRecord>, ttl_secs: i64) -> (CodeEntry, DateTime<Utc>) {
        let now = Utc::now();
        let code = Code::from_number(123_456).unwrap();
        (
            CodeEntry::new(code, records, now, Duration::seconds(ttl_secs)),
            now,
        )
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let record = ObjectRecord::new("objects/a", "a.txt", "text/plain", 10);
        let (entry, now) = entry_with(vec![record], 600);

        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now + Duration::seconds(599)));
        assert!(entry.is_expired_at(now + Duration::seconds(600)));
        assert!(entry.is_expired_at(now + Duration::seconds(601)));
    }

    #[test]
    fn test_remaining_secs_saturates_at_zero() {
        let record = ObjectRecord::new("objects/a", "a.txt", "text/plain", 10);
        let (entry, now) = entry_with(vec![record], 600);

        assert_eq!(entry.remaining_secs(now), 600);
        assert_eq!(entry.remaining_secs(now + Duration::seconds(100)), 500);
        assert_eq!(entry.remaining_secs(now + Duration::seconds(900)), 0);
    }

    #[test]
    fn test_bundle_and_totals() {
        let single = vec![ObjectRecord::new("objects/a", "a.txt", "text/plain", 10)];
        let (entry, _) = entry_with(single, 60);
        assert!(!entry.is_bundle());
        assert_eq!(entry.total_bytes(), 10);

        let pair = vec![
            ObjectRecord::new("objects/a", "a.txt", "text/plain", 10),
            ObjectRecord::new("objects/b", "b.txt", "text/plain", 32),
        ];
        let (entry, _) = entry_with(pair, 60);
        assert!(entry.is_bundle());
        assert_eq!(entry.total_bytes(), 42);
        assert_eq!(entry.records()[1].original_name(), "b.txt");
    }
}
