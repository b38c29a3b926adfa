//! Session-scoped upload history

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display format for upload timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One successfully processed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub timestamp: DateTime<Local>,
}

impl UploadRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            timestamp: Local::now(),
        }
    }

    /// Timestamp rendered as `YYYY-MM-DD HH:MM:SS`
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Append-only upload log owned by the caller and passed into the pipeline.
///
/// Records are never mutated or removed; the log lives as long as the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    records: Vec<UploadRecord>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            records: Vec::new(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a record for `filename` stamped with the current local time
    pub fn record(&mut self, filename: impl Into<String>) -> &UploadRecord {
        self.records.push(UploadRecord::new(filename));
        &self.records[self.records.len() - 1]
    }

    /// Records in upload order
    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    /// Records most recent first
    pub fn recent_first(&self) -> impl Iterator<Item = &UploadRecord> {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
