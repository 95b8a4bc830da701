//! Append-only terminal log for a session.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::steps::StepStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
}

impl From<StepStatus> for LogStatus {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Upcoming => LogStatus::Pending,
            StepStatus::Active => LogStatus::Running,
            StepStatus::Completed => LogStatus::Success,
        }
    }
}

/// A single line in the terminal log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub status: LogStatus,
    /// RFC 3339 timestamp in UTC
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl LogEntry {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        status: LogStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            detail: None,
            status,
            timestamp: format_timestamp(at),
            meta: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ordered, id-unique log.
///
/// Entries are never removed or reordered while a session runs; only their
/// status and timestamp may change.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` when the id is already present.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Rewrite the status of an existing entry, returning whether it changed
    pub fn set_status(&mut self, id: &str, status: LogStatus, at: DateTime<Utc>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.status != status => {
                entry.status = status;
                entry.timestamp = format_timestamp(at);
                true
            }
            _ => false,
        }
    }

    /// Force every entry that is not yet successful to `Success`
    pub fn settle_all(&mut self, at: DateTime<Utc>) -> bool {
        let mut changed = false;
        for entry in self.entries.iter_mut() {
            if entry.status != LogStatus::Success {
                entry.status = LogStatus::Success;
                entry.timestamp = format_timestamp(at);
                changed = true;
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
