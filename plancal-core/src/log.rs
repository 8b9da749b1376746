//! Change-log entries, appended with every save.
//!
//! Entries are append-only: they are written once in the save batch and
//! never mutated, only cascade-deleted with their project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlancalResult;
use crate::store::{DocPath, DocumentStore};

/// Origin recorded when the caller's network origin is unavailable.
pub const UNKNOWN_ORIGIN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Document id; the path segment, not part of the stored payload.
    #[serde(skip)]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub change_description: String,
}

impl LogEntry {
    /// Entry describing an explicit save of a project document.
    pub fn for_save(origin: &str, project_name: &str, calendar_name: &str) -> Self {
        LogEntry {
            id: crate::calendar::new_id(),
            timestamp: Utc::now(),
            ip_address: origin.to_string(),
            change_description: format!(
                "Saved project \"{}\" (calendar \"{}\")",
                project_name, calendar_name
            ),
        }
    }
}

/// The most recent `limit` entries for a project, newest first.
/// Read-only; has no effect on canonical state.
pub async fn recent_entries(
    store: &dyn DocumentStore,
    account_id: &str,
    project_id: &str,
    limit: usize,
) -> PlancalResult<Vec<LogEntry>> {
    let children = store
        .list_children(&DocPath::logs(account_id, project_id))
        .await?;

    let mut entries: Vec<LogEntry> = children
        .into_iter()
        .filter_map(|(path, doc)| {
            let mut entry: LogEntry = serde_json::from_value(doc).ok()?;
            entry.id = path.id().to_string();
            Some(entry)
        })
        .collect();

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    Ok(entries)
}
