//! Accounts, projects and the persisted project document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::Calendar;
use crate::store::DocPath;

/// Top-level tenant grouping. The id is the document's path segment,
/// not part of the stored payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
}

impl Account {
    pub(crate) fn from_doc(path: &DocPath, doc: &Value) -> Option<Self> {
        Some(Account {
            id: path.id().to_string(),
            name: doc.get("name")?.as_str()?.to_string(),
        })
    }

    pub(crate) fn to_doc(&self) -> Value {
        serde_json::json!({ "name": self.name })
    }
}

/// A project listing entry: identity plus owning account. The full
/// payload lives in the [`ProjectDocument`] at the project's path.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub account_id: String,
}

impl Project {
    pub(crate) fn from_doc(account_id: &str, path: &DocPath, doc: &Value) -> Option<Self> {
        Some(Project {
            id: path.id().to_string(),
            name: doc.get("name")?.as_str()?.to_string(),
            account_id: account_id.to_string(),
        })
    }
}

/// The full persisted payload for a project. Invariant: `calendars` is
/// never empty once the document exists; a default calendar is created
/// whenever none is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub name: String,
    pub calendars: Vec<Calendar>,
    pub active_calendar_id: String,
}

impl ProjectDocument {
    /// A fresh document with one default calendar, as provisioned for
    /// newly created projects.
    pub fn new(name: impl Into<String>) -> Self {
        let calendar = Calendar::default_calendar();
        ProjectDocument {
            name: name.into(),
            active_calendar_id: calendar.id.clone(),
            calendars: vec![calendar],
        }
    }

    /// The calendar referenced by `active_calendar_id`, falling back to
    /// the first calendar when the stored reference is stale. `None`
    /// only for documents that violate the non-empty invariant.
    pub fn active_calendar(&self) -> Option<&Calendar> {
        self.calendars
            .iter()
            .find(|c| c.id == self.active_calendar_id)
            .or_else(|| self.calendars.first())
    }

    pub fn active_calendar_mut(&mut self) -> Option<&mut Calendar> {
        let index = self
            .calendars
            .iter()
            .position(|c| c.id == self.active_calendar_id)
            .unwrap_or(0);
        self.calendars.get_mut(index)
    }

    /// Point `active_calendar_id` at an existing calendar, repairing a
    /// stale reference deterministically (first calendar wins).
    pub(crate) fn normalize_active(&mut self) {
        if !self
            .calendars
            .iter()
            .any(|c| c.id == self.active_calendar_id)
        {
            if let Some(first) = self.calendars.first() {
                self.active_calendar_id = first.id.clone();
            }
        }
    }
}
