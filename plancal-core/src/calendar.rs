//! A single content-planning calendar: a named, optionally bounded
//! date range with at most one post per day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::post::Post;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub name: String,
    /// Start of the planning range. Persisted as an ISO date string,
    /// with the empty string meaning "not set".
    #[serde(default, with = "date_field")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "date_field")]
    pub end_date: Option<NaiveDate>,
    /// Sparse map of dated posts, keyed by calendar date.
    #[serde(default)]
    pub calendar_data: BTreeMap<NaiveDate, Post>,
}

impl Calendar {
    /// Name given to calendars the system creates on its own
    /// (new projects, migrated legacy documents).
    pub const DEFAULT_NAME: &'static str = "Main Calendar";

    pub fn new(name: impl Into<String>) -> Self {
        Calendar {
            id: new_id(),
            name: name.into(),
            start_date: None,
            end_date: None,
            calendar_data: BTreeMap::new(),
        }
    }

    pub fn default_calendar() -> Self {
        Calendar::new(Self::DEFAULT_NAME)
    }
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Serde adapter for `Option<NaiveDate>` fields that are stored as
/// ISO date strings where `""` means unset.
pub(crate) mod date_field {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
