//! The `.ccpro` exchange format.
//!
//! A single-calendar JSON envelope (`name`, `startDate`, `endDate`,
//! `calendarData`) used for export and for `import_calendar_data`.
//! Posts are sanitized on the way in: a missing status becomes
//! `Planned`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::{Calendar, date_field};
use crate::error::{PlancalError, PlancalResult};
use crate::post::Post;

pub const EXCHANGE_EXTENSION: &str = "ccpro";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarExchange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, with = "date_field")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "date_field")]
    pub end_date: Option<NaiveDate>,
    pub calendar_data: BTreeMap<NaiveDate, Post>,
}

impl CalendarExchange {
    /// Parse and validate raw `.ccpro` text. The envelope must carry a
    /// `calendarData` object and defined `startDate`/`endDate` keys.
    pub fn from_json(raw: &str) -> PlancalResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|_| invalid_format())?;
        let object = value.as_object().ok_or_else(invalid_format)?;

        if !object.get("calendarData").is_some_and(Value::is_object)
            || !object.contains_key("startDate")
            || !object.contains_key("endDate")
        {
            return Err(invalid_format());
        }

        serde_json::from_value(value).map_err(|_| invalid_format())
    }

    pub fn from_calendar(calendar: &Calendar) -> Self {
        CalendarExchange {
            name: Some(calendar.name.clone()),
            start_date: calendar.start_date,
            end_date: calendar.end_date,
            calendar_data: calendar.calendar_data.clone(),
        }
    }

    pub fn to_json(&self) -> PlancalResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlancalError::Serialization(e.to_string()))
    }
}

fn invalid_format() -> PlancalError {
    PlancalError::Validation("Invalid .ccpro file format".to_string())
}
