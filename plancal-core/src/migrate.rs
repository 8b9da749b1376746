//! Upcasting of stored project documents across schema generations.
//!
//! Three document shapes exist in the wild:
//! - generation 1: a single implicit calendar, with `startDate`,
//!   `endDate` and `calendarData` at the top level
//! - generation 2: a `calendars` array that may be empty
//! - generation 3 (current): non-empty `calendars` plus `activeCalendarId`
//!
//! `migrate` upcasts any of them to the current shape. It is pure and
//! idempotent: a current document passes through unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::calendar::{Calendar, date_field};
use crate::error::{PlancalError, PlancalResult};
use crate::post::Post;
use crate::project::ProjectDocument;

/// Stored shape, determined by structural inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoredShape {
    V1Flat,
    V2EmptyCalendars,
    Current,
}

fn classify(doc: &Value) -> StoredShape {
    match doc.get("calendars") {
        None => StoredShape::V1Flat,
        Some(Value::Array(items)) if items.is_empty() => StoredShape::V2EmptyCalendars,
        Some(_) => StoredShape::Current,
    }
}

/// Generation-1 payload: the calendar fields live on the document itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatDocument {
    #[serde(default)]
    name: String,
    #[serde(default, with = "date_field")]
    start_date: Option<NaiveDate>,
    #[serde(default, with = "date_field")]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    calendar_data: BTreeMap<NaiveDate, Post>,
}

/// Upcast a raw stored document to the current [`ProjectDocument`] shape.
///
/// Posts missing a `status` are assigned `Planned` on the way in, and a
/// stale `activeCalendarId` is repaired to the first calendar.
pub fn migrate(raw: Value) -> PlancalResult<ProjectDocument> {
    let mut doc = match classify(&raw) {
        StoredShape::V1Flat => {
            let flat: FlatDocument = parse(raw)?;
            let calendar = Calendar {
                id: crate::calendar::new_id(),
                name: Calendar::DEFAULT_NAME.to_string(),
                start_date: flat.start_date,
                end_date: flat.end_date,
                calendar_data: flat.calendar_data,
            };
            ProjectDocument {
                name: flat.name,
                active_calendar_id: calendar.id.clone(),
                calendars: vec![calendar],
            }
        }
        StoredShape::V2EmptyCalendars => {
            let name = raw
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ProjectDocument::new(name)
        }
        StoredShape::Current => parse(raw)?,
    };

    // The non-empty invariant must hold even for hand-edited documents.
    if doc.calendars.is_empty() {
        let calendar = Calendar::default_calendar();
        doc.active_calendar_id = calendar.id.clone();
        doc.calendars.push(calendar);
    }
    doc.normalize_active();

    Ok(doc)
}

fn parse<T: serde::de::DeserializeOwned>(raw: Value) -> PlancalResult<T> {
    serde_json::from_value(raw)
        .map_err(|e| PlancalError::Serialization(format!("malformed project document: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_doc() -> Value {
        json!({
            "name": "P",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "calendarData": {
                "2024-01-10": {
                    "title": "X",
                    "notes": "",
                    "types": [],
                    "platforms": ["Website"],
                    "color": "transparent",
                    "status": "Planned"
                }
            }
        })
    }

    #[test]
    fn flat_document_becomes_single_calendar() {
        let doc = migrate(flat_doc()).unwrap();

        assert_eq!(doc.name, "P");
        assert_eq!(doc.calendars.len(), 1);
        let calendar = &doc.calendars[0];
        assert_eq!(calendar.name, Calendar::DEFAULT_NAME);
        assert_eq!(doc.active_calendar_id, calendar.id);
        assert_eq!(
            calendar.start_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(calendar.calendar_data[&date].title, "X");
    }

    #[test]
    fn empty_calendars_array_gets_default_calendar() {
        let doc = migrate(json!({
            "name": "P",
            "calendars": [],
            "activeCalendarId": "stale"
        }))
        .unwrap();

        assert_eq!(doc.calendars.len(), 1);
        assert_eq!(doc.calendars[0].name, Calendar::DEFAULT_NAME);
        assert_eq!(doc.active_calendar_id, doc.calendars[0].id);
    }

    #[test]
    fn current_document_passes_through() {
        let current = ProjectDocument::new("P");
        let raw = serde_json::to_value(&current).unwrap();
        assert_eq!(migrate(raw).unwrap(), current);
    }

    #[test]
    fn migrate_is_idempotent_for_every_generation() {
        for raw in [
            flat_doc(),
            json!({"name": "P", "calendars": [], "activeCalendarId": ""}),
            serde_json::to_value(ProjectDocument::new("P")).unwrap(),
        ] {
            let once = migrate(raw).unwrap();
            let twice = migrate(serde_json::to_value(&once).unwrap()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn stale_active_id_is_repaired() {
        let mut current = ProjectDocument::new("P");
        current.active_calendar_id = "gone".to_string();
        let raw = serde_json::to_value(&current).unwrap();

        let doc = migrate(raw).unwrap();
        assert_eq!(doc.active_calendar_id, doc.calendars[0].id);
    }

    #[test]
    fn imported_posts_without_status_default_to_planned() {
        let mut raw = flat_doc();
        raw["calendarData"]["2024-01-10"]
            .as_object_mut()
            .unwrap()
            .remove("status");

        let doc = migrate(raw).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            doc.calendars[0].calendar_data[&date].status,
            crate::post::PostStatus::Planned
        );
    }
}
