//! ICS file parsing using the icalendar crate's parser.

use chrono::{DateTime, NaiveDateTime, Utc};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{read_calendar, unfold},
};

use crate::todo::{DueTime, Todo, TodoStatus};

/// Parse ICS content into a Todo struct.
///
/// TEXT values come back unescaped from icalendar's parser.
/// Returns `None` when the document does not parse, has no VTODO, or the VTODO has no UID.
pub fn parse_todo(content: &str) -> Option<Todo> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vtodo = calendar
        .components
        .iter()
        .find(|c| c.name.as_str().eq_ignore_ascii_case("VTODO"))?;

    let uid = vtodo.find_prop("UID")?.val.to_string();
    let summary = vtodo
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());
    let description = vtodo
        .find_prop("DESCRIPTION")
        .map(|p| p.val.to_string());

    let due = vtodo
        .find_prop("DUE")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_due_time);

    // CATEGORIES may repeat and each may hold a comma-separated list
    let categories: Vec<String> = vtodo
        .properties
        .iter()
        .filter(|p| p.name == "CATEGORIES")
        .flat_map(|p| split_text_list(p.val.as_ref()))
        .collect();

    let status = vtodo
        .find_prop("STATUS")
        .and_then(|p| TodoStatus::from_ics_str(p.val.as_ref()))
        .unwrap_or_default();

    let completed = vtodo
        .find_prop("COMPLETED")
        .and_then(|p| parse_utc(p.val.as_ref()));

    Some(Todo {
        uid,
        summary,
        description,
        due,
        categories,
        status,
        completed,
    })
}

/// Convert icalendar's DatePerhapsTime to our DueTime, preserving timezone info
fn to_due_time(dpt: DatePerhapsTime) -> DueTime {
    match dpt {
        DatePerhapsTime::Date(d) => DueTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => DueTime::DateTimeUtc(dt),
            CalendarDateTime::Floating(naive) => DueTime::DateTimeFloating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => DueTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S").ok()?;
    Some(naive.and_utc())
}

/// Split a CATEGORIES value into its items.
///
/// The parser has already unescaped TEXT values, so an escaped comma inside one category
/// name splits like a list separator.
fn split_text_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
