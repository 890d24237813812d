//! ICS file generation.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Property, ValueType};

use crate::todo::{DueTime, Todo};

const PRODID: &str = "-//canvas-sync//EN";

/// Generate .ics content for a todo
pub fn generate_ics(todo: &Todo, stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    let mut ics_todo = icalendar::Todo::new();

    ics_todo.uid(&todo.uid);
    ics_todo.summary(&todo.summary);
    // DTSTAMP is required by RFC 5545
    ics_todo.timestamp(stamp);

    if let Some(ref due) = todo.due {
        add_due_property(&mut ics_todo, due);
    }

    for category in &todo.categories {
        ics_todo.append_multi_property(Property::new("CATEGORIES", category));
    }

    if let Some(ref desc) = todo.description {
        ics_todo.description(desc);
    }

    ics_todo.add_property("STATUS", todo.status.as_ics_str());

    if let Some(completed) = todo.completed {
        ics_todo.completed(completed);
        ics_todo.percent_complete(100);
    }

    let ics_todo = ics_todo.done();
    cal.push(ics_todo);
    let cal = cal.done();

    strip_ics_bloat(&cal.to_string())
}

/// Set DUE, replacing any previous value and its parameters
pub(crate) fn add_due_property(ics_todo: &mut icalendar::Todo, due: &DueTime) {
    match due {
        DueTime::Date(d) => {
            let mut prop = Property::new("DUE", d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_todo.append_property(prop);
        }
        DueTime::DateTimeUtc(dt) => {
            ics_todo.add_property("DUE", format_utc(dt));
        }
        DueTime::DateTimeFloating(dt) => {
            ics_todo.add_property("DUE", dt.format("%Y%m%dT%H%M%S").to_string());
        }
        DueTime::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new("DUE", datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            ics_todo.append_property(prop);
        }
    }
}

pub(crate) fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Replace the icalendar crate's PRODID with ours and drop lines the crate adds on its own:
/// CALSCALE:GREGORIAN (the default) and DTSTAMP/UID inside VALARM.
pub(crate) fn strip_ics_bloat(ics: &str) -> String {
    let mut result = Vec::new();
    let mut in_alarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push(format!("PRODID:{PRODID}"));
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        if line == "BEGIN:VALARM" {
            in_alarm = true;
        } else if line == "END:VALARM" {
            in_alarm = false;
        } else if in_alarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }
        result.push(line.to_string());
    }

    let mut output = result.join("\r\n");
    output.push_str("\r\n");
    output
}
