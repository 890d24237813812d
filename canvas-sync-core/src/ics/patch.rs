//! Rewriting the properties this tool owns on an existing VTODO.
//!
//! The document goes through icalendar's parser and writer, so alarms and vendor properties
//! survive.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component};

use super::generate::{add_due_property, strip_ics_bloat};
use crate::todo::DueTime;

/// Changes to apply to the first VTODO of a document
#[derive(Debug, Clone, PartialEq)]
pub struct TodoPatch {
    /// `Some(None)` removes DUE, `None` leaves it untouched
    pub due: Option<Option<DueTime>>,
    /// Mark completed at this instant
    pub completed: Option<DateTime<Utc>>,
    /// Written to DTSTAMP and LAST-MODIFIED
    pub stamp: DateTime<Utc>,
}

impl TodoPatch {
    pub fn new(stamp: DateTime<Utc>) -> Self {
        TodoPatch {
            due: None,
            completed: None,
            stamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_none() && self.completed.is_none()
    }

    fn apply_to(&self, ics_todo: &mut icalendar::Todo) {
        ics_todo.timestamp(self.stamp);
        ics_todo.last_modified(self.stamp);

        match &self.due {
            Some(Some(due)) => add_due_property(ics_todo, due),
            Some(None) => {
                ics_todo.remove_due();
            }
            None => {}
        }

        if let Some(completed) = self.completed {
            ics_todo.status(icalendar::TodoStatus::Completed);
            ics_todo.completed(completed);
            ics_todo.percent_complete(100);
        }
    }
}

/// Apply `patch` to the first VTODO in `content`.
///
/// Fails with the parser's message when `content` is not a calendar or holds no VTODO.
pub fn patch_todo(content: &str, patch: &TodoPatch) -> Result<String, String> {
    let mut calendar: Calendar = content.parse()?;

    let ics_todo = calendar
        .todos_mut()
        .next()
        .ok_or_else(|| "no VTODO in calendar resource".to_string())?;
    patch.apply_to(ics_todo);

    Ok(strip_ics_bloat(&calendar.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_todo;
    use crate::todo::TodoStatus;
    use chrono::{NaiveDate, TimeZone};

    const STORED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Some Client//EN\r\n\
BEGIN:VTODO\r\n\
UID:stored-1\r\n\
DTSTAMP:20240101T000000Z\r\n\
SUMMARY:Problem Set 4\r\n\
DUE:20240310T233000\r\n\
CATEGORIES:canvas-assignment\r\n\
DESCRIPTION:assignment-id: 101:55\\nCourse: Linear \r\n Algebra\r\n\
STATUS:NEEDS-ACTION\r\n\
X-CLIENT-COLOR:red\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
DESCRIPTION:Reminder\r\n\
TRIGGER:-PT30M\r\n\
END:VALARM\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_patch_due_replaces_only_due() {
        let new_due = DueTime::DateTimeFloating(
            NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap(),
        );
        let mut patch = TodoPatch::new(stamp());
        patch.due = Some(Some(new_due.clone()));

        let patched = patch_todo(STORED, &patch).unwrap();
        let todo = parse_todo(&patched).expect("Should parse patched ICS");

        assert_eq!(todo.due, Some(new_due));
        assert_eq!(todo.status, TodoStatus::NeedsAction);
        assert_eq!(
            todo.description.as_deref(),
            Some("assignment-id: 101:55\nCourse: Linear Algebra")
        );
        assert_eq!(patched.matches("DUE").count(), 1, "ICS:\n{}", patched);
        assert!(patched.contains("X-CLIENT-COLOR:red"));
        assert!(patched.contains("TRIGGER:-PT30M"));
        assert!(patched.contains("DTSTAMP:20240308T090000Z"));
        assert!(patched.contains("LAST-MODIFIED:20240308T090000Z"));
        assert!(!patched.contains("DTSTAMP:20240101T000000Z"));
    }

    #[test]
    fn test_patch_utc_due_replaces_zoned_due_parameters() {
        let stored = STORED.replace("DUE:20240310T233000", "DUE;TZID=Europe/Berlin:20240310T233000");
        let new_due = DueTime::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 10, 22, 30, 0).unwrap());
        let mut patch = TodoPatch::new(stamp());
        patch.due = Some(Some(new_due.clone()));

        let patched = patch_todo(&stored, &patch).unwrap();
        let todo = parse_todo(&patched).expect("Should parse patched ICS");

        assert_eq!(todo.due, Some(new_due));
        assert!(!patched.contains("TZID"), "ICS:\n{}", patched);
    }

    #[test]
    fn test_patch_complete_sets_status_and_keeps_alarm_description() {
        let mut patch = TodoPatch::new(stamp());
        patch.completed = Some(stamp());

        let patched = patch_todo(STORED, &patch).unwrap();
        let todo = parse_todo(&patched).expect("Should parse patched ICS");

        assert!(todo.is_completed());
        assert_eq!(todo.completed, Some(stamp()));
        assert!(patched.contains("PERCENT-COMPLETE:100"));
        assert_eq!(patched.matches("STATUS:").count(), 1);
        // The VALARM description is nested and must survive
        assert!(patched.contains("DESCRIPTION:Reminder"));
        assert!(patched.contains("ACTION:DISPLAY"));
    }

    #[test]
    fn test_patch_can_remove_due() {
        let mut patch = TodoPatch::new(stamp());
        patch.due = Some(None);

        let patched = patch_todo(STORED, &patch).unwrap();
        let todo = parse_todo(&patched).expect("Should parse patched ICS");

        assert!(todo.due.is_none());
    }

    #[test]
    fn test_empty_patch_only_touches_timestamps() {
        let patch = TodoPatch::new(stamp());
        assert!(patch.is_empty());

        let patched = patch_todo(STORED, &patch).unwrap();
        let before = parse_todo(STORED).unwrap();
        let after = parse_todo(&patched).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_patch_keeps_escaped_text_stable() {
        let stored = STORED.replace("SUMMARY:Problem Set 4", "SUMMARY:Reading\\, part 2\\; notes");
        let patch = TodoPatch::new(stamp());

        let once = patch_todo(&stored, &patch).unwrap();
        let twice = patch_todo(&once, &patch).unwrap();

        assert_eq!(parse_todo(&twice).unwrap().summary, "Reading, part 2; notes");
        assert!(twice.contains("SUMMARY:Reading\\, part 2\\; notes"), "ICS:\n{}", twice);
    }

    #[test]
    fn test_patch_rejects_document_without_todo() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:e\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        assert!(patch_todo(ics, &TodoPatch::new(stamp())).is_err());
    }
}
