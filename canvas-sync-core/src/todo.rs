//! Calendar todo types.
//!
//! These mirror the subset of a VTODO that the sync reads or writes. Anything else in the
//! stored iCalendar text is carried along in [`TodoResource::raw`].

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::ics::{TodoPatch, patch_todo};

/// A calendar todo (VTODO)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub due: Option<DueTime>,
    pub categories: Vec<String>,
    pub status: TodoStatus,
    /// Completion timestamp (COMPLETED)
    pub completed: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TodoStatus::Completed
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TodoStatus {
    #[default]
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            TodoStatus::NeedsAction => "NEEDS-ACTION",
            TodoStatus::InProcess => "IN-PROCESS",
            TodoStatus::Completed => "COMPLETED",
            TodoStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s {
            "NEEDS-ACTION" => Some(TodoStatus::NeedsAction),
            "IN-PROCESS" => Some(TodoStatus::InProcess),
            "COMPLETED" => Some(TodoStatus::Completed),
            "CANCELLED" => Some(TodoStatus::Cancelled),
            _ => None,
        }
    }
}

/// Due value of a todo, preserving how it is expressed in iCalendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueTime {
    /// All-day due date (VALUE=DATE)
    Date(NaiveDate),
    /// UTC instant (`Z` suffix)
    DateTimeUtc(DateTime<Utc>),
    /// Wall-clock time without zone
    DateTimeFloating(NaiveDateTime),
    /// Wall-clock time with a TZID parameter
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl fmt::Display for DueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DueTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            DueTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            DueTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}

/// A todo as stored on the calendar server.
#[derive(Debug, Clone)]
pub struct TodoResource {
    pub href: String,
    pub etag: Option<String>,
    /// The full iCalendar document as fetched
    pub raw: String,
    pub todo: Todo,
}

impl TodoResource {
    /// Apply a patch, rewriting both the raw document and the parsed view.
    pub fn apply(&mut self, patch: &TodoPatch) -> SyncResult<()> {
        self.raw = patch_todo(&self.raw, patch).map_err(|reason| SyncError::DataIntegrity {
            summary: self.todo.summary.clone(),
            reason,
        })?;

        if let Some(due) = &patch.due {
            self.todo.due = due.clone();
        }
        if let Some(completed) = patch.completed {
            self.todo.status = TodoStatus::Completed;
            self.todo.completed = Some(completed);
        }
        Ok(())
    }
}
