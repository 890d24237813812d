//! Due-date normalization.
//!
//! Canvas reports due dates as UTC timestamps (`2024-03-10T23:30:00Z`). Before they are
//! compared or written to the calendar they are moved into the user's local frame and the
//! fallback-hour rule is applied: a due time at or before `fallback_hour` counts as
//! 23:59 of the previous day.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};
use crate::todo::DueTime;

const CANVAS_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// How UTC instants are mapped to local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocalFrame {
    /// Keep the UTC wall-clock
    #[default]
    Utc,
    /// Add a fixed number of hours (legacy `timezone-offset`)
    FixedOffset(i64),
    /// Proper IANA time zone conversion, honoring DST
    Zone(Tz),
}

impl LocalFrame {
    fn localize(&self, utc: NaiveDateTime) -> NaiveDateTime {
        match self {
            LocalFrame::Utc => utc,
            LocalFrame::FixedOffset(hours) => utc + Duration::hours(*hours),
            LocalFrame::Zone(tz) => tz.from_utc_datetime(&utc).naive_local(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuePolicy {
    pub frame: LocalFrame,
    /// Local hours `<= fallback_hour` roll back to 23:59 of the previous day; `-1` disables
    pub fallback_hour: i32,
}

impl Default for DuePolicy {
    fn default() -> Self {
        DuePolicy {
            frame: LocalFrame::Utc,
            fallback_hour: -1,
        }
    }
}

impl DuePolicy {
    /// Normalize a raw Canvas `due_at` value into local wall-clock time.
    pub fn normalize(&self, raw: Option<&str>) -> SyncResult<Option<NaiveDateTime>> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        let utc = parse_canvas_timestamp(raw)?;
        let local = self.frame.localize(utc);

        Ok(Some(self.apply_fallback(local)))
    }

    fn apply_fallback(&self, local: NaiveDateTime) -> NaiveDateTime {
        if (local.hour() as i32) > self.fallback_hour {
            return local;
        }

        let previous_day = local.date() - Duration::days(1);
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
        previous_day.and_time(end_of_day)
    }

    /// The current instant in the same local frame as normalized due dates.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        self.frame.localize(now.naive_utc())
    }

    /// The DUE value to store for a normalized local due time.
    ///
    /// Zoned times are stored as the UTC instant, so the document needs no VTIMEZONE.
    pub fn due_time(&self, local: NaiveDateTime) -> DueTime {
        match self.frame {
            LocalFrame::Zone(tz) => DueTime::DateTimeUtc(zoned_to_utc(&tz, local)),
            _ => DueTime::DateTimeFloating(local),
        }
    }
}

fn zoned_to_utc(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        // Wall-clock times skipped by a DST jump move forward by the jump
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

fn parse_canvas_timestamp(raw: &str) -> SyncResult<NaiveDateTime> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, CANVAS_TIMESTAMP_FORMAT) {
        return Ok(naive);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|e| SyncError::DueDate(format!("'{raw}': {e}")))
}
