//! Look-ahead admission: decides whether an untracked assignment gets a todo now.

use chrono::NaiveDateTime;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Maximum whole days until the due date
    pub look_ahead: i64,
    /// Admit assignments without a due date
    pub include_undated: bool,
}

impl Default for Admission {
    fn default() -> Self {
        Admission {
            look_ahead: 14,
            include_undated: false,
        }
    }
}

impl Admission {
    pub fn admits(&self, due: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
        match due {
            Some(due) => whole_days_between(now, due) <= self.look_ahead,
            None => self.include_undated,
        }
    }
}

/// Whole days from `from` to `to`, floored (an hour overdue is `-1`).
pub fn whole_days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_due_exactly_look_ahead_days_is_admitted() {
        let admission = Admission::default();
        assert!(admission.admits(Some(now() + Duration::days(14)), now()));
        // Partial days do not count toward the next whole day
        assert!(admission.admits(
            Some(now() + Duration::days(14) + Duration::hours(23)),
            now()
        ));
    }

    #[test]
    fn test_due_one_day_past_look_ahead_is_rejected() {
        let admission = Admission::default();
        assert!(!admission.admits(Some(now() + Duration::days(15)), now()));
    }

    #[test]
    fn test_overdue_assignments_floor_to_negative_days() {
        assert_eq!(whole_days_between(now(), now() - Duration::hours(1)), -1);
        assert_eq!(whole_days_between(now(), now() - Duration::days(1)), -1);
        assert_eq!(
            whole_days_between(now(), now() - Duration::days(1) - Duration::seconds(1)),
            -2
        );
        assert_eq!(whole_days_between(now(), now() + Duration::hours(23)), 0);

        assert!(Admission::default().admits(Some(now() - Duration::days(30)), now()));
    }

    #[test]
    fn test_negative_look_ahead_excludes_overdue_by_less_than_a_day() {
        let admission = Admission {
            look_ahead: -2,
            include_undated: false,
        };
        assert!(!admission.admits(Some(now() - Duration::hours(1)), now()));
        assert!(admission.admits(Some(now() - Duration::days(2)), now()));
    }

    #[test]
    fn test_undated_assignments_follow_flag() {
        assert!(!Admission::default().admits(None, now()));

        let admission = Admission {
            include_undated: true,
            ..Admission::default()
        };
        assert!(admission.admits(None, now()));
    }
}
