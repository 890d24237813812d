//! Correlation keys linking a Canvas assignment to the todo that tracks it.
//!
//! The key is stored as the first line of the todo description:
//!
//! ```text
//! assignment-id: 101:55
//! Course: Linear Algebra
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// (course id, assignment id) pair, rendered as `"{course_id}:{assignment_id}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub course_id: u64,
    pub assignment_id: u64,
}

impl CorrelationKey {
    pub fn new(course_id: u64, assignment_id: u64) -> Self {
        CorrelationKey {
            course_id,
            assignment_id,
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.course_id, self.assignment_id)
    }
}

impl FromStr for CorrelationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (course, assignment) = s
            .split_once(':')
            .ok_or_else(|| format!("'{s}' is not of the form <course-id>:<assignment-id>"))?;

        let course_id = course
            .parse()
            .map_err(|_| format!("invalid course id '{course}'"))?;
        let assignment_id = assignment
            .parse()
            .map_err(|_| format!("invalid assignment id '{assignment}'"))?;

        Ok(CorrelationKey::new(course_id, assignment_id))
    }
}

/// Build the description of a newly created todo.
pub fn build_description(prefix: &str, key: &CorrelationKey, course_name: &str) -> String {
    format!("{prefix}{key}\nCourse: {course_name}")
}

/// Extract the correlation key from a todo description.
///
/// Only the first line is inspected; it must start with `prefix` and the remainder must be a
/// well-formed key.
pub fn extract_key(prefix: &str, description: &str) -> Result<CorrelationKey, String> {
    let id_line = description.lines().next().unwrap_or_default();

    let raw = id_line
        .strip_prefix(prefix)
        .ok_or_else(|| format!("first line '{id_line}' does not start with '{prefix}'"))?;

    raw.parse()
}
