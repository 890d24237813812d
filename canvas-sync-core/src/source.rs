//! Assignment source (the LMS side of the sync).
//!
//! Implementations are expected to be called sequentially: Canvas rate limiting is designed
//! for clients that issue one request at a time, and the reconciler never issues concurrent
//! calls.

use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationKey;
use crate::error::SyncResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    /// Missing for courses whose access is restricted by date
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    /// UTC, e.g. `2024-03-10T23:30:00Z`
    pub due_at: Option<String>,
}

impl Assignment {
    pub fn key(&self, course: &Course) -> CorrelationKey {
        CorrelationKey::new(course.id, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub attempt: Option<u32>,
}

impl Submission {
    pub fn is_submitted(&self) -> bool {
        self.attempt.is_some_and(|attempt| attempt >= 1)
    }
}

/// Read-only access to courses, assignments and submissions for one user.
#[allow(async_fn_in_trait)]
pub trait AssignmentSource {
    async fn active_courses(&self) -> SyncResult<Vec<Course>>;

    async fn assignments(&self, course: &Course) -> SyncResult<Vec<Assignment>>;

    async fn assignment(&self, course: &Course, assignment_id: u64) -> SyncResult<Assignment>;

    /// The configured user's submission for an assignment
    async fn submission(&self, course: &Course, assignment_id: u64) -> SyncResult<Submission>;
}
