//! One sync pass: index tracked todos, add upcoming assignments, then refresh due dates and
//! completion of everything tracked.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::{DEFAULT_CATEGORY, DEFAULT_DESCRIPTION_ID_PREFIX};
use crate::correlation::{CorrelationKey, build_description};
use crate::due::DuePolicy;
use crate::error::{SyncError, SyncResult};
use crate::ics::TodoPatch;
use crate::index::TodoIndex;
use crate::policy::Admission;
use crate::source::{AssignmentSource, Course};
use crate::store::TodoStore;
use crate::todo::{DueTime, Todo, TodoStatus};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Prefix of the first description line that carries the correlation key
    pub description_id_prefix: String,
    /// Category marking todos managed by this tool
    pub category: String,
    pub admission: Admission,
    pub due_policy: DuePolicy,
    /// Leave todos of no-longer-active courses alone instead of failing
    pub skip_inactive_courses: bool,
    /// Compute actions without writing to the calendar
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            description_id_prefix: DEFAULT_DESCRIPTION_ID_PREFIX.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            admission: Admission::default(),
            due_policy: DuePolicy::default(),
            skip_inactive_courses: false,
            dry_run: false,
        }
    }
}

/// A change made (or, in a dry run, planned) to the calendar.
#[derive(Debug, Clone, PartialEq)]
pub enum TodoAction {
    Create {
        key: CorrelationKey,
        summary: String,
        due: Option<DueTime>,
    },
    UpdateDue {
        key: CorrelationKey,
        summary: String,
        old: Option<DueTime>,
        new: Option<DueTime>,
    },
    Complete {
        key: CorrelationKey,
        summary: String,
    },
}

impl TodoAction {
    pub fn key(&self) -> CorrelationKey {
        match self {
            TodoAction::Create { key, .. }
            | TodoAction::UpdateDue { key, .. }
            | TodoAction::Complete { key, .. } => *key,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            TodoAction::Create { summary, .. }
            | TodoAction::UpdateDue { summary, .. }
            | TodoAction::Complete { summary, .. } => summary,
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub actions: Vec<TodoAction>,
    /// Tracked todos after the pass
    pub tracked: usize,
    pub skipped_completed: usize,
    pub skipped_inactive: usize,
}

impl SyncReport {
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, TodoAction::Create { .. }))
    }

    pub fn due_updates(&self) -> usize {
        self.count(|a| matches!(a, TodoAction::UpdateDue { .. }))
    }

    pub fn completed(&self) -> usize {
        self.count(|a| matches!(a, TodoAction::Complete { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn count(&self, pred: impl Fn(&TodoAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

pub struct Reconciler<'a, S, T> {
    source: &'a S,
    store: &'a T,
    options: &'a SyncOptions,
}

impl<'a, S: AssignmentSource, T: TodoStore> Reconciler<'a, S, T> {
    pub fn new(source: &'a S, store: &'a T, options: &'a SyncOptions) -> Self {
        Reconciler {
            source,
            store,
            options,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();

        info!("Step 1: Indexing tracked todos");
        let todos = self.store.todos().await?;
        let mut index = TodoIndex::build(
            todos,
            &self.options.description_id_prefix,
            &self.options.category,
        )?;
        info!("Found {} tracked todos", index.len());

        let courses = self.source.active_courses().await?;
        info!("Found {} active courses", courses.len());

        info!("Step 2: Adding upcoming assignments");
        self.add_upcoming_assignments(&courses, &mut index, now, &mut report)
            .await?;

        info!("Step 3: Syncing due dates and completion");
        self.sync_tracked_todos(&courses, &mut index, now, &mut report)
            .await?;

        report.tracked = index.len();
        info!(
            "Sync finished: {} created, {} due dates updated, {} completed",
            report.created(),
            report.due_updates(),
            report.completed()
        );

        Ok(report)
    }

    async fn add_upcoming_assignments(
        &self,
        courses: &[Course],
        index: &mut TodoIndex,
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let policy = &self.options.due_policy;
        let local_now = policy.local_now(now);

        for course in courses {
            for assignment in self.source.assignments(course).await? {
                let key = assignment.key(course);
                if index.contains(&key) {
                    continue;
                }

                let due = policy.normalize(assignment.due_at.as_deref())?;
                if !self.options.admission.admits(due, local_now) {
                    debug!(%key, name = %assignment.name, "Not admitted yet");
                    continue;
                }

                let todo = Todo {
                    uid: Uuid::new_v4().to_string(),
                    summary: assignment.name.clone(),
                    description: Some(build_description(
                        &self.options.description_id_prefix,
                        &key,
                        &course.name,
                    )),
                    due: due.map(|d| policy.due_time(d)),
                    categories: vec![self.options.category.clone()],
                    status: TodoStatus::NeedsAction,
                    completed: None,
                };

                report.actions.push(TodoAction::Create {
                    key,
                    summary: todo.summary.clone(),
                    due: todo.due.clone(),
                });

                if self.options.dry_run {
                    continue;
                }

                info!(%key, summary = %todo.summary, "Creating todo");
                let created = self.store.create_todo(&todo).await?;
                index.insert(key, created);
            }
        }

        Ok(())
    }

    async fn sync_tracked_todos(
        &self,
        courses: &[Course],
        index: &mut TodoIndex,
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let policy = &self.options.due_policy;
        let courses_by_id: HashMap<u64, &Course> = courses.iter().map(|c| (c.id, c)).collect();

        for key in index.keys() {
            let Some(resource) = index.get_mut(&key) else {
                continue;
            };

            // Completed todos are frozen
            if resource.todo.is_completed() {
                report.skipped_completed += 1;
                continue;
            }

            let Some(course) = courses_by_id.get(&key.course_id) else {
                if self.options.skip_inactive_courses {
                    warn!(%key, summary = %resource.todo.summary, "Course is no longer active, skipping");
                    report.skipped_inactive += 1;
                    continue;
                }
                return Err(SyncError::CourseNotActive { key });
            };

            let assignment = self.source.assignment(course, key.assignment_id).await?;
            let due = policy
                .normalize(assignment.due_at.as_deref())?
                .map(|d| policy.due_time(d));

            let mut patch = TodoPatch::new(now);

            if due != resource.todo.due {
                report.actions.push(TodoAction::UpdateDue {
                    key,
                    summary: resource.todo.summary.clone(),
                    old: resource.todo.due.clone(),
                    new: due.clone(),
                });
                patch.due = Some(due);
            }

            let submission = self.source.submission(course, key.assignment_id).await?;
            if submission.is_submitted() {
                report.actions.push(TodoAction::Complete {
                    key,
                    summary: resource.todo.summary.clone(),
                });
                patch.completed = Some(now);
            }

            if patch.is_empty() || self.options.dry_run {
                continue;
            }

            info!(%key, summary = %resource.todo.summary, "Updating todo");
            resource.apply(&patch)?;
            *resource = self.store.update_todo(resource).await?;
        }

        Ok(())
    }
}
