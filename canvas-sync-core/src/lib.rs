//! Core of canvas-sync.
//!
//! Keeps a CalDAV task list in step with Canvas assignments:
//! - `index` finds the todos this tool created, keyed by `CorrelationKey`
//! - `reconcile` creates todos for upcoming assignments, refreshes due dates and
//!   marks submitted assignments complete
//! - `source` and `store` are the seams to the Canvas and CalDAV clients

pub mod config;
pub mod constants;
pub mod correlation;
pub mod due;
pub mod error;
pub mod ics;
pub mod index;
pub mod policy;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod todo;

pub use correlation::CorrelationKey;
pub use error::{SyncError, SyncResult};
pub use reconcile::{Reconciler, SyncOptions, SyncReport, TodoAction};
