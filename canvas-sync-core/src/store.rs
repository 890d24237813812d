//! Todo store (the calendar side of the sync).

use crate::error::SyncResult;
use crate::todo::{Todo, TodoResource};

/// Read/write access to the todos of a single calendar.
#[allow(async_fn_in_trait)]
pub trait TodoStore {
    /// All todos in the calendar, completed ones included
    async fn todos(&self) -> SyncResult<Vec<TodoResource>>;

    async fn create_todo(&self, todo: &Todo) -> SyncResult<TodoResource>;

    /// Persist `resource.raw`, conditional on `resource.etag` when present
    async fn update_todo(&self, resource: &TodoResource) -> SyncResult<TodoResource>;
}
