//! CalDAV task list implementing [`canvas_sync_core::store::TodoStore`].

mod caldav;
mod store;

pub use caldav::{calendar_href, create_caldav_client, todo_href};
pub use store::CalDavTodoStore;
