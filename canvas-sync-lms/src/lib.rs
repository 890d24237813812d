//! Canvas LMS client implementing [`canvas_sync_core::source::AssignmentSource`].

mod client;
mod link;

pub use client::{CanvasClient, User};
