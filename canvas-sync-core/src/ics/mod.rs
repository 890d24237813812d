//! VTODO parsing, generation and in-place patching.
//!
//! Documents are read and written through the icalendar crate.

mod generate;
mod parse;
mod patch;

pub use generate::generate_ics;
pub use parse::parse_todo;
pub use patch::{TodoPatch, patch_todo};
