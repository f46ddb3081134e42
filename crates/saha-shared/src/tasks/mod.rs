//! Task lifecycle (create, read, complete, delete) and per-viewer lists.

mod engine;
mod views;

pub use engine::{TaskDraft, TaskEngine};
pub use views::TaskViews;
