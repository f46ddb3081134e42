//! Core of the Saha panel: training content authoring and reading, and the
//! task lifecycle with its per-role addressing rules.
//!
//! Everything that persists goes through [`store::Store`]; the session's
//! identity is always passed in as a [`models::Viewer`].

pub mod api;
pub mod content;
pub mod editor;
pub mod error;
pub mod models;
pub mod policy;
pub mod reader;
pub mod store;
pub mod tasks;
pub mod trainings;

pub use error::{CoreError, CoreResult};
