//! HTTP service for the Saha panel: identity, users, trainings and tasks
//! over a pluggable document store.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod store;

pub use config::Config;
pub use routes::{create_router, AppState};
