pub mod auth;
pub mod tasks;
pub mod trainings;
pub mod users;
