mod auth;
mod tasks;
mod trainings;
mod users;

pub use auth::*;
pub use tasks::*;
pub use trainings::*;
pub use users::*;
