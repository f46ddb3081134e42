mod task;
mod training;
mod user;

pub use task::*;
pub use training::*;
pub use user::*;
