mod jwt;
mod middleware;
mod password;

pub use jwt::{create_access_token, verify_access_token, Claims};
pub use middleware::auth_middleware;
pub use password::{hash_password, verify_password};
