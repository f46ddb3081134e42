use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database URL the server keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub bootstrap_admin: Option<AdminCredentials>,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bootstrap_admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(AdminCredentials { username, password }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expires_in: env::var("JWT_EXPIRES_IN")
                .unwrap_or_else(|_| "86400".to_string()) // one day
                .parse()
                .context("JWT_EXPIRES_IN must be a number of seconds")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a port number")?,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            bootstrap_admin,
        })
    }
}
