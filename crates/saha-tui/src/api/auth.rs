//! The logged-in session kept on disk between runs.
//!
//! Only the access token is secret; the rest lets the client greet a
//! returning user and skip a round-trip when the token has already lapsed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use saha_shared::models::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    /// Taken from the token's `exp` claim when it can be read.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn new(access_token: String, user: &User) -> Self {
        let expires_at = token_expiry(&access_token);
        Self {
            access_token,
            user_id: user.uid,
            username: user.username.clone(),
            role: user.role,
            expires_at,
        }
    }

    /// A token without a readable expiry is left for the server to judge.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// JWT payload claims we need for expiry checking
#[derive(Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Decode the JWT payload without verifying it and read `exp`.
fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;

    DateTime::from_timestamp(claims.exp, 0)
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// `<config dir>/saha/auth.json`
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("saha");
        Ok(Self::at(config_dir.join("auth.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file that no longer parses is removed and treated as no session.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .context("Could not read auth file")?;

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding unreadable session file"
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .context("Could not create config directory")?;
        }
        let contents = serde_json::to_string_pretty(session)
            .context("Could not serialize session")?;

        fs::write(&self.path, contents)
            .context("Could not write auth file")?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .context("Could not delete auth file")?;
        }

        Ok(())
    }
}
