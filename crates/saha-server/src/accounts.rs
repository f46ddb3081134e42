//! User accounts as stored in the `users` collection: the public profile
//! plus the password hash, which never leaves the server.

use saha_shared::api::CreateUserRequest;
use saha_shared::models::{Role, User, Viewer};
use saha_shared::store::{self, Collection, Store};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::config::AdminCredentials;
use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

impl StoredUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::from(&self.user)
    }
}

pub async fn find(store: &dyn Store, id: Uuid) -> Result<Option<StoredUser>, AppError> {
    Ok(store::fetch(store, Collection::Users, id).await?)
}

pub async fn find_by_username(
    store: &dyn Store,
    username: &str,
) -> Result<Option<StoredUser>, AppError> {
    let mut found: Vec<StoredUser> =
        store::find_by(store, Collection::Users, "username", json!(username)).await?;
    Ok(found.pop())
}

/// Check credentials; unknown users and wrong passwords look the same.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let account = find_by_username(store, username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(account.user)
}

/// Profiles sorted by display name.
pub async fn list(store: &dyn Store) -> Result<Vec<User>, AppError> {
    let accounts: Vec<StoredUser> = store::fetch_all(store, Collection::Users, None).await?;
    let mut users: Vec<User> = accounts.into_iter().map(|a| a.user).collect();
    users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(users)
}

pub async fn create(store: &dyn Store, req: CreateUserRequest) -> Result<User, AppError> {
    let username = req.username.trim();
    let display_name = req.display_name.trim();
    if username.is_empty() || display_name.is_empty() {
        return Err(AppError::Validation(
            "username and display name are required".to_string(),
        ));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if find_by_username(store, username).await?.is_some() {
        return Err(AppError::Conflict(format!("username {username} is taken")));
    }

    let mut account = StoredUser {
        user: User {
            uid: Uuid::nil(),
            display_name: display_name.to_string(),
            username: username.to_string(),
            role: req.role,
            unit: req.unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
        },
        password_hash: hash_password(&req.password)?,
    };
    account.user.uid = store::insert(store, Collection::Users, &account).await?;

    tracing::info!(user_id = %account.user.uid, role = account.user.role.as_str(), "user created");
    Ok(account.user)
}

pub async fn delete(store: &dyn Store, id: Uuid) -> Result<(), AppError> {
    store.delete(Collection::Users, id).await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(())
}

/// Create the configured admin account unless that username already exists.
pub async fn ensure_admin(store: &dyn Store, creds: &AdminCredentials) -> Result<(), AppError> {
    if find_by_username(store, &creds.username).await?.is_some() {
        return Ok(());
    }
    create(
        store,
        CreateUserRequest {
            username: creds.username.clone(),
            password: creds.password.clone(),
            display_name: "Administrator".to_string(),
            role: Role::Admin,
            unit: None,
        },
    )
    .await?;
    tracing::info!(username = %creds.username, "bootstrap admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use saha_shared::store::MemoryStore;

    fn request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "uzun-parola".to_string(),
            display_name: "Zeynep".to_string(),
            role: Role::Koordinator,
            unit: Some(" Ankara ".to_string()),
        }
    }

    #[tokio::test]
    async fn created_user_can_authenticate() {
        let store = MemoryStore::new();
        let user = create(&store, request("zeynep")).await.unwrap();
        assert_eq!(user.unit.as_deref(), Some("Ankara"));

        let authed = authenticate(&store, "zeynep", "uzun-parola").await.unwrap();
        assert_eq!(authed.uid, user.uid);
        assert_matches!(
            authenticate(&store, "zeynep", "yanlis").await,
            Err(AppError::InvalidCredentials)
        );
        assert_matches!(
            authenticate(&store, "kimse", "uzun-parola").await,
            Err(AppError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        create(&store, request("zeynep")).await.unwrap();
        assert_matches!(create(&store, request("zeynep")).await, Err(AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn profile_serialization_omits_hash() {
        let store = MemoryStore::new();
        let user = create(&store, request("zeynep")).await.unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["id"], json!(user.uid.to_string()));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let store = MemoryStore::new();
        let creds = AdminCredentials {
            username: "admin".into(),
            password: "degistir-beni".into(),
        };
        ensure_admin(&store, &creds).await.unwrap();
        ensure_admin(&store, &creds).await.unwrap();

        let users = list(&store).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
    }
}
