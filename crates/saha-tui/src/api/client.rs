use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use saha_shared::api::{
    AuthResponse, CompleteTaskRequest, CreateTaskRequest, CreateTrainingRequest, LoginRequest,
    TaskBoard, TrainingContent, UpdateTrainingRequest,
};
use saha_shared::models::{Slide, Task, Training, User};
use uuid::Uuid;

use super::auth::{SessionFile, StoredSession};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Not permitted: {0}")]
    Forbidden(String),
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// What was found on disk at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// A token the server still has to confirm.
    Active,
    /// The token has lapsed; the user only has to enter a password again.
    Expired { username: String },
    Missing,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    session_file: SessionFile,
    session: Option<StoredSession>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_file: SessionFile::default_location()?,
            session: None,
        })
    }

    /// Pick up the session saved by an earlier run. A lapsed one is
    /// dropped here instead of being sent to the server.
    pub fn restore_session(&mut self) -> Result<SessionStatus> {
        let Some(session) = self.session_file.load()? else {
            return Ok(SessionStatus::Missing);
        };
        tracing::debug!(
            path = %self.session_file.path().display(),
            username = %session.username,
            role = session.role.as_str(),
            "found stored session"
        );

        if session.is_expired(Utc::now()) {
            self.session_file.clear()?;
            return Ok(SessionStatus::Expired {
                username: session.username,
            });
        }
        self.session = Some(session);
        Ok(SessionStatus::Active)
    }

    pub fn session(&self) -> Option<&StoredSession> {
        self.session.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// The bearer token, unless missing or already expired. There is no
    /// refresh; an expired session means logging in again.
    fn bearer(&self) -> Result<String, ApiError> {
        let session = self.session.as_ref().ok_or(ApiError::Unauthorized)?;
        if session.is_expired(Utc::now()) {
            tracing::debug!("access token expired");
            return Err(ApiError::Unauthorized);
        }
        Ok(format!("Bearer {}", session.access_token))
    }

    // ============ Authenticated Request Helpers ============

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        request
            .header("Authorization", self.bearer()?)
            .send()
            .await
            .map_err(ApiError::Network)
    }

    async fn authed_get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn authed_post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn authed_patch<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        self.send(self.client.patch(self.url(path)).json(body)).await
    }

    async fn authed_delete(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        self.send(self.client.delete(self.url(path))).await
    }

    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(message)
            }
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Server(format!("{}: {}", status, message)),
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                response.json().await.map_err(ApiError::Network)
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(Self::error_from(response).await),
        }
    }

    // ============ Auth ============

    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, ApiError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&req)
            .send()
            .await?;

        let auth: AuthResponse = self.handle_response(response).await?;

        let session = StoredSession::new(auth.access_token, &auth.user);
        self.session_file.save(&session)?;
        self.session = Some(session);

        tracing::info!(user_id = %auth.user.uid, "logged in");
        Ok(auth.user)
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.authed_get("/auth/me").await?;
        self.handle_response(response).await
    }

    /// Forget the session locally.
    pub fn logout(&mut self) -> Result<(), ApiError> {
        self.session = None;
        self.session_file.clear()?;
        Ok(())
    }

    // ============ Users ============

    /// Users the current session may address a task to.
    pub async fn addressable_users(&self) -> Result<Vec<User>, ApiError> {
        let response = self.authed_get("/users?addressable=true").await?;
        self.handle_response(response).await
    }

    // ============ Tasks ============

    pub async fn task_board(&self) -> Result<TaskBoard, ApiError> {
        let response = self.authed_get("/tasks").await?;
        self.handle_response(response).await
    }

    pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, ApiError> {
        let response = self.authed_post("/tasks", req).await?;
        self.handle_response(response).await
    }

    /// Fetch a task; the server marks it read for its addressee.
    pub async fn open_task(&self, task_id: Uuid) -> Result<Task, ApiError> {
        let response = self.authed_get(&format!("/tasks/{}", task_id)).await?;
        self.handle_response(response).await
    }

    pub async fn complete_task(&self, task_id: Uuid, note: &str) -> Result<Task, ApiError> {
        let req = CompleteTaskRequest {
            note: note.to_string(),
        };
        let response = self
            .authed_post(&format!("/tasks/{}/complete", task_id), &req)
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), ApiError> {
        let response = self.authed_delete(&format!("/tasks/{}", task_id)).await?;
        self.handle_empty_response(response).await
    }

    // ============ Trainings ============

    pub async fn list_trainings(&self) -> Result<Vec<Training>, ApiError> {
        let response = self.authed_get("/trainings").await?;
        self.handle_response(response).await
    }

    pub async fn create_training(&self, title: &str) -> Result<Training, ApiError> {
        let req = CreateTrainingRequest {
            title: title.to_string(),
            category: String::new(),
            description: String::new(),
        };
        let response = self.authed_post("/trainings", &req).await?;
        self.handle_response(response).await
    }

    pub async fn get_training(&self, training_id: Uuid) -> Result<Training, ApiError> {
        let response = self
            .authed_get(&format!("/trainings/{}", training_id))
            .await?;
        self.handle_response(response).await
    }

    pub async fn training_content(&self, training_id: Uuid) -> Result<TrainingContent, ApiError> {
        let response = self
            .authed_get(&format!("/trainings/{}/content", training_id))
            .await?;
        self.handle_response(response).await
    }

    pub async fn save_slides(
        &self,
        training_id: Uuid,
        slides: &[Slide],
    ) -> Result<Training, ApiError> {
        let req = UpdateTrainingRequest {
            slides: Some(slides.to_vec()),
            ..Default::default()
        };
        let response = self
            .authed_patch(&format!("/trainings/{}", training_id), &req)
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete_training(&self, training_id: Uuid) -> Result<(), ApiError> {
        let response = self
            .authed_delete(&format!("/trainings/{}", training_id))
            .await?;
        self.handle_empty_response(response).await
    }
}
