use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Task;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_unit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteTaskRequest {
    pub note: String,
}

/// Everything the task screen shows for one viewer.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskBoard {
    pub sent: Vec<Task>,
    pub inbox: Vec<Task>,
    pub personal: Vec<Task>,
    pub unread_count: usize,
}
