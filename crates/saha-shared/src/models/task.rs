use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Role, Viewer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_unit: Option<String>,
    pub assigned_by: Uuid,
    pub sender_name: String,
    pub sender_role: Role,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task with neither a user nor a unit addressee reaches nobody.
    pub fn is_addressed(&self) -> bool {
        self.assigned_to_user_id.is_some() || self.assigned_to_unit.is_some()
    }

    pub fn is_assigned_to(&self, viewer: &Viewer) -> bool {
        self.assigned_to_user_id == Some(viewer.uid)
    }

    pub fn is_for_unit_of(&self, viewer: &Viewer) -> bool {
        match (&self.assigned_to_unit, &viewer.unit) {
            (Some(task_unit), Some(unit)) => task_unit == unit,
            _ => false,
        }
    }

    pub fn is_personal_note(&self) -> bool {
        self.assigned_to_user_id == Some(self.assigned_by)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_unread(&self) -> bool {
        self.is_pending() && self.read_at.is_none()
    }
}
