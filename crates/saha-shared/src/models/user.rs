use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four fixed panel roles. Wire names are the Turkish role names used
/// by the field organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Koordinator,
    Sorumlu,
    Izleyici,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Koordinator => "koordinator",
            Self::Sorumlu => "sorumlu",
            Self::Izleyici => "izleyici",
        }
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_manage_trainings(&self) -> bool {
        matches!(self, Self::Admin | Self::Sorumlu)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "id")]
    pub uid: Uuid,
    pub display_name: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Identity of whoever is looking at the panel during one session.
///
/// Handed to the task engine and views explicitly; nothing reads the
/// current user from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub uid: Uuid,
    pub display_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid,
            display_name: user.display_name.clone(),
            role: user.role,
            unit: user.unit.clone(),
        }
    }
}
