use serde::{Deserialize, Serialize};

use crate::models::Slide;
use crate::reader::ContentSource;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrainingRequest {
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update; absent fields are left as stored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTrainingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<Slide>>,
}

/// Slides a learner sees, with where they came from.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingContent {
    pub source: ContentSource,
    pub slides: Vec<Slide>,
}
