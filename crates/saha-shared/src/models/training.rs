use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SLIDE_TITLE: &str = "Introduction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    #[default]
    Text,
    Video,
    Quiz,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub kind: SlideKind,
    /// Free-text label such as "5 dk".
    #[serde(default)]
    pub duration: String,
    /// Serialized markup of the slide's blocks.
    #[serde(default)]
    pub content: String,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind: SlideKind::Text,
            duration: String::new(),
            content: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub page_url: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl Training {
    /// Build a fresh training with its single default slide. The id is
    /// left nil until the store assigns one.
    pub fn draft(
        title: &str,
        category: &str,
        description: &str,
        created_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::nil(),
            title: title.trim().to_string(),
            category: category.trim().to_string(),
            description: description.trim().to_string(),
            page_url: page_url(title, created_at),
            created_by,
            created_at,
            slides: vec![Slide::new(DEFAULT_SLIDE_TITLE)],
        }
    }
}

/// URL-safe slug from a title; Turkish letters fold to their ASCII base.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Unique page address: slug plus creation time in epoch milliseconds.
pub fn page_url(title: &str, created_at: DateTime<Utc>) -> String {
    let slug = slugify(title);
    let stamp = created_at.timestamp_millis();
    if slug.is_empty() {
        format!("egitim-{stamp}")
    } else {
        format!("{slug}-{stamp}")
    }
}
