use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a block inside one slide. Handed out by the editor from a
/// counter that only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    #[default]
    H2,
    H3,
}

impl HeadingLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Quote,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Self::Info,
        Self::Success,
        Self::Warning,
        Self::Error,
        Self::Quote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Quote => "quote",
        }
    }

    /// Unknown names fall back to `Info`.
    pub fn parse_lossy(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse_lossy(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading,
    Image,
    Video,
    Alert,
    List,
    RawMarkup,
}

impl BlockType {
    /// Types an author can add; raw markup only ever comes from stored content.
    pub const AUTHORABLE: [BlockType; 6] = [
        Self::Paragraph,
        Self::Heading,
        Self::Image,
        Self::Video,
        Self::Alert,
        Self::List,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Paragraph => "Paragraph",
            Self::Heading => "Heading",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Alert => "Alert",
            Self::List => "List",
            Self::RawMarkup => "Markup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph {
        text: String,
    },
    Heading {
        text: String,
        #[serde(default)]
        level: HeadingLevel,
    },
    Image {
        url: String,
        #[serde(default)]
        caption: String,
    },
    Video {
        url: String,
    },
    Alert {
        #[serde(default)]
        severity: Severity,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        text: String,
    },
    List {
        items: Vec<String>,
    },
    RawMarkup {
        markup: String,
    },
}

impl BlockKind {
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Paragraph => Self::Paragraph {
                text: String::new(),
            },
            BlockType::Heading => Self::Heading {
                text: String::new(),
                level: HeadingLevel::H2,
            },
            BlockType::Image => Self::Image {
                url: String::new(),
                caption: String::new(),
            },
            BlockType::Video => Self::Video { url: String::new() },
            BlockType::Alert => Self::Alert {
                severity: Severity::Info,
                title: None,
                text: String::new(),
            },
            BlockType::List => Self::List {
                items: vec![String::new()],
            },
            BlockType::RawMarkup => Self::RawMarkup {
                markup: String::new(),
            },
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Paragraph { .. } => BlockType::Paragraph,
            Self::Heading { .. } => BlockType::Heading,
            Self::Image { .. } => BlockType::Image,
            Self::Video { .. } => BlockType::Video,
            Self::Alert { .. } => BlockType::Alert,
            Self::List { .. } => BlockType::List,
            Self::RawMarkup { .. } => BlockType::RawMarkup,
        }
    }

    /// Restore the list invariant: at least one (possibly empty) item.
    pub fn normalized(self) -> Self {
        match self {
            Self::List { items } if items.is_empty() => Self::List {
                items: vec![String::new()],
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind: kind.normalized(),
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_severity_reads_as_info() {
        let kind: BlockKind = serde_json::from_value(json!({
            "type": "alert",
            "severity": "catastrophic",
            "text": "dikkat"
        }))
        .unwrap();
        assert_eq!(
            kind,
            BlockKind::Alert {
                severity: Severity::Info,
                title: None,
                text: "dikkat".to_string(),
            }
        );
    }

    #[test]
    fn block_serializes_flat_with_type_tag() {
        let block = Block::new(
            BlockId(7),
            BlockKind::Heading {
                text: "Amaç".to_string(),
                level: HeadingLevel::H3,
            },
        );
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({ "id": 7, "type": "heading", "text": "Amaç", "level": "h3" })
        );
    }

    #[test]
    fn empty_list_is_normalized_to_one_item() {
        let block = Block::new(BlockId(1), BlockKind::List { items: vec![] });
        assert_eq!(
            block.kind,
            BlockKind::List {
                items: vec![String::new()]
            }
        );
    }

    #[test]
    fn severity_cycles_through_all() {
        let mut s = Severity::Info;
        for _ in 0..Severity::ALL.len() {
            s = s.next();
        }
        assert_eq!(s, Severity::Info);
    }
}
