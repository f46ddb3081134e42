//! Edit form for one content block.
//!
//! Text inputs keep their state in `tui_textarea::TextArea`; choice inputs
//! (heading level, alert severity) cycle through their values.

use crossterm::event::{KeyCode, KeyEvent};
use saha_shared::content::{Block, BlockId, BlockKind, BlockType, HeadingLevel, Severity};
use tui_textarea::TextArea;

use crate::editor::{create_textarea, textarea_content, EditorContext};

pub enum FieldInput {
    Text {
        area: TextArea<'static>,
        multiline: bool,
    },
    Level(HeadingLevel),
    Severity(Severity),
}

pub struct FormField {
    pub label: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn text(label: &'static str, value: &str, context: EditorContext) -> Self {
        Self {
            label,
            input: FieldInput::Text {
                area: create_textarea(value, context),
                multiline: context.is_multiline(),
            },
        }
    }

    fn text_value(&self) -> String {
        match &self.input {
            FieldInput::Text { area, multiline } if *multiline => textarea_content(area),
            FieldInput::Text { area, .. } => area.lines().join(" ").trim().to_string(),
            _ => String::new(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.input, FieldInput::Text { .. })
    }
}

pub struct BlockForm {
    pub block_id: BlockId,
    pub block_type: BlockType,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl BlockForm {
    /// `None` for raw markup, which is not editable field by field.
    pub fn from_block(block: &Block) -> Option<Self> {
        use EditorContext::*;

        let fields = match &block.kind {
            BlockKind::Paragraph { text } => vec![FormField::text("Text", text, BlockText)],
            BlockKind::Heading { text, level } => vec![
                FormField::text("Heading", text, SingleLine),
                FormField {
                    label: "Level",
                    input: FieldInput::Level(*level),
                },
            ],
            BlockKind::Image { url, caption } => vec![
                FormField::text("Image URL", url, SingleLine),
                FormField::text("Caption", caption, SingleLine),
            ],
            BlockKind::Video { url } => vec![FormField::text("Video URL", url, SingleLine)],
            BlockKind::Alert {
                severity,
                title,
                text,
            } => vec![
                FormField {
                    label: "Severity",
                    input: FieldInput::Severity(*severity),
                },
                FormField::text("Title (optional)", title.as_deref().unwrap_or(""), SingleLine),
                FormField::text("Text", text, BlockText),
            ],
            BlockKind::List { items } => vec![FormField::text(
                "Items (one per line)",
                &items.join("\n"),
                ListItems,
            )],
            BlockKind::RawMarkup { .. } => return None,
        };

        Some(Self {
            block_id: block.id,
            block_type: block.block_type(),
            fields,
            focus: 0,
        })
    }

    pub fn to_kind(&self) -> BlockKind {
        let text = |i: usize| self.fields.get(i).map(FormField::text_value).unwrap_or_default();

        match self.block_type {
            BlockType::Paragraph => BlockKind::Paragraph { text: text(0) },
            BlockType::Heading => BlockKind::Heading {
                text: text(0),
                level: match self.fields.get(1).map(|f| &f.input) {
                    Some(FieldInput::Level(level)) => *level,
                    _ => HeadingLevel::H2,
                },
            },
            BlockType::Image => BlockKind::Image {
                url: text(0),
                caption: text(1),
            },
            BlockType::Video => BlockKind::Video { url: text(0) },
            BlockType::Alert => {
                let title = text(1);
                BlockKind::Alert {
                    severity: match self.fields.first().map(|f| &f.input) {
                        Some(FieldInput::Severity(severity)) => *severity,
                        _ => Severity::Info,
                    },
                    title: (!title.is_empty()).then_some(title),
                    text: text(2),
                }
            }
            BlockType::List => {
                let items = match self.fields.first().map(|f| &f.input) {
                    Some(FieldInput::Text { area, .. }) => area.lines().to_vec(),
                    _ => Vec::new(),
                };
                BlockKind::List { items }
            }
            BlockType::RawMarkup => BlockKind::RawMarkup {
                markup: String::new(),
            },
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Replace the focused text field, e.g. with the result of an external editor.
    pub fn set_focused_text(&mut self, value: &str) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if let FieldInput::Text { area, multiline } = &mut field.input {
                let context = if *multiline {
                    EditorContext::BlockText
                } else {
                    EditorContext::SingleLine
                };
                *area = create_textarea(value.trim_end_matches('\n'), context);
            }
        }
    }

    pub fn focused_context(&self) -> Option<EditorContext> {
        match self.focused()?.input {
            FieldInput::Text { multiline, .. } if multiline => Some(EditorContext::BlockText),
            FieldInput::Text { .. } => Some(EditorContext::SingleLine),
            _ => None,
        }
    }

    pub fn focused_text(&self) -> Option<String> {
        self.focused()
            .filter(|f| f.is_text())
            .map(FormField::text_value)
    }

    /// Feed a key to the focused input. Field navigation is handled by the
    /// caller.
    pub fn input(&mut self, key: KeyEvent) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.input {
            FieldInput::Text { area, multiline } => {
                if key.code == KeyCode::Enter && !*multiline {
                    return;
                }
                area.input(key);
            }
            FieldInput::Level(level) => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    *level = match level {
                        HeadingLevel::H2 => HeadingLevel::H3,
                        HeadingLevel::H3 => HeadingLevel::H2,
                    };
                }
            }
            FieldInput::Severity(severity) => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    *severity = severity.next();
                }
            }
        }
    }
}
