use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;
use tui_textarea::{CursorMove, TextArea};

/// What a text input is used for; decides line handling and the temp
/// file suffix for the external editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorContext {
    TaskDescription,
    CompletionNote,
    BlockText,
    ListItems,
    SingleLine,
}

impl EditorContext {
    pub fn is_multiline(&self) -> bool {
        !matches!(self, Self::SingleLine)
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::BlockText | Self::ListItems => ".html",
            _ => ".txt",
        }
    }
}

/// Create a TextArea holding `content` with the cursor at the end
pub fn create_textarea(content: &str, context: EditorContext) -> TextArea<'static> {
    let lines: Vec<String> = if context.is_multiline() {
        content.lines().map(str::to_string).collect()
    } else {
        vec![content.lines().collect::<Vec<_>>().join(" ")]
    };

    let mut textarea = if lines.is_empty() {
        TextArea::default()
    } else {
        TextArea::new(lines)
    };

    textarea.move_cursor(CursorMove::Bottom);
    textarea.move_cursor(CursorMove::End);
    textarea.set_max_histories(100);

    textarea
}

/// Extract content from TextArea as a single String
pub fn textarea_content(textarea: &TextArea) -> String {
    textarea.lines().join("\n")
}

/// Launch external editor with current content, return edited content
pub fn launch_external_editor(content: &str, context: EditorContext) -> Result<String> {
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "vi".to_string());

    let mut temp_file = NamedTempFile::with_suffix(context.file_extension())?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    let temp_path = temp_file.path().to_path_buf();

    // Leave TUI mode
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    let status = Command::new(&editor).arg(&temp_path).status();

    // Restore TUI mode (always, even on error)
    let restore_result = (|| -> Result<()> {
        execute!(io::stdout(), EnterAlternateScreen)?;
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        enable_raw_mode()?;
        Ok(())
    })();

    if let Err(e) = restore_result {
        anyhow::bail!("Failed to restore terminal: {}", e);
    }

    match status {
        Ok(exit_status) if exit_status.success() => {
            let edited = std::fs::read_to_string(&temp_path)?;
            tracing::debug!(editor = %editor, bytes = edited.len(), "external edit finished");
            Ok(edited)
        }
        Ok(exit_status) => {
            anyhow::bail!("Editor exited with status: {}", exit_status)
        }
        Err(e) => {
            anyhow::bail!("Failed to launch editor '{}': {}", editor, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_content_keeps_lines() {
        let area = create_textarea("bir\n\nüç", EditorContext::ListItems);
        assert_eq!(area.lines(), ["bir", "", "üç"]);
        assert_eq!(textarea_content(&area), "bir\n\nüç");
    }

    #[test]
    fn single_line_content_is_joined() {
        let area = create_textarea("https://a\nb", EditorContext::SingleLine);
        assert_eq!(area.lines(), ["https://a b"]);
    }

    #[test]
    fn empty_content_gives_one_empty_line() {
        let area = create_textarea("", EditorContext::CompletionNote);
        assert_eq!(textarea_content(&area), "");
        assert_eq!(area.lines().len(), 1);
    }
}
