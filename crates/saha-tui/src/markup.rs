//! Slide markup to styled terminal lines.
//!
//! Understands the tags slide content is written with (headings,
//! paragraphs, lists, figures, video frames and alert boxes). Anything
//! else is dropped and only its text is kept, so hand-written legacy
//! markup still reads.

use std::sync::LazyLock;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use regex::Regex;
use saha_shared::content::Severity;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>"]|"[^"]*")*?)\s*(/?)>"#)
        .expect("tag pattern compiles")
});
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_-]+)\s*=\s*"([^"]*)""#).expect("attribute pattern compiles")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

pub fn render_markup(content: &str) -> Vec<Line<'static>> {
    let mut renderer = MarkupRenderer::new();
    let mut last = 0;

    for caps in TOKEN.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        renderer.add_text(&content[last..whole.start()]);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        if closing {
            renderer.close(&name);
        } else {
            renderer.open(&name, attrs);
            if !caps[4].is_empty() {
                renderer.close(&name);
            }
        }
    }
    renderer.add_text(&content[last..]);
    renderer.finish()
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Blue,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
        Severity::Quote => Color::Magenta,
    }
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .map(|c| decode_entities(&c[2]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

enum DivKind {
    Alert(Severity),
    Plain,
}

struct MarkupRenderer {
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    divs: Vec<DivKind>,
    list_depth: usize,
}

impl MarkupRenderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![Style::default().fg(Color::White)],
            divs: Vec::new(),
            list_depth: 0,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let current = self.current_style();
        self.style_stack.push(current.patch(style));
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn alert(&self) -> Option<Severity> {
        self.divs.iter().rev().find_map(|d| match d {
            DivKind::Alert(s) => Some(*s),
            DivKind::Plain => None,
        })
    }

    fn flush_line(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let mut spans = match self.alert() {
            Some(severity) => vec![Span::styled(
                "▌ ",
                Style::default().fg(severity_color(severity)),
            )],
            None => vec![],
        };
        spans.append(&mut self.current_spans);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn push_span(&mut self, text: impl Into<String>, style: Style) {
        self.current_spans.push(Span::styled(text.into(), style));
    }

    fn add_text(&mut self, raw: &str) {
        let text = WHITESPACE.replace_all(raw, " ");
        let text = decode_entities(&text);
        let text = if self.current_spans.is_empty() {
            text.trim_start()
        } else {
            text.as_str()
        };
        if text.is_empty() || text == " " {
            return;
        }
        let style = self.current_style();
        self.push_span(text.to_string(), style);
    }

    fn open(&mut self, name: &str, attrs: &str) {
        match name {
            "h2" => {
                self.blank_line();
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                );
            }
            "h3" | "h4" => {
                self.blank_line();
                self.push_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            }
            "p" => self.flush_line(),
            "strong" | "b" => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            "em" | "i" => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            "br" => self.flush_line(),
            "ul" | "ol" => {
                self.flush_line();
                self.list_depth += 1;
            }
            "li" => {
                self.flush_line();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.push_span(format!("{indent}  • "), Style::default().fg(Color::Cyan));
            }
            "figure" => self.blank_line(),
            "img" => {
                self.flush_line();
                let src = attr(attrs, "src").unwrap_or_default();
                self.push_span("[image] ", Style::default().fg(Color::Green));
                self.push_span(src, Style::default().fg(Color::DarkGray));
                self.flush_line();
            }
            "figcaption" => {
                self.flush_line();
                self.push_style(
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                );
            }
            "iframe" => {
                self.flush_line();
                let src = attr(attrs, "src").unwrap_or_default();
                self.push_span("▶ video ", Style::default().fg(Color::Red));
                self.push_span(src, Style::default().fg(Color::DarkGray));
                self.flush_line();
            }
            "div" => {
                self.flush_line();
                let class = attr(attrs, "class").unwrap_or_default();
                let alert = class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("alert-"))
                    .map(Severity::parse_lossy);
                self.divs.push(match alert {
                    Some(severity) => DivKind::Alert(severity),
                    None => DivKind::Plain,
                });
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "h2" | "h3" | "h4" => {
                self.flush_line();
                self.pop_style();
            }
            "p" => {
                if self.alert().is_some() {
                    self.flush_line();
                } else {
                    self.blank_line();
                }
            }
            "strong" | "b" | "em" | "i" => self.pop_style(),
            "li" => self.flush_line(),
            "ul" | "ol" => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blank_line();
                }
            }
            "figcaption" => {
                self.flush_line();
                self.pop_style();
            }
            "figure" => self.blank_line(),
            "div" => {
                self.flush_line();
                if let Some(DivKind::Alert(_)) = self.divs.pop() {
                    self.blank_line();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn heading_then_paragraph() {
        let lines = render_markup("<h2>Adımlar</h2><p>Önce güvenlik.</p>");
        assert_eq!(text_of(&lines), vec!["Adımlar", "Önce güvenlik."]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn list_items_get_bullets() {
        let lines = render_markup("<ul><li>bir</li><li></li><li>üç</li></ul><p>son</p>");
        assert_eq!(
            text_of(&lines),
            vec!["  • bir", "  • ", "  • üç", "", "son"]
        );
    }

    #[test]
    fn alerts_are_prefixed_with_severity_bar() {
        let lines = render_markup(
            "<div class=\"alert alert-warning\"><strong>Dikkat</strong><p>Kask takın</p></div>",
        );
        assert_eq!(text_of(&lines), vec!["▌ Dikkat", "▌ Kask takın"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn media_shows_sources() {
        let lines = render_markup(
            "<figure class=\"slide-image\"><img src=\"https://cdn/a.png\" alt=\"x\"/><figcaption>Harita</figcaption></figure>\
             <div class=\"slide-video\"><iframe src=\"https://www.youtube.com/embed/abc\" allowfullscreen></iframe></div>",
        );
        assert_eq!(
            text_of(&lines),
            vec![
                "[image] https://cdn/a.png",
                "Harita",
                "",
                "▶ video https://www.youtube.com/embed/abc",
            ]
        );
    }

    #[test]
    fn entities_decode_and_unknown_tags_keep_text() {
        let lines = render_markup("<section><span>a &lt; b &amp; &quot;c&quot;</span></section>");
        assert_eq!(text_of(&lines), vec!["a < b & \"c\""]);
    }

    #[test]
    fn empty_markup_renders_nothing() {
        assert!(render_markup("").is_empty());
    }
}
