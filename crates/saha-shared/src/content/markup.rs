//! Blocks → HTML. Write-only: stored markup is never parsed back into
//! structured blocks, it is carried whole as one raw block instead.

use super::block::{Block, BlockId, BlockKind};

const VIDEO_EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Render blocks in order. Pure and deterministic; a block that cannot be
/// rendered contributes nothing instead of failing the document.
pub fn serialize(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        render_block(&block.kind, &mut out);
    }
    out
}

/// Render a single block, the same way [`serialize`] does.
pub fn render(kind: &BlockKind) -> String {
    let mut out = String::new();
    render_block(kind, &mut out);
    out
}

fn render_block(kind: &BlockKind, out: &mut String) {
    match kind {
        BlockKind::Paragraph { text } => {
            if !text.is_empty() {
                out.push_str(&format!("<p>{}</p>", escape(text)));
            }
        }
        BlockKind::Heading { text, level } => {
            let tag = level.tag();
            out.push_str(&format!("<{tag}>{}</{tag}>", escape(text)));
        }
        BlockKind::Image { url, caption } => {
            let url = url.trim();
            if url.is_empty() {
                return;
            }
            out.push_str(&format!(
                "<figure class=\"slide-image\"><img src=\"{}\" alt=\"{}\"/>",
                escape(url),
                escape(caption)
            ));
            if !caption.is_empty() {
                out.push_str(&format!("<figcaption>{}</figcaption>", escape(caption)));
            }
            out.push_str("</figure>");
        }
        BlockKind::Video { url } => {
            if let Some(id) = video_id(url) {
                out.push_str(&format!(
                    "<div class=\"slide-video\"><iframe src=\"{VIDEO_EMBED_BASE}{}\" allowfullscreen></iframe></div>",
                    escape(id)
                ));
            }
        }
        BlockKind::Alert {
            severity,
            title,
            text,
        } => {
            out.push_str(&format!("<div class=\"alert alert-{}\">", severity.as_str()));
            if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
                out.push_str(&format!("<strong>{}</strong>", escape(title)));
            }
            out.push_str(&format!("<p>{}</p></div>", escape(text)));
        }
        BlockKind::List { items } => {
            if items.is_empty() {
                return;
            }
            out.push_str("<ul>");
            for item in items {
                out.push_str(&format!("<li>{}</li>", escape(item)));
            }
            out.push_str("</ul>");
        }
        BlockKind::RawMarkup { markup } => out.push_str(markup),
    }
}

/// Video id from a share link: the text after the first `v=` up to the
/// next `&`. `None` when there is no such token or it is empty.
pub fn video_id(url: &str) -> Option<&str> {
    let start = url.find("v=")? + 2;
    let rest = &url[start..];
    let id = rest.split('&').next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// The one-way boundary from stored markup back to editable blocks.
pub fn blocks_from_markup(content: &str, id: BlockId) -> Vec<Block> {
    let kind = if content.is_empty() {
        BlockKind::Paragraph {
            text: String::new(),
        }
    } else {
        BlockKind::RawMarkup {
            markup: content.to_string(),
        }
    };
    vec![Block::new(id, kind)]
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{HeadingLevel, Severity};

    fn block(id: u64, kind: BlockKind) -> Block {
        Block::new(BlockId(id), kind)
    }

    #[test]
    fn each_block_type_renders_its_wrapper() {
        let cases = [
            (
                BlockKind::Paragraph {
                    text: "Merhaba".into(),
                },
                "<p>Merhaba</p>",
            ),
            (
                BlockKind::Heading {
                    text: "Giriş".into(),
                    level: HeadingLevel::H3,
                },
                "<h3>Giriş</h3>",
            ),
            (
                BlockKind::Image {
                    url: "https://cdn.example/a.png".into(),
                    caption: "Saha".into(),
                },
                "<figure class=\"slide-image\"><img src=\"https://cdn.example/a.png\" alt=\"Saha\"/><figcaption>Saha</figcaption></figure>",
            ),
            (
                BlockKind::Image {
                    url: "https://cdn.example/a.png".into(),
                    caption: String::new(),
                },
                "<figure class=\"slide-image\"><img src=\"https://cdn.example/a.png\" alt=\"\"/></figure>",
            ),
            (
                BlockKind::Video {
                    url: "https://www.youtube.com/watch?v=abc123&t=42".into(),
                },
                "<div class=\"slide-video\"><iframe src=\"https://www.youtube.com/embed/abc123\" allowfullscreen></iframe></div>",
            ),
            (
                BlockKind::Alert {
                    severity: Severity::Warning,
                    title: Some("Dikkat".into()),
                    text: "Kask takın".into(),
                },
                "<div class=\"alert alert-warning\"><strong>Dikkat</strong><p>Kask takın</p></div>",
            ),
            (
                BlockKind::List {
                    items: vec!["bir".into(), String::new()],
                },
                "<ul><li>bir</li><li></li></ul>",
            ),
            (
                BlockKind::RawMarkup {
                    markup: "<section>eski</section>".into(),
                },
                "<section>eski</section>",
            ),
        ];

        for (kind, expected) in cases {
            assert_eq!(render(&kind), expected, "rendering {kind:?}");
        }
    }

    #[test]
    fn video_without_id_token_is_skipped() {
        assert_eq!(video_id("https://youtu.be/abc123"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?v=&x=1"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?feature=share&v=zz9"), Some("zz9"));

        let blocks = vec![
            block(
                1,
                BlockKind::Video {
                    url: "https://youtu.be/abc".into(),
                },
            ),
            block(
                2,
                BlockKind::Paragraph {
                    text: "sonra".into(),
                },
            ),
        ];
        assert_eq!(serialize(&blocks), "<p>sonra</p>");
    }

    #[test]
    fn placeholders_and_malformed_blocks_contribute_nothing() {
        let blocks = vec![
            block(
                1,
                BlockKind::Paragraph {
                    text: String::new(),
                },
            ),
            block(
                2,
                BlockKind::Image {
                    url: "  ".into(),
                    caption: "x".into(),
                },
            ),
            Block {
                id: BlockId(3),
                kind: BlockKind::List { items: vec![] },
            },
        ];
        assert_eq!(serialize(&blocks), "");
    }

    #[test]
    fn text_is_escaped_but_raw_markup_is_not() {
        let blocks = vec![
            block(
                1,
                BlockKind::Paragraph {
                    text: "a < b & \"c\"".into(),
                },
            ),
            block(
                2,
                BlockKind::RawMarkup {
                    markup: "<b>&amp;</b>".into(),
                },
            ),
        ];
        assert_eq!(serialize(&blocks), "<p>a &lt; b &amp; &quot;c&quot;</p><b>&amp;</b>");
    }

    #[test]
    fn unknown_severity_uses_info_style() {
        let kind: BlockKind = serde_json::from_str(
            r#"{"type":"alert","severity":"purple","title":"","text":"t"}"#,
        )
        .unwrap();
        assert_eq!(render(&kind), "<div class=\"alert alert-info\"><p>t</p></div>");
    }

    #[test]
    fn serialize_is_deterministic() {
        let blocks = vec![
            block(
                1,
                BlockKind::Heading {
                    text: "Başlık".into(),
                    level: HeadingLevel::H2,
                },
            ),
            block(
                2,
                BlockKind::List {
                    items: vec!["a".into(), "b".into()],
                },
            ),
            block(
                3,
                BlockKind::Alert {
                    severity: Severity::Quote,
                    title: None,
                    text: "söz".into(),
                },
            ),
        ];
        let first = serialize(&blocks);
        assert_eq!(first, serialize(&blocks));
        assert_eq!(
            first,
            "<h2>Başlık</h2><ul><li>a</li><li>b</li></ul><div class=\"alert alert-quote\"><p>söz</p></div>"
        );
    }

    #[test]
    fn markup_boundary_wraps_whole_content() {
        let blocks = blocks_from_markup("<h2>x</h2><p>y</p>", BlockId(9));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, BlockId(9));
        assert_eq!(serialize(&blocks), "<h2>x</h2><p>y</p>");

        let empty = blocks_from_markup("", BlockId(10));
        assert_eq!(
            empty[0].kind,
            BlockKind::Paragraph {
                text: String::new()
            }
        );
    }
}
