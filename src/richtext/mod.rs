//! Prismic rich text
//!
//! Rich text fields arrive as an ordered list of blocks, each carrying its
//! plain text plus inline spans addressed by UTF-16 offsets. This module
//! renders them to plain text (for word counting) and to escaped HTML.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, is_safe_url};

/// One rich text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source (image blocks)
    #[serde(default)]
    pub url: Option<String>,
    /// Image alternative text (image blocks)
    #[serde(default)]
    pub alt: Option<String>,
    /// oEmbed payload (embed blocks)
    #[serde(default)]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// Paragraph with no inline formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text_block(BlockKind::Paragraph, text)
    }

    /// Block of the given kind with no inline formatting
    pub fn text_block(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

/// Block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `[start, end)` in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink,
    #[serde(rename = "label")]
    Label,
    #[serde(other)]
    Unknown,
}

/// Payload of hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Plain text of the blocks, joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render blocks to an HTML fragment
///
/// All text and attribute values are escaped. Consecutive list items are
/// grouped into a single `<ul>`/`<ol>`. Links and images whose URL scheme is
/// not allowed are rendered as plain text or dropped.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list_kind = match block.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
            _ => None,
        };

        if open_list != list_kind {
            if let Some(kind) = open_list {
                out.push_str(list_close(kind));
            }
            if let Some(kind) = list_kind {
                out.push_str(list_open(kind));
            }
            open_list = list_kind;
        }

        render_block(block, &mut out);
    }

    if let Some(kind) = open_list {
        out.push_str(list_close(kind));
    }

    out
}

fn list_open(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OrderedListItem {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OrderedListItem {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn render_block(block: &RichTextBlock, out: &mut String) {
    let tag = match block.kind {
        BlockKind::Paragraph => "p",
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Preformatted => "pre",
        BlockKind::ListItem | BlockKind::OrderedListItem => "li",
        BlockKind::Image => {
            render_image(block, out);
            return;
        }
        BlockKind::Embed => {
            render_embed(block, out);
            return;
        }
        BlockKind::Unknown => {
            tracing::debug!("Skipping unknown rich text block");
            return;
        }
    };

    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&render_spans(&block.text, &block.spans));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_image(block: &RichTextBlock, out: &mut String) {
    let Some(url) = block.url.as_deref().filter(|u| is_safe_url(u)) else {
        return;
    };
    let alt = block.alt.as_deref().unwrap_or("");
    out.push_str(&format!(
        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
        html_escape(url),
        html_escape(alt)
    ));
}

fn render_embed(block: &RichTextBlock, out: &mut String) {
    let Some(embed) = &block.oembed else {
        return;
    };
    let Some(url) = embed.embed_url.as_deref().filter(|u| is_safe_url(u)) else {
        return;
    };
    let kind = embed.kind.as_deref().unwrap_or("link");
    let title = embed.title.as_deref().unwrap_or(url);
    out.push_str(&format!(
        r#"<div data-oembed="{url}" data-oembed-type="{kind}"><a href="{url}" target="_blank" rel="noopener">{title}</a></div>"#,
        url = html_escape(url),
        kind = html_escape(kind),
        title = html_escape(title),
    ));
}

/// Opening and closing markup for a span, if it renders any
fn span_tags(span: &Span) -> Option<(String, &'static str)> {
    let data = span.data.as_ref();
    match span.kind {
        SpanKind::Strong => Some(("<strong>".to_string(), "</strong>")),
        SpanKind::Em => Some(("<em>".to_string(), "</em>")),
        SpanKind::Hyperlink => {
            let url = data?.url.as_deref().filter(|u| is_safe_url(u))?;
            let target = match data?.target.as_deref() {
                Some("_blank") => r#" target="_blank" rel="noopener""#,
                _ => "",
            };
            Some((
                format!(r#"<a href="{}"{}>"#, html_escape(url), target),
                "</a>",
            ))
        }
        SpanKind::Label => {
            let label = data?.label.as_deref()?;
            Some((
                format!(r#"<span class="{}">"#, html_escape(label)),
                "</span>",
            ))
        }
        SpanKind::Unknown => None,
    }
}

/// Render text with its inline spans, keeping the output well nested
fn render_spans(text: &str, spans: &[Span]) -> String {
    let len = text.encode_utf16().count();
    let mut spans: Vec<(&Span, String, &'static str)> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .filter_map(|s| span_tags(s).map(|(open, close)| (s, open, close)))
        .collect();
    // Outer spans (earlier start, later end) open first
    spans.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<usize> = Vec::new();
    let mut next = 0;
    let mut offset = 0;
    let mut chars = text.chars();

    loop {
        close_spans_ending(&spans, &mut stack, offset, &mut out);

        while next < spans.len() && spans[next].0.start <= offset {
            out.push_str(&spans[next].1);
            stack.push(next);
            next += 1;
        }

        match chars.next() {
            Some(c) => {
                push_escaped(c, &mut out);
                offset += c.len_utf16();
            }
            None => break,
        }
    }

    while let Some(i) = stack.pop() {
        out.push_str(spans[i].2);
    }

    out
}

fn close_spans_ending(
    spans: &[(&Span, String, &'static str)],
    stack: &mut Vec<usize>,
    offset: usize,
    out: &mut String,
) {
    let Some(first) = stack.iter().position(|&i| spans[i].0.end <= offset) else {
        return;
    };

    // Close everything above the ending span, then reopen what is still active
    let popped: Vec<usize> = stack.drain(first..).collect();
    for &i in popped.iter().rev() {
        out.push_str(spans[i].2);
    }
    for i in popped {
        if spans[i].0.end > offset {
            out.push_str(&spans[i].1);
            stack.push(i);
        }
    }
}

fn push_escaped(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\n' => out.push_str("<br />"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span {
            start,
            end,
            kind,
            data: None,
        }
    }

    fn link(start: usize, end: usize, url: &str) -> Span {
        Span {
            start,
            end,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                url: Some(url.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_parse_blocks() {
        let json = r#"[
            {"type": "heading2", "text": "Title", "spans": []},
            {"type": "paragraph", "text": "Hello world", "spans": [
                {"start": 0, "end": 5, "type": "strong"},
                {"start": 6, "end": 11, "type": "hyperlink",
                 "data": {"link_type": "Web", "url": "https://example.com", "target": "_blank"}}
            ]},
            {"type": "image", "url": "https://images.prismic.io/a.png", "alt": null,
             "dimensions": {"width": 10, "height": 10}},
            {"type": "slice-of-something", "text": "?"}
        ]"#;
        let blocks: Vec<RichTextBlock> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].kind, BlockKind::Heading2);
        assert_eq!(blocks[1].spans[1].kind, SpanKind::Hyperlink);
        assert_eq!(blocks[2].kind, BlockKind::Image);
        assert_eq!(blocks[2].text, "");
        assert_eq!(blocks[3].kind, BlockKind::Unknown);
    }

    #[test]
    fn test_as_text() {
        let blocks = vec![
            RichTextBlock::paragraph("Hello world."),
            RichTextBlock::paragraph("Second block"),
        ];
        assert_eq!(as_text(&blocks), "Hello world. Second block");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_as_html_blocks() {
        let blocks = vec![
            RichTextBlock::text_block(BlockKind::Heading3, "Intro"),
            RichTextBlock::paragraph("a < b & c"),
            RichTextBlock::text_block(BlockKind::Preformatted, "line 1\nline 2"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<h3>Intro</h3><p>a &lt; b &amp; c</p><pre>line 1<br />line 2</pre>"
        );
    }

    #[test]
    fn test_as_html_groups_lists() {
        let blocks = vec![
            RichTextBlock::text_block(BlockKind::ListItem, "a"),
            RichTextBlock::text_block(BlockKind::ListItem, "b"),
            RichTextBlock::text_block(BlockKind::OrderedListItem, "c"),
            RichTextBlock::paragraph("d"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_spans() {
        let mut block = RichTextBlock::paragraph("Hello brave world");
        block.spans = vec![span(0, 5, SpanKind::Strong), link(6, 17, "https://x.dev")];
        assert_eq!(
            as_html(&[block]),
            r#"<p><strong>Hello</strong> <a href="https://x.dev">brave world</a></p>"#
        );
    }

    #[test]
    fn test_nested_and_overlapping_spans() {
        let mut nested = RichTextBlock::paragraph("abcdef");
        nested.spans = vec![span(1, 3, SpanKind::Em), span(0, 6, SpanKind::Strong)];
        assert_eq!(
            as_html(&[nested]),
            "<p><strong>a<em>bc</em>def</strong></p>"
        );

        let mut overlapping = RichTextBlock::paragraph("abcdef");
        overlapping.spans = vec![span(0, 4, SpanKind::Strong), span(2, 6, SpanKind::Em)];
        assert_eq!(
            as_html(&[overlapping]),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_spans_use_utf16_offsets() {
        // "🚀" is two UTF-16 code units
        let mut block = RichTextBlock::paragraph("🚀 go");
        block.spans = vec![span(3, 5, SpanKind::Em)];
        assert_eq!(as_html(&[block]), "<p>🚀 <em>go</em></p>");
    }

    #[test]
    fn test_unsafe_links_are_plain_text() {
        let mut block = RichTextBlock::paragraph("click me");
        block.spans = vec![link(0, 8, "javascript:alert(1)")];
        assert_eq!(as_html(&[block]), "<p>click me</p>");

        let mut image = RichTextBlock::text_block(BlockKind::Image, "");
        image.url = Some("javascript:alert(1)".to_string());
        assert_eq!(as_html(&[image]), "");
    }

    #[test]
    fn test_image_and_embed() {
        let mut image = RichTextBlock::text_block(BlockKind::Image, "");
        image.url = Some("https://images.prismic.io/a.png".to_string());
        image.alt = Some("a \"cat\"".to_string());

        let mut embed = RichTextBlock::text_block(BlockKind::Embed, "");
        embed.oembed = Some(Embed {
            embed_url: Some("https://youtu.be/x".to_string()),
            kind: Some("video".to_string()),
            title: None,
        });

        assert_eq!(
            as_html(&[image, embed]),
            concat!(
                r#"<p class="block-img"><img src="https://images.prismic.io/a.png" alt="a &quot;cat&quot;" /></p>"#,
                r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video">"#,
                r#"<a href="https://youtu.be/x" target="_blank" rel="noopener">https://youtu.be/x</a></div>"#
            )
        );
    }
}
