//! Block to markdown conversion.

use crate::domain::blocks::{BlockKind, ContentBlock, RichText, TextSpan};
use crate::domain::markup::MarkupUnit;

/// Converts a block sequence into markup units, one per block and in order.
pub trait MarkupConverter: Send + Sync {
    fn to_markup(&self, blocks: &[ContentBlock]) -> Vec<MarkupUnit>;
}

/// Emits one markdown snippet per block. Unsupported blocks yield an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkupConverter for MarkdownConverter {
    fn to_markup(&self, blocks: &[ContentBlock]) -> Vec<MarkupUnit> {
        let mut ordinal = 0usize;

        blocks
            .iter()
            .map(|block| {
                ordinal = match block.kind {
                    BlockKind::NumberedListItem(_) => ordinal + 1,
                    _ => 0,
                };
                MarkupUnit::new(block_markdown(&block.kind, ordinal))
            })
            .collect()
    }
}

fn block_markdown(kind: &BlockKind, ordinal: usize) -> String {
    match kind {
        BlockKind::Paragraph(text) => rich_text(text),
        BlockKind::Heading { level, text } => {
            format!("{} {}", "#".repeat(usize::from(*level)), rich_text(text))
        }
        BlockKind::BulletedListItem(text) => format!("- {}", rich_text(text)),
        BlockKind::NumberedListItem(text) => format!("{ordinal}. {}", rich_text(text)),
        BlockKind::ToDo { checked, text } => {
            let mark = if *checked { 'x' } else { ' ' };
            format!("- [{mark}] {}", rich_text(text))
        }
        BlockKind::Quote(text) => quoted(&rich_text(text)),
        BlockKind::Callout { icon, text } => match icon {
            Some(icon) => quoted(&format!("{icon} {}", rich_text(text))),
            None => quoted(&rich_text(text)),
        },
        BlockKind::Code { language, text } => {
            format!("```{language}\n{}\n```", text.plain_text())
        }
        BlockKind::Divider => "---".to_string(),
        BlockKind::Image { url, caption } => format!("![{}]({url})", caption.plain_text()),
        BlockKind::Bookmark { url, caption } => {
            let label = if caption.is_empty() {
                url.clone()
            } else {
                caption.plain_text()
            };
            format!("[{label}]({url})")
        }
        BlockKind::Equation { expression } => format!("$$\n{expression}\n$$"),
        BlockKind::Unsupported { .. } => String::new(),
    }
}

fn quoted(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rich_text(text: &RichText) -> String {
    text.0.iter().map(span_markdown).collect()
}

fn span_markdown(span: &TextSpan) -> String {
    let content = span.plain_text.as_str();
    // Emphasis markers must hug the text, so surrounding whitespace stays outside.
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];

    let annotations = &span.annotations;
    let mut out = trimmed.to_string();
    if annotations.code {
        out = format!("`{out}`");
    }
    if annotations.bold {
        out = format!("**{out}**");
    }
    if annotations.italic {
        out = format!("_{out}_");
    }
    if annotations.strikethrough {
        out = format!("~~{out}~~");
    }
    if let Some(href) = &span.href {
        out = format!("[{out}]({href})");
    }

    format!("{leading}{out}{trailing}")
}
