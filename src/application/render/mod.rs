//! Block sequence to body HTML.

pub mod grouping;
pub mod html;
pub mod markup;

use std::sync::Arc;

pub use grouping::{AnomalyKind, GroupedHtml, ImageGridGrouper, RenderAnomaly, RenderedSegment};
pub use html::{ComrakHtmlRenderer, HtmlRenderer};
pub use markup::{MarkdownConverter, MarkupConverter};

use crate::domain::blocks::ContentBlock;

/// Converts blocks to markup units and groups them into body HTML.
#[derive(Clone)]
pub struct BodyRenderer {
    converter: Arc<dyn MarkupConverter>,
    grouper: ImageGridGrouper,
}

impl BodyRenderer {
    pub fn new(converter: Arc<dyn MarkupConverter>, grouper: ImageGridGrouper) -> Self {
        Self { converter, grouper }
    }

    /// Markdown conversion and comrak rendering with the given grid class.
    pub fn with_defaults(grid_class: impl Into<String>) -> Self {
        Self::new(
            Arc::new(MarkdownConverter),
            ImageGridGrouper::new(Arc::new(ComrakHtmlRenderer::new()), grid_class),
        )
    }

    pub fn render(&self, blocks: &[ContentBlock]) -> GroupedHtml {
        let units = self.converter.to_markup(blocks);
        self.grouper.group(&units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blocks::{BlockKind, RichText, TextSpan};

    fn paragraph(id: &str, text: &str) -> ContentBlock {
        ContentBlock::new(
            id,
            BlockKind::Paragraph(RichText(vec![TextSpan {
                plain_text: text.to_string(),
                ..TextSpan::default()
            }])),
        )
    }

    fn image(id: &str, url: &str) -> ContentBlock {
        ContentBlock::new(
            id,
            BlockKind::Image {
                url: url.to_string(),
                caption: RichText::default(),
            },
        )
    }

    #[test]
    fn blocks_render_end_to_end() {
        let renderer = BodyRenderer::with_defaults("blog-image-grid");
        let grouped = renderer.render(&[
            image("1", "https://x/a.png"),
            image("2", "https://x/b.png"),
            paragraph("3", "Hello"),
        ]);

        assert_eq!(
            grouped.html(),
            "<div class=\"blog-image-grid\"><img src=\"https://x/a.png\" alt=\"\" />\
             <img src=\"https://x/b.png\" alt=\"\" /></div><p>Hello</p>\n"
        );
        assert!(grouped.diagnostics.is_empty());
    }

    #[test]
    fn unsupported_blocks_render_to_nothing() {
        let renderer = BodyRenderer::with_defaults("grid");
        let grouped = renderer.render(&[ContentBlock::new(
            "t",
            BlockKind::Unsupported {
                type_tag: "table".to_string(),
            },
        )]);
        assert_eq!(grouped.html(), "");
    }
}
