//! Regroups runs of consecutive image units into a single grid container.
//!
//! Every unit is rendered on its own. A maximal run of image units is emitted
//! as one `<div class="{grid_class}">` holding just the `<img>` tag of each
//! rendered image, so the stylesheet can lay the run out as a grid. All other
//! units are emitted exactly as the renderer produced them. The pass keeps one
//! unit of lookahead and never reorders anything.

use std::fmt::Write as _;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::render::html::HtmlRenderer;
use crate::domain::markup::MarkupUnit;

static IMG_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\s+[^>]*?src=["']([^"']+)["'][^>]*?>"#).expect("valid img tag regex")
});

const EXCERPT_CHARS: usize = 80;

/// Non-fatal irregularity observed while grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// An image unit rendered to HTML without a recognisable `<img>` tag.
    /// Its full rendering is kept inside the container.
    ImageExtractionMiss,
    /// Pending images were still open when a non-image unit arrived.
    DanglingImageGroup,
    /// The unit carried no textual markup and was skipped.
    NonTextMarkup,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyKind::ImageExtractionMiss => "image_extraction_miss",
            AnomalyKind::DanglingImageGroup => "dangling_image_group",
            AnomalyKind::NonTextMarkup => "non_text_markup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAnomaly {
    /// Index of the offending unit.
    pub index: usize,
    pub kind: AnomalyKind,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment {
    /// One non-image unit's rendering, verbatim.
    Block(String),
    /// A run of images; each item is an `<img>` tag or, on a miss, the full rendering.
    ImageGrid { class: String, items: Vec<String> },
}

impl RenderedSegment {
    fn write_to(&self, out: &mut String) {
        match self {
            RenderedSegment::Block(html) => out.push_str(html),
            RenderedSegment::ImageGrid { class, items } => {
                let _ = write!(out, "<div class=\"{class}\">");
                for item in items {
                    out.push_str(item);
                }
                out.push_str("</div>");
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedHtml {
    pub segments: Vec<RenderedSegment>,
    pub diagnostics: Vec<RenderAnomaly>,
}

impl GroupedHtml {
    pub fn html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_to(&mut out);
        }
        out
    }

    pub fn image_grids(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, RenderedSegment::ImageGrid { .. }))
            .count()
    }
}

#[derive(Clone)]
pub struct ImageGridGrouper {
    renderer: Arc<dyn HtmlRenderer>,
    grid_class: String,
}

impl ImageGridGrouper {
    pub fn new(renderer: Arc<dyn HtmlRenderer>, grid_class: impl Into<String>) -> Self {
        Self {
            renderer,
            grid_class: grid_class.into(),
        }
    }

    pub fn group(&self, units: &[MarkupUnit]) -> GroupedHtml {
        let mut grouped = GroupedHtml::default();
        // (index, markup) of images awaiting the end of their run.
        let mut pending: Vec<(usize, &str)> = Vec::new();

        for (index, unit) in units.iter().enumerate() {
            let Some(markup) = unit.markup() else {
                grouped.diagnostics.push(RenderAnomaly {
                    index,
                    kind: AnomalyKind::NonTextMarkup,
                    excerpt: String::new(),
                });
                continue;
            };

            if unit.is_image() {
                pending.push((index, markup));
                let run_continues = units.get(index + 1).is_some_and(MarkupUnit::is_image);
                if !run_continues {
                    self.flush(&mut pending, &mut grouped);
                }
                continue;
            }

            if let Some(&(first, first_markup)) = pending.first() {
                grouped.diagnostics.push(RenderAnomaly {
                    index: first,
                    kind: AnomalyKind::DanglingImageGroup,
                    excerpt: excerpt(first_markup),
                });
                self.flush(&mut pending, &mut grouped);
            }

            grouped
                .segments
                .push(RenderedSegment::Block(self.renderer.render(markup)));
        }

        if let Some(&(first, first_markup)) = pending.first() {
            grouped.diagnostics.push(RenderAnomaly {
                index: first,
                kind: AnomalyKind::DanglingImageGroup,
                excerpt: excerpt(first_markup),
            });
            self.flush(&mut pending, &mut grouped);
        }

        grouped
    }

    fn flush(&self, pending: &mut Vec<(usize, &str)>, grouped: &mut GroupedHtml) {
        let mut items = Vec::with_capacity(pending.len());

        for (index, markup) in pending.drain(..) {
            let rendered = self.renderer.render(markup);
            match IMG_TAG.find(&rendered) {
                Some(tag) => items.push(tag.as_str().to_string()),
                None => {
                    grouped.diagnostics.push(RenderAnomaly {
                        index,
                        kind: AnomalyKind::ImageExtractionMiss,
                        excerpt: excerpt(markup),
                    });
                    items.push(rendered);
                }
            }
        }

        grouped.segments.push(RenderedSegment::ImageGrid {
            class: self.grid_class.clone(),
            items,
        });
    }
}

fn excerpt(markup: &str) -> String {
    markup.chars().take(EXCERPT_CHARS).collect()
}
