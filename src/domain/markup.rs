//! Per-block intermediate markup.

/// Classification of a markup unit for the image grouping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Image,
    Other,
}

/// Markup produced for one content block, index aligned with the block sequence.
///
/// `markup` is `None` when the converter produced something other than text for
/// the block; such units are skipped by the grouping pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupUnit {
    kind: UnitKind,
    markup: Option<String>,
}

impl MarkupUnit {
    pub fn new(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let kind = if is_standalone_image(&markup) {
            UnitKind::Image
        } else {
            UnitKind::Other
        };
        Self {
            kind,
            markup: Some(markup),
        }
    }

    pub fn non_text() -> Self {
        Self {
            kind: UnitKind::Other,
            markup: None,
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_image(&self) -> bool {
        self.kind == UnitKind::Image
    }

    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }
}

/// A standalone image is markdown that opens with `![` and carries a `](` link target.
pub fn is_standalone_image(markup: &str) -> bool {
    markup.starts_with("![") && markup.contains("](")
}
