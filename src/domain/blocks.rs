//! Typed content blocks and their decoding from Notion block objects.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Text annotations carried by a rich-text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextSpan {
    pub plain_text: String,
    pub href: Option<String>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<TextSpan>);

impl RichText {
    pub fn plain_text(&self) -> String {
        self.0.iter().map(|span| span.plain_text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|span| span.plain_text.is_empty())
    }
}

/// The block types the pipeline understands. Anything else decodes to `Unsupported`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph(RichText),
    Heading { level: u8, text: RichText },
    BulletedListItem(RichText),
    NumberedListItem(RichText),
    ToDo { checked: bool, text: RichText },
    Quote(RichText),
    Callout { icon: Option<String>, text: RichText },
    Code { language: String, text: RichText },
    Divider,
    Image { url: String, caption: RichText },
    Bookmark { url: String, caption: RichText },
    Equation { expression: String },
    Unsupported { type_tag: String },
}

/// One element of an entry's body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub id: String,
    pub kind: BlockKind,
}

impl ContentBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn type_tag(&self) -> &str {
        match &self.kind {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading { level: 1, .. } => "heading_1",
            BlockKind::Heading { level: 2, .. } => "heading_2",
            BlockKind::Heading { .. } => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo { .. } => "to_do",
            BlockKind::Quote(_) => "quote",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Code { .. } => "code",
            BlockKind::Divider => "divider",
            BlockKind::Image { .. } => "image",
            BlockKind::Bookmark { .. } => "bookmark",
            BlockKind::Equation { .. } => "equation",
            BlockKind::Unsupported { type_tag } => type_tag.as_str(),
        }
    }

    /// Decode a raw block object. Payloads that do not match the expected
    /// shape for their type decode as `Unsupported` rather than failing.
    pub fn from_raw(raw: &Value) -> Self {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let type_tag = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let payload = raw.get(type_tag).cloned().unwrap_or(Value::Object(Map::new()));

        let kind = decode_kind(type_tag, payload).unwrap_or_else(|| BlockKind::Unsupported {
            type_tag: type_tag.to_string(),
        });

        Self { id, kind }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextPayload {
    rich_text: RichText,
    checked: bool,
    language: String,
    icon: Option<IconPayload>,
}

#[derive(Debug, Deserialize)]
struct IconPayload {
    emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    #[serde(rename = "type")]
    source: String,
    external: Option<FileRef>,
    file: Option<FileRef>,
    #[serde(default)]
    caption: RichText,
}

#[derive(Debug, Deserialize)]
struct BookmarkPayload {
    url: String,
    #[serde(default)]
    caption: RichText,
}

#[derive(Debug, Deserialize)]
struct EquationPayload {
    expression: String,
}

fn decode_kind(type_tag: &str, payload: Value) -> Option<BlockKind> {
    let kind = match type_tag {
        "paragraph" => BlockKind::Paragraph(text_payload(payload)?.rich_text),
        "heading_1" | "heading_2" | "heading_3" => {
            let level = match type_tag {
                "heading_1" => 1,
                "heading_2" => 2,
                _ => 3,
            };
            BlockKind::Heading {
                level,
                text: text_payload(payload)?.rich_text,
            }
        }
        "bulleted_list_item" => BlockKind::BulletedListItem(text_payload(payload)?.rich_text),
        "numbered_list_item" => BlockKind::NumberedListItem(text_payload(payload)?.rich_text),
        "to_do" => {
            let text = text_payload(payload)?;
            BlockKind::ToDo {
                checked: text.checked,
                text: text.rich_text,
            }
        }
        "quote" => BlockKind::Quote(text_payload(payload)?.rich_text),
        "callout" => {
            let text = text_payload(payload)?;
            BlockKind::Callout {
                icon: text.icon.and_then(|icon| icon.emoji),
                text: text.rich_text,
            }
        }
        "code" => {
            let text = text_payload(payload)?;
            BlockKind::Code {
                language: text.language,
                text: text.rich_text,
            }
        }
        "divider" => BlockKind::Divider,
        "image" => {
            let image: ImagePayload = serde_json::from_value(payload).ok()?;
            let file = match image.source.as_str() {
                "external" => image.external,
                _ => image.file,
            }?;
            BlockKind::Image {
                url: file.url,
                caption: image.caption,
            }
        }
        "bookmark" => {
            let bookmark: BookmarkPayload = serde_json::from_value(payload).ok()?;
            BlockKind::Bookmark {
                url: bookmark.url,
                caption: bookmark.caption,
            }
        }
        "equation" => {
            let equation: EquationPayload = serde_json::from_value(payload).ok()?;
            BlockKind::Equation {
                expression: equation.expression,
            }
        }
        _ => return None,
    };
    Some(kind)
}

fn text_payload(payload: Value) -> Option<TextPayload> {
    serde_json::from_value(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span(text: &str) -> Value {
        json!({
            "type": "text",
            "text": { "content": text, "link": null },
            "annotations": { "bold": false, "italic": false, "strikethrough": false,
                             "underline": false, "code": false, "color": "default" },
            "plain_text": text,
            "href": null
        })
    }

    #[test]
    fn decodes_paragraph_rich_text() {
        let raw = json!({
            "object": "block",
            "id": "b1",
            "type": "paragraph",
            "paragraph": { "rich_text": [span("Hello "), span("world")], "color": "default" }
        });

        let block = ContentBlock::from_raw(&raw);
        assert_eq!(block.id, "b1");
        match block.kind {
            BlockKind::Paragraph(text) => assert_eq!(text.plain_text(), "Hello world"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn decodes_external_and_hosted_images() {
        let external = json!({
            "id": "img1",
            "type": "image",
            "image": { "type": "external", "external": { "url": "https://cdn/a.png" },
                       "caption": [span("A")] }
        });
        let hosted = json!({
            "id": "img2",
            "type": "image",
            "image": { "type": "file",
                       "file": { "url": "https://s3/b.png", "expiry_time": "2024-01-01T00:00:00.000Z" },
                       "caption": [] }
        });

        assert_eq!(
            ContentBlock::from_raw(&external).kind,
            BlockKind::Image {
                url: "https://cdn/a.png".to_string(),
                caption: RichText(vec![TextSpan {
                    plain_text: "A".to_string(),
                    href: None,
                    annotations: Annotations::default(),
                }]),
            }
        );
        assert!(matches!(
            ContentBlock::from_raw(&hosted).kind,
            BlockKind::Image { ref url, .. } if url == "https://s3/b.png"
        ));
    }

    #[test]
    fn malformed_payload_decodes_as_unsupported() {
        let raw = json!({ "id": "x", "type": "image", "image": { "type": "external" } });
        let block = ContentBlock::from_raw(&raw);
        assert_eq!(
            block.kind,
            BlockKind::Unsupported {
                type_tag: "image".to_string()
            }
        );
        assert_eq!(block.type_tag(), "image");
    }

    #[test]
    fn unknown_types_keep_their_tag() {
        let raw = json!({ "id": "t", "type": "table_of_contents", "table_of_contents": {} });
        assert_eq!(ContentBlock::from_raw(&raw).type_tag(), "table_of_contents");
    }

    #[test]
    fn heading_levels_follow_type_tag() {
        let raw = json!({
            "id": "h",
            "type": "heading_2",
            "heading_2": { "rich_text": [span("Intro")], "is_toggleable": false }
        });
        let block = ContentBlock::from_raw(&raw);
        assert!(matches!(block.kind, BlockKind::Heading { level: 2, .. }));
        assert_eq!(block.type_tag(), "heading_2");
    }
}
