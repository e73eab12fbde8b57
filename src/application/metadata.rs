//! Metadata extraction from raw entry records.
//!
//! Every field falls back to its default independently: a malformed date does
//! not prevent the title or tags from being read.

use serde_json::Value;

use crate::config::PropertySettings;
use crate::domain::entries::{EntryMetadata, SourceEntry, UNTITLED};

#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    properties: PropertySettings,
}

impl MetadataExtractor {
    pub fn new(properties: PropertySettings) -> Self {
        Self { properties }
    }

    /// Title, slug, date and tags of `raw`. Never fails.
    pub fn extract(&self, raw: &Value) -> EntryMetadata {
        EntryMetadata {
            title: self.title(raw),
            slug: self.slug(raw),
            date: self.date(raw),
            tags: self.tags(raw),
        }
    }

    pub fn extract_entry(&self, raw: &Value) -> SourceEntry {
        let EntryMetadata {
            title,
            slug,
            date,
            tags,
        } = self.extract(raw);

        SourceEntry {
            id: string_field(raw, "id"),
            title,
            slug,
            date,
            tags,
            published: self.published(raw),
            created_time: string_field(raw, "created_time"),
        }
    }

    fn title(&self, raw: &Value) -> String {
        property(raw, &self.properties.title)
            .and_then(|prop| first_plain_text(prop, "title"))
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED)
            .to_string()
    }

    fn slug(&self, raw: &Value) -> String {
        property(raw, &self.properties.slug)
            .and_then(|prop| first_plain_text(prop, "rich_text"))
            .unwrap_or_default()
            .to_string()
    }

    fn date(&self, raw: &Value) -> String {
        property(raw, &self.properties.date)
            .and_then(|prop| prop.get("date"))
            .and_then(|date| date.get("start"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn tags(&self, raw: &Value) -> Vec<String> {
        property(raw, &self.properties.tags)
            .and_then(|prop| prop.get("multi_select"))
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| option.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn published(&self, raw: &Value) -> bool {
        property(raw, &self.properties.published)
            .and_then(|prop| prop.get("checkbox"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn property<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw.get("properties")?.get(name)
}

fn first_plain_text<'a>(prop: &'a Value, key: &str) -> Option<&'a str> {
    prop.get(key)?.get(0)?.get("plain_text")?.as_str()
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
