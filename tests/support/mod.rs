#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use blockpress::application::posts::PostService;
use blockpress::application::source::{BlockPage, ContentSource, EntryQuery, SourceError};
use blockpress::config::{PropertySettings, RenderSettings, Settings};

/// In-memory database: entries filtered the way the remote source would,
/// blocks keyed by entry id.
#[derive(Default)]
pub struct InMemorySource {
    entries: Vec<Value>,
    blocks: HashMap<String, Vec<Value>>,
    failure: Option<SourceError>,
    block_failure: Option<SourceError>,
    pub queries: Mutex<Vec<EntryQuery>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Entries resolve normally but every block listing fails.
    pub fn with_block_failure(mut self, error: SourceError) -> Self {
        self.block_failure = Some(error);
        self
    }

    pub fn with_entry(mut self, entry: Value, blocks: Vec<Value>) -> Self {
        let id = entry["id"].as_str().unwrap_or_default().to_string();
        self.blocks.insert(id, blocks);
        self.entries.push(entry);
        self
    }
}

#[async_trait]
impl ContentSource for InMemorySource {
    async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Value>, SourceError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                let published = entry["properties"]["Published"]["checkbox"]
                    .as_bool()
                    .unwrap_or(false);
                let slug = entry["properties"]["Slug"]["rich_text"][0]["plain_text"]
                    .as_str()
                    .unwrap_or_default();
                query.filter.published.is_none_or(|want| want == published)
                    && query.filter.slug.as_deref().is_none_or(|want| want == slug)
            })
            .cloned()
            .collect())
    }

    async fn list_blocks(&self, entry_id: &str, page_size: u32) -> Result<BlockPage, SourceError> {
        if let Some(err) = self.failure.as_ref().or(self.block_failure.as_ref()) {
            return Err(err.clone());
        }
        let blocks = self.blocks.get(entry_id).cloned().unwrap_or_default();
        let has_more = blocks.len() > page_size as usize;
        Ok(BlockPage {
            blocks: blocks.into_iter().take(page_size as usize).collect(),
            has_more,
        })
    }
}

pub fn entry(id: &str, title: &str, slug: &str, date: &str, published: bool) -> Value {
    json!({
        "object": "page",
        "id": id,
        "created_time": "2024-01-01T00:00:00.000Z",
        "properties": {
            "Title": { "type": "title", "title": [{ "plain_text": title }] },
            "Slug": { "type": "rich_text", "rich_text": [{ "plain_text": slug }] },
            "Date": { "type": "date", "date": { "start": date } },
            "Tags": { "type": "multi_select", "multi_select": [{ "name": "notes" }] },
            "Published": { "type": "checkbox", "checkbox": published }
        }
    })
}

pub fn image(id: &str, url: &str) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "image",
        "image": { "type": "external", "external": { "url": url }, "caption": [] }
    })
}

pub fn paragraph(id: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "paragraph": { "rich_text": [{ "type": "text", "plain_text": text, "href": null }] }
    })
}

pub fn settings() -> Settings {
    Settings {
        server: blockpress::config::ServerSettings {
            addr: "127.0.0.1:0".parse().expect("addr"),
            graceful_shutdown: std::time::Duration::from_secs(1),
            redact_errors: false,
        },
        logging: blockpress::config::LoggingSettings {
            level: tracing::level_filters::LevelFilter::INFO,
            format: blockpress::config::LogFormat::Compact,
        },
        notion: blockpress::config::NotionSettings {
            token: None,
            database_id: None,
            api_base_url: url::Url::parse("https://api.notion.com").expect("url"),
            version: "2022-06-28".to_string(),
            timeout: std::time::Duration::from_secs(5),
            block_page_size: std::num::NonZeroU32::new(100).expect("non-zero"),
        },
        properties: PropertySettings::default(),
        render: RenderSettings::default(),
    }
}

pub fn post_service(source: Arc<InMemorySource>) -> PostService {
    PostService::from_settings(source, &settings())
}
