//! Notion REST client backing [`ContentSource`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::application::source::{
    BlockPage, ContentSource, EntryFilter, EntryQuery, EntrySort, SourceError,
};
use crate::config::{NotionCredentials, NotionSettings, PropertySettings};

use super::error::InfraError;

const NOTION_VERSION_HEADER: &str = "Notion-Version";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone, Debug)]
pub struct NotionClient {
    client: Client,
    base: Url,
    token: String,
    database_id: String,
    version: String,
    properties: PropertySettings,
}

impl NotionClient {
    pub fn new(
        settings: &NotionSettings,
        credentials: NotionCredentials,
        properties: PropertySettings,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        let mut base = settings.api_base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client,
            base,
            token: credentials.token,
            database_id: credentials.database_id,
            version: settings.version.clone(),
            properties,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("blockpress/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base.join(path).map_err(SourceError::transport)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(NOTION_VERSION_HEADER, &self.version)
            .header(header::ACCEPT, "application/json")
    }

    /// Request body for a database query.
    pub fn query_body(&self, query: &EntryQuery) -> Value {
        let mut body = serde_json::Map::new();

        if let Some(filter) = self.filter(&query.filter) {
            body.insert("filter".to_string(), filter);
        }
        if let Some(sort) = query.sort {
            let sort = match sort {
                EntrySort::DateDescending => {
                    json!({ "property": self.properties.date, "direction": "descending" })
                }
                EntrySort::CreatedAscending => {
                    json!({ "timestamp": "created_time", "direction": "ascending" })
                }
            };
            body.insert("sorts".to_string(), json!([sort]));
        }

        Value::Object(body)
    }

    fn filter(&self, filter: &EntryFilter) -> Option<Value> {
        let mut clauses = Vec::new();
        if let Some(slug) = &filter.slug {
            clauses.push(json!({
                "property": self.properties.slug,
                "rich_text": { "equals": slug }
            }));
        }
        if let Some(published) = filter.published {
            clauses.push(json!({
                "property": self.properties.published,
                "checkbox": { "equals": published }
            }));
        }

        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(json!({ "and": clauses })),
        }
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Value>, SourceError> {
        let url = self.url(&format!("v1/databases/{}/query", self.database_id))?;
        let request = self.authorize(self.client.post(url)).json(&self.query_body(query));

        let response = request.send().await.map_err(SourceError::transport)?;
        let list: ListResponse = decode(response).await?;

        debug!(
            target = "blockpress::infra::notion",
            results = list.results.len(),
            has_more = list.has_more,
            "database query complete"
        );
        Ok(list.results)
    }

    async fn list_blocks(&self, entry_id: &str, page_size: u32) -> Result<BlockPage, SourceError> {
        let mut url = self.url(&format!("v1/blocks/{entry_id}/children"))?;
        url.query_pairs_mut()
            .append_pair("page_size", &page_size.to_string());

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(SourceError::transport)?;
        let list: ListResponse = decode(response).await?;

        Ok(BlockPage {
            blocks: list.results,
            has_more: list.has_more,
        })
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, SourceError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(SourceError::transport)?;

    if !status.is_success() {
        let message = match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => body.message,
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };
        return Err(SourceError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(SourceError::decode)
}
