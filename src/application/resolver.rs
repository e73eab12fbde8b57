use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::metadata::MetadataExtractor;
use crate::application::source::{ContentSource, EntryQuery, SourceError};
use crate::domain::entries::SourceEntry;

pub const METRIC_UPSTREAM_REQUEST_TOTAL: &str = "blockpress_upstream_request_total";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no published entry with slug `{slug}`")]
    NotFound { slug: String },
    #[error(transparent)]
    Upstream(#[from] SourceError),
}

/// Looks entries up in the content source.
#[derive(Clone)]
pub struct EntryResolver {
    source: Arc<dyn ContentSource>,
    extractor: MetadataExtractor,
}

impl EntryResolver {
    pub fn new(source: Arc<dyn ContentSource>, extractor: MetadataExtractor) -> Self {
        Self { source, extractor }
    }

    /// The published entry carrying `slug`.
    ///
    /// When several entries share the slug, the one created first wins
    /// (ties broken by id).
    pub async fn resolve_by_slug(&self, slug: &str) -> Result<SourceEntry, ResolveError> {
        let raw = query(
            self.source.as_ref(),
            "resolve",
            &EntryQuery::published_with_slug(slug),
        )
        .await?;

        let matches: Vec<SourceEntry> = raw
            .iter()
            .map(|record| self.extractor.extract_entry(record))
            .collect();

        if matches.len() > 1 {
            warn!(
                target = "blockpress::application::resolver",
                slug,
                matches = matches.len(),
                "multiple published entries share a slug; using the earliest created"
            );
        }

        matches
            .into_iter()
            .min_by(|a, b| a.creation_key().cmp(&b.creation_key()))
            .ok_or_else(|| ResolveError::NotFound {
                slug: slug.to_string(),
            })
    }

    /// Every published entry, newest date first.
    pub async fn list_published(&self) -> Result<Vec<SourceEntry>, ResolveError> {
        let raw = query(self.source.as_ref(), "list", &EntryQuery::published()).await?;

        let mut entries: Vec<SourceEntry> = raw
            .iter()
            .map(|record| self.extractor.extract_entry(record))
            .collect();
        // Stable: entries with equal dates keep the source's order.
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        debug!(
            target = "blockpress::application::resolver",
            count = entries.len(),
            "listed published entries"
        );
        Ok(entries)
    }
}

async fn query(
    source: &dyn ContentSource,
    operation: &'static str,
    query: &EntryQuery,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let result = source.query_entries(query).await;
    record_upstream(operation, result.is_ok());
    result
}

pub(crate) fn record_upstream(operation: &'static str, ok: bool) {
    counter!(
        METRIC_UPSTREAM_REQUEST_TOTAL,
        "operation" => operation,
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::source::BlockPage;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubSource {
        records: Vec<Value>,
        failure: Option<SourceError>,
        queries: Mutex<Vec<EntryQuery>>,
    }

    #[async_trait]
    impl ContentSource for StubSource {
        async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Value>, SourceError> {
            self.queries.lock().unwrap().push(query.clone());
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(self.records.clone()),
            }
        }

        async fn list_blocks(&self, _: &str, _: u32) -> Result<BlockPage, SourceError> {
            Ok(BlockPage::default())
        }
    }

    fn record(id: &str, slug: &str, date: &str, created: &str) -> Value {
        json!({
            "id": id,
            "created_time": created,
            "properties": {
                "Title": { "title": [{ "plain_text": format!("Post {id}") }] },
                "Slug": { "rich_text": [{ "plain_text": slug }] },
                "Date": { "date": { "start": date } },
                "Published": { "checkbox": true }
            }
        })
    }

    fn resolver(source: StubSource) -> (EntryResolver, Arc<StubSource>) {
        let source = Arc::new(source);
        (
            EntryResolver::new(source.clone(), MetadataExtractor::default()),
            source,
        )
    }

    #[tokio::test]
    async fn resolve_queries_published_slug_in_creation_order() {
        let (resolver, source) = resolver(StubSource {
            records: vec![record("a", "hello", "2024-01-01", "2024-01-01T00:00:00Z")],
            ..StubSource::default()
        });

        let entry = resolver.resolve_by_slug("hello").await.expect("entry");
        assert_eq!(entry.id, "a");

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), &[EntryQuery::published_with_slug("hello")]);
    }

    #[tokio::test]
    async fn resolve_without_matches_is_not_found() {
        let (resolver, _) = resolver(StubSource::default());
        let err = resolver.resolve_by_slug("ghost").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref slug } if slug == "ghost"));
    }

    #[tokio::test]
    async fn duplicate_slugs_pick_earliest_creation() {
        let (resolver, _) = resolver(StubSource {
            records: vec![
                record("late", "dup", "2024-02-01", "2024-02-01T00:00:00Z"),
                record("undated", "dup", "2024-03-01", ""),
                record("b-early", "dup", "2024-01-01", "2024-01-01T00:00:00Z"),
                record("a-early", "dup", "2024-01-01", "2024-01-01T00:00:00Z"),
            ],
            ..StubSource::default()
        });

        let entry = resolver.resolve_by_slug("dup").await.expect("entry");
        assert_eq!(entry.id, "a-early");
    }

    #[tokio::test]
    async fn upstream_failures_are_not_retried() {
        let (resolver, source) = resolver(StubSource {
            failure: Some(SourceError::Status {
                status: 401,
                message: "API token is invalid.".to_string(),
            }),
            ..StubSource::default()
        });

        let err = resolver.resolve_by_slug("hello").await.unwrap_err();
        assert!(matches!(err, ResolveError::Upstream(SourceError::Status { status: 401, .. })));
        assert_eq!(source.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_sorts_by_date_descending_and_keeps_ties_stable() {
        let (resolver, source) = resolver(StubSource {
            records: vec![
                record("old", "old", "2023-05-01", ""),
                record("undated", "undated", "", ""),
                record("tie-1", "tie-1", "2024-01-01", ""),
                record("new", "new", "2024-06-01", ""),
                record("tie-2", "tie-2", "2024-01-01", ""),
            ],
            ..StubSource::default()
        });

        let ids: Vec<String> = resolver
            .list_published()
            .await
            .expect("listing")
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["new", "tie-1", "tie-2", "old", "undated"]);

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), &[EntryQuery::published()]);
    }
}
