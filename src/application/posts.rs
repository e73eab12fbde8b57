//! The single-entry rendering pipeline and the published listing.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::application::blocks::BlockFetcher;
use crate::application::error::PipelineError;
use crate::application::metadata::MetadataExtractor;
use crate::application::render::{BodyRenderer, RenderAnomaly};
use crate::application::resolver::{EntryResolver, ResolveError};
use crate::application::source::ContentSource;
use crate::config::Settings;
use crate::domain::entries::{EntryMetadata, SourceEntry};
use crate::presentation::views::{PageAssembler, TrustedHtml};
use crate::util::dates::format_long_date;

pub const METRIC_RENDER_ANOMALY_TOTAL: &str = "blockpress_render_anomaly_total";
pub const METRIC_PAGES_RENDERED_TOTAL: &str = "blockpress_pages_rendered_total";

#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub entry: SourceEntry,
    pub document: String,
    pub diagnostics: Vec<RenderAnomaly>,
}

#[derive(Clone)]
pub struct PostService {
    resolver: EntryResolver,
    blocks: BlockFetcher,
    body: BodyRenderer,
    assembler: PageAssembler,
}

impl PostService {
    pub fn new(
        resolver: EntryResolver,
        blocks: BlockFetcher,
        body: BodyRenderer,
        assembler: PageAssembler,
    ) -> Self {
        Self {
            resolver,
            blocks,
            body,
            assembler,
        }
    }

    /// Wire the default pipeline over `source`.
    pub fn from_settings(source: Arc<dyn ContentSource>, settings: &Settings) -> Self {
        Self::new(
            EntryResolver::new(
                source.clone(),
                MetadataExtractor::new(settings.properties.clone()),
            ),
            BlockFetcher::new(source, settings.notion.block_page_size.get()),
            BodyRenderer::with_defaults(settings.render.grid_class.clone()),
            PageAssembler::new(&settings.render),
        )
    }

    pub fn assembler(&self) -> &PageAssembler {
        &self.assembler
    }

    /// Resolve `slug` and render its document.
    pub async fn render_post(&self, slug: &str) -> Result<RenderedPost, PipelineError> {
        if slug.is_empty() {
            return Err(PipelineError::MissingSlug);
        }

        let entry = self.resolver.resolve_by_slug(slug).await?;
        self.render_entry(entry).await
    }

    /// Render an entry that has already been resolved.
    pub async fn render_entry(&self, entry: SourceEntry) -> Result<RenderedPost, PipelineError> {
        let blocks = self.blocks.fetch_blocks(&entry.id).await?;
        let grouped = self.body.render(&blocks);

        for anomaly in &grouped.diagnostics {
            warn!(
                target = "blockpress::application::posts",
                slug = %entry.slug,
                index = anomaly.index,
                kind = anomaly.kind.as_str(),
                excerpt = %anomaly.excerpt,
                "render anomaly"
            );
            counter!(METRIC_RENDER_ANOMALY_TOTAL, "kind" => anomaly.kind.as_str()).increment(1);
        }

        let document = self.assembler.assemble(
            &entry.title,
            &format_long_date(&entry.date),
            &entry.tags,
            TrustedHtml::new(grouped.html()),
        )?;

        counter!(METRIC_PAGES_RENDERED_TOTAL).increment(1);
        info!(
            target = "blockpress::application::posts",
            slug = %entry.slug,
            blocks = blocks.len(),
            image_grids = grouped.image_grids(),
            "rendered entry"
        );

        Ok(RenderedPost {
            entry,
            document,
            diagnostics: grouped.diagnostics,
        })
    }

    pub async fn published_entries(&self) -> Result<Vec<SourceEntry>, ResolveError> {
        self.resolver.list_published().await
    }

    /// Listing items of every published entry, newest first.
    pub async fn listing(&self) -> Result<Vec<EntryMetadata>, ResolveError> {
        let entries = self.published_entries().await?;
        Ok(entries.iter().map(SourceEntry::metadata).collect())
    }
}
