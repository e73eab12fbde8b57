//! Offline export: the listing as `index.json`, one HTML document per
//! published entry under `posts/`, and the index list fragment.
//!
//! Every document is rendered in memory first, so a failed export leaves the
//! previous output untouched.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::application::error::PipelineError;
use crate::application::posts::PostService;
use crate::application::resolver::ResolveError;
use crate::domain::entries::SourceEntry;
use crate::domain::slug::generate_unique_slug;
use crate::presentation::views::TemplateRenderError;
use crate::util::dates::format_long_date;

pub const INDEX_FILE: &str = "index.json";
pub const SNIPPET_FILE: &str = "index-snippet.html";
pub const POSTS_DIR: &str = "posts";
pub const INDEX_SNIPPET_MARKER: &str = "<!-- BLOG_INDEX_SNIPPET -->";
const POSTS_HREF_PREFIX: &str = "/blog/posts/";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to {action} `{path}`")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to list published entries")]
    Listing(#[source] ResolveError),
    #[error("failed to render entry `{slug}`")]
    Render {
        slug: String,
        #[source]
        source: PipelineError,
    },
    #[error("failed to serialise the listing")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

impl GenerateError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub removed: usize,
    /// Whether the index list was spliced into the site index page.
    pub index_injected: bool,
}

/// Everything an export writes, rendered before the output tree is touched.
struct RenderedSite {
    listing: String,
    documents: Vec<(String, String)>,
    snippet: String,
    skipped: usize,
}

pub struct SiteGenerator {
    posts: PostService,
    output: PathBuf,
    index_html: Option<PathBuf>,
}

impl SiteGenerator {
    pub fn new(posts: PostService, output: impl Into<PathBuf>) -> Self {
        Self {
            posts,
            output: output.into(),
            index_html: None,
        }
    }

    /// Also splice the index list into this page at [`INDEX_SNIPPET_MARKER`].
    pub fn with_index_html(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_html = Some(path.into());
        self
    }

    pub async fn generate(&self) -> Result<GenerateSummary, GenerateError> {
        let site = self.render_site().await?;
        let index_page = match &self.index_html {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .await
                    .map_err(|err| GenerateError::io("read", path, err))?;
                Some((path, contents))
            }
            None => None,
        };

        let posts_dir = self.output.join(POSTS_DIR);
        fs::create_dir_all(&posts_dir)
            .await
            .map_err(|err| GenerateError::io("create directory", &posts_dir, err))?;

        let mut summary = GenerateSummary {
            skipped: site.skipped,
            removed: remove_stale_documents(&posts_dir).await?,
            ..GenerateSummary::default()
        };

        write_file(&self.output.join(INDEX_FILE), site.listing).await?;
        for (file_name, document) in site.documents {
            let path = posts_dir.join(file_name);
            write_file(&path, document).await?;
            summary.written.push(path);
        }
        write_file(&self.output.join(SNIPPET_FILE), site.snippet.clone()).await?;

        if let Some((path, contents)) = index_page {
            summary.index_injected = inject_snippet(path, &contents, &site.snippet).await?;
        }

        info!(
            target = "blockpress::application::generate",
            written = summary.written.len(),
            skipped = summary.skipped,
            removed = summary.removed,
            index_injected = summary.index_injected,
            output = %self.output.display(),
            "static export complete"
        );
        Ok(summary)
    }

    async fn render_site(&self) -> Result<RenderedSite, GenerateError> {
        let entries = self
            .posts
            .published_entries()
            .await
            .map_err(GenerateError::Listing)?;
        info!(
            target = "blockpress::application::generate",
            entries = entries.len(),
            "fetched published entries"
        );

        let listing: Vec<_> = entries.iter().map(SourceEntry::metadata).collect();
        let listing = serde_json::to_string_pretty(&listing)?;

        let mut taken = HashSet::new();
        let mut documents = Vec::new();
        let mut snippet_items = Vec::new();
        let mut skipped = 0;

        for entry in entries {
            let file_stem = match generate_unique_slug(&entry.slug, |candidate| {
                taken.insert(candidate.to_string())
            }) {
                Ok(stem) => stem,
                Err(err) => {
                    warn!(
                        target = "blockpress::application::generate",
                        entry_id = %entry.id,
                        title = %entry.title,
                        error = %err,
                        "skipping entry without a usable slug"
                    );
                    skipped += 1;
                    continue;
                }
            };

            let slug = entry.slug.clone();
            let rendered = self
                .posts
                .render_entry(entry)
                .await
                .map_err(|source| GenerateError::Render { slug, source })?;

            let file_name = format!("{file_stem}.html");
            snippet_items.push((format!("{POSTS_HREF_PREFIX}{file_name}"), rendered.entry));
            documents.push((file_name, rendered.document));
        }

        let snippet = self.posts.assembler().index_snippet(snippet_items.iter().map(
            |(href, entry)| {
                (
                    href.clone(),
                    entry.title.as_str(),
                    format_long_date(&entry.date),
                    entry.tags.as_slice(),
                )
            },
        ))?;

        Ok(RenderedSite {
            listing,
            documents,
            snippet,
            skipped,
        })
    }
}

async fn inject_snippet(path: &Path, contents: &str, snippet: &str) -> Result<bool, GenerateError> {
    if !contents.contains(INDEX_SNIPPET_MARKER) {
        warn!(
            target = "blockpress::application::generate",
            path = %path.display(),
            marker = INDEX_SNIPPET_MARKER,
            snippet = %snippet,
            "index page has no snippet marker; list not injected"
        );
        return Ok(false);
    }

    write_file(path, contents.replacen(INDEX_SNIPPET_MARKER, snippet, 1)).await?;
    info!(
        target = "blockpress::application::generate",
        path = %path.display(),
        "injected index list"
    );
    Ok(true)
}

async fn remove_stale_documents(dir: &Path) -> Result<usize, GenerateError> {
    let mut removed = 0;
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|err| GenerateError::io("read directory", dir, err))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| GenerateError::io("read directory", dir, err))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            fs::remove_file(&path)
                .await
                .map_err(|err| GenerateError::io("remove", &path, err))?;
            removed += 1;
        }
    }

    Ok(removed)
}

async fn write_file(path: &Path, contents: String) -> Result<(), GenerateError> {
    fs::write(path, contents)
        .await
        .map_err(|err| GenerateError::io("write", path, err))
}
