use std::sync::Arc;

use tracing::debug;

use crate::application::resolver::record_upstream;
use crate::application::source::{ContentSource, SourceError};
use crate::config::MAX_BLOCK_PAGE_SIZE;
use crate::domain::blocks::ContentBlock;

/// Fetches the first page of an entry's top-level blocks. Nested children and
/// further pages are never requested.
#[derive(Clone)]
pub struct BlockFetcher {
    source: Arc<dyn ContentSource>,
    page_size: u32,
}

impl BlockFetcher {
    pub fn new(source: Arc<dyn ContentSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_BLOCK_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn fetch_blocks(&self, entry_id: &str) -> Result<Vec<ContentBlock>, SourceError> {
        let result = self.source.list_blocks(entry_id, self.page_size).await;
        record_upstream("blocks", result.is_ok());
        let page = result?;

        if page.has_more {
            debug!(
                target = "blockpress::application::blocks",
                entry_id,
                page_size = self.page_size,
                "entry has more blocks than one page; the remainder is not rendered"
            );
        }

        Ok(page.blocks.iter().map(ContentBlock::from_raw).collect())
    }
}
