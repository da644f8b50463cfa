use ingest_core::{Locator, Record};

use crate::{IngestError, PageContent};

/// Three-stage contract every source kind implements:
/// discover pages, enumerate items on each page, extract one record per item.
///
/// The pipeline never looks past this trait, so adding a source kind means
/// adding an implementation, not touching orchestration.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Label used in diagnostics.
    fn name(&self) -> &str;

    /// Pages that must be fetched to discover items.
    fn list_pages(&self) -> Vec<Locator>;

    /// Retrieve raw content for one listed page. Failures propagate.
    async fn fetch_page(&self, page: &Locator) -> Result<PageContent, IngestError>;

    /// Locators of the content items found on one page, in page order.
    fn parse_items(&self, page: &PageContent) -> Result<Vec<Locator>, IngestError>;

    /// Normalize one item into a record.
    async fn extract_content(&self, item: &Locator) -> Result<Record, IngestError>;
}
