use ingest_core::Locator;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

/// Raw content of one listed page, as handed from `fetch_page` to `parse_items`.
pub type PageContent = FetchOutput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub locator: Locator,
    /// URL after redirects; `None` for filesystem reads.
    pub final_url: Option<Url>,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

impl FetchOutput {
    /// Where the content actually came from: the URL after redirects, else the
    /// requested one.
    pub fn base_url(&self) -> Option<&Url> {
        self.metadata
            .final_url
            .as_ref()
            .or_else(|| self.metadata.locator.as_url())
    }
}
