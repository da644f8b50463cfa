use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use ingest_core::{file_base_name, IdStrategy, Locator, Record, RecordFields};
use ingest_logging::ingest_debug;

use crate::fetch::Fetcher;
use crate::{Extractor, IngestError, PageContent};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PdfTextError(pub String);

/// Linear plain-text extraction from a PDF byte stream.
pub trait PdfText: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfTextError>;
}

/// `pdf-extract` backed implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractText;

impl PdfText for PdfExtractText {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfTextError> {
        // pdf-extract panics on some malformed documents instead of erroring.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(PdfTextError(format!("{err:?}"))),
            Err(_) => Err(PdfTextError("pdf text extraction panicked".to_string())),
        }
    }
}

/// A single local PDF: the listed page and the only item coincide.
pub struct PdfExtractor {
    name: String,
    path: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    text: Arc<dyn PdfText>,
    ids: IdStrategy,
}

impl PdfExtractor {
    pub fn new(
        path: impl Into<PathBuf>,
        fetcher: Arc<dyn Fetcher>,
        text: Arc<dyn PdfText>,
        ids: IdStrategy,
    ) -> Self {
        let path = path.into();
        Self {
            name: file_base_name(&path),
            path,
            fetcher,
            text,
            ids,
        }
    }
}

#[async_trait::async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_pages(&self) -> Vec<Locator> {
        vec![Locator::Path(self.path.clone())]
    }

    async fn fetch_page(&self, page: &Locator) -> Result<PageContent, IngestError> {
        Ok(self.fetcher.fetch(page).await?)
    }

    fn parse_items(&self, _page: &PageContent) -> Result<Vec<Locator>, IngestError> {
        Ok(vec![Locator::Path(self.path.clone())])
    }

    async fn extract_content(&self, item: &Locator) -> Result<Record, IngestError> {
        let Some(path) = item.as_path() else {
            return Err(IngestError::extraction(item, "pdf items must be local paths"));
        };
        let source = file_base_name(path);
        let bytes = self.fetcher.fetch(item).await?.bytes;

        let text = Arc::clone(&self.text);
        let content = tokio::task::spawn_blocking(move || text.extract_text(&bytes))
            .await
            .map_err(|err| IngestError::extraction(item, err.to_string()))?
            .map_err(|err| IngestError::parse(item, err.to_string()))?;
        // Scanned or image-only documents come back as bare page breaks.
        let content = if content.trim().is_empty() {
            String::new()
        } else {
            content
        };
        ingest_debug!("{}: extracted {} chars", source, content.len());

        let fields = RecordFields {
            source,
            content,
            ..RecordFields::default()
        };
        Ok(fields.into_record(self.ids))
    }
}
