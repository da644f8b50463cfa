use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use ingest_core::{file_base_name, Catalog, IdStrategy, SourceConfig, SourceKind};
use ingest_logging::{ingest_error, ingest_info, ingest_warn};

use crate::fetch::{FetchSettings, Fetcher, FsFetcher, ReqwestFetcher};
use crate::html::HtmlExtractor;
use crate::pdf::{PdfExtractText, PdfExtractor, PdfText};
use crate::pipeline::{OutputOrder, Pipeline, DEFAULT_CONCURRENCY};
use crate::{EmitError, Extractor, IngestError, PipelineError, RecordEmitter, Stage};

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub fetch: FetchSettings,
    /// Simultaneous item extractions per source.
    pub concurrency: usize,
    pub order: OutputOrder,
    pub ids: IdStrategy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            concurrency: DEFAULT_CONCURRENCY,
            order: OutputOrder::Sequential,
            ids: IdStrategy::Random,
        }
    }
}

/// Outcome of one source run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub emitted: usize,
    /// Items that yielded no record.
    pub failures: Vec<PipelineError>,
    /// Set when the source was skipped: bad configuration or a listing failure.
    pub aborted: Option<IngestError>,
}

impl SourceReport {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emitted: 0,
            failures: Vec::new(),
            aborted: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
}

impl RunSummary {
    pub fn emitted(&self) -> usize {
        self.reports.iter().map(|r| r.emitted).sum()
    }

    pub fn failed_items(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    pub fn aborted_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.aborted.is_some())
    }
}

/// Builds extractors from source configurations and drives them through the
/// pipeline into an emitter. Sources run one after another; a failing source
/// or item is reported and skipped, only a failing output sink stops the run.
pub struct Ingestor {
    http: Arc<dyn Fetcher>,
    files: Arc<dyn Fetcher>,
    pdf_text: Arc<dyn PdfText>,
    pipeline: Pipeline,
    ids: IdStrategy,
}

impl Ingestor {
    pub fn new(settings: IngestSettings) -> Self {
        Self::with_parts(
            Arc::new(ReqwestFetcher::new(settings.fetch.clone())),
            Arc::new(FsFetcher::new(settings.fetch)),
            Arc::new(PdfExtractText),
            Pipeline::new(settings.concurrency, settings.order),
            settings.ids,
        )
    }

    /// Assemble from explicit capabilities, e.g. stubbed fetchers in tests.
    pub fn with_parts(
        http: Arc<dyn Fetcher>,
        files: Arc<dyn Fetcher>,
        pdf_text: Arc<dyn PdfText>,
        pipeline: Pipeline,
        ids: IdStrategy,
    ) -> Self {
        Self {
            http,
            files,
            pdf_text,
            pipeline,
            ids,
        }
    }

    pub fn build_extractor(&self, source: &SourceConfig) -> Result<Box<dyn Extractor>, IngestError> {
        match &source.kind {
            SourceKind::Html {
                start_url,
                list_selector,
                link_selector,
            } => Ok(Box::new(HtmlExtractor::new(
                source.name.clone(),
                start_url,
                list_selector,
                link_selector,
                self.http.clone(),
                self.ids,
            )?)),
            SourceKind::Pdf { path } => Ok(Box::new(PdfExtractor::new(
                path.clone(),
                self.files.clone(),
                self.pdf_text.clone(),
                self.ids,
            ))),
        }
    }

    pub async fn run_html_source<W: Write + Send>(
        &self,
        name: &str,
        start_url: &str,
        list_selector: &str,
        link_selector: &str,
        emitter: &RecordEmitter<W>,
    ) -> Result<SourceReport, EmitError> {
        let source = SourceConfig::html(name, start_url, list_selector, link_selector);
        self.run_source(&source, emitter).await
    }

    pub async fn run_pdf_source<W: Write + Send>(
        &self,
        path: &Path,
        emitter: &RecordEmitter<W>,
    ) -> Result<SourceReport, EmitError> {
        self.run_source(&SourceConfig::pdf(path), emitter).await
    }

    /// Every catalog source in order, then every PDF in the catalog's PDF
    /// directory sorted by file name.
    pub async fn run_all<W: Write + Send>(
        &self,
        catalog: &Catalog,
        emitter: &RecordEmitter<W>,
    ) -> Result<RunSummary, EmitError> {
        let mut summary = RunSummary::default();
        for source in &catalog.sources {
            summary.reports.push(self.run_source(source, emitter).await?);
        }

        if let Some(dir) = &catalog.pdf_dir {
            match discover_pdfs(dir).await {
                Ok(paths) => {
                    for path in paths {
                        summary.reports.push(self.run_pdf_source(&path, emitter).await?);
                    }
                }
                Err(err) => ingest_warn!("PDF folder not readable {}: {}", dir.display(), err),
            }
        }

        ingest_info!(
            "run finished: {} sources, {} records, {} failed items, {} skipped sources",
            summary.reports.len(),
            summary.emitted(),
            summary.failed_items(),
            summary.aborted_sources().count()
        );
        Ok(summary)
    }

    pub async fn run_source<W: Write + Send>(
        &self,
        source: &SourceConfig,
        emitter: &RecordEmitter<W>,
    ) -> Result<SourceReport, EmitError> {
        ingest_info!("--- SCRAPING {} ({}) ---", source.name, source.origin());
        match self.build_extractor(source) {
            Ok(extractor) => self.run_extractor(extractor.as_ref(), emitter).await,
            Err(err) => {
                ingest_error!("{}: skipped: {}", source.name, err);
                let mut report = SourceReport::new(source.name.clone());
                report.aborted = Some(err);
                Ok(report)
            }
        }
    }

    /// Stream one extractor's records into the emitter, isolating item failures.
    pub async fn run_extractor<W: Write + Send>(
        &self,
        extractor: &dyn Extractor,
        emitter: &RecordEmitter<W>,
    ) -> Result<SourceReport, EmitError> {
        let mut report = SourceReport::new(extractor.name());
        let mut records = self.pipeline.run(extractor);
        while let Some(result) = records.next().await {
            match result {
                Ok(record) => {
                    emitter.emit(&record)?;
                    report.emitted += 1;
                }
                Err(err) if err.stage == Stage::Item => {
                    ingest_warn!("{}: item {} failed: {}", report.name, err.locator, err.error);
                    report.failures.push(err);
                }
                Err(err) => {
                    ingest_error!(
                        "{}: listing {} failed, source skipped: {}",
                        report.name,
                        err.locator,
                        err.error
                    );
                    report.aborted = Some(err.error);
                }
            }
        }
        ingest_info!(
            "{}: {} records, {} failed items",
            report.name,
            report.emitted,
            report.failures.len()
        );
        Ok(report)
    }
}

/// Files with a `.pdf` extension (any case) directly inside `dir`, sorted by name.
pub async fn discover_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pdfs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && tokio::fs::metadata(&path).await.is_ok_and(|meta| meta.is_file()) {
            pdfs.push(path);
        }
    }
    pdfs.sort_by_key(|path| file_base_name(path));
    Ok(pdfs)
}
