//! Ingest engine: fetchers, extractors, the pipeline runner and the record emitter.
mod decode;
mod emit;
mod error;
mod extractor;
mod fetch;
mod html;
mod ingest;
mod pdf;
mod pipeline;
mod types;

pub use decode::{decode_page, DecodeError};
pub use emit::RecordEmitter;
pub use error::{EmitError, FailureKind, FetchError, IngestError, PipelineError, Stage};
pub use extractor::Extractor;
pub use fetch::{FetchSettings, Fetcher, FsFetcher, ReqwestFetcher};
pub use html::{ArticleFields, ArticleParser, HtmlExtractor};
pub use ingest::{discover_pdfs, IngestSettings, Ingestor, RunSummary, SourceReport};
pub use pdf::{PdfExtractText, PdfExtractor, PdfText, PdfTextError};
pub use pipeline::{OutputOrder, Pipeline, DEFAULT_CONCURRENCY};
pub use types::{FetchMetadata, FetchOutput, PageContent};
