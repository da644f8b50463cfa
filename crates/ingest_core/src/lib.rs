//! Ingest core: pure data model shared by the engine and the CLI.
mod catalog;
mod locator;
mod record;
mod source;

pub use catalog::{Catalog, CatalogError, DEFAULT_PDF_DIR};
pub use locator::Locator;
pub use record::{IdStrategy, Record, RecordFields};
pub use source::{file_base_name, SourceConfig, SourceKind};
