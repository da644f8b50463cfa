use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ingest_core::IdStrategy;
use ingest_engine::{FetchSettings, IngestSettings, OutputOrder, DEFAULT_CONCURRENCY};
use log::LevelFilter;

/// Ingest HTML listing pages and local PDFs into JSON-line records on stdout
#[derive(Parser, Debug)]
#[command(name = "ingest", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// RON catalog of sources; the built-in catalog is used when absent
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Simultaneous item extractions per source
    #[arg(long, global = true, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Upper bound in seconds for a single fetch
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Reject local files larger than this many bytes (no limit by default)
    #[arg(long, global = true)]
    pub max_file_bytes: Option<u64>,

    /// Emit records as they complete instead of in listing order
    #[arg(long, global = true)]
    pub unordered: bool,

    /// Derive record ids from their content instead of random UUIDs
    #[arg(long, global = true)]
    pub content_ids: bool,

    /// Diagnostic verbosity (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Also write diagnostics to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Scrape one HTML listing page and every article it links to
    ScrapeHtml {
        /// Listing page URL
        start_url: String,

        /// CSS selector for listing containers
        #[arg(long = "list-sel", default_value = "article")]
        list_selector: String,

        /// CSS selector for links inside each container
        #[arg(long = "link-sel", default_value = "a")]
        link_selector: String,

        /// Source name stamped on every record (defaults to the URL)
        #[arg(long)]
        name: Option<String>,
    },
    /// Extract the text of one local PDF
    ScrapePdf {
        /// Path to the PDF file
        path: PathBuf,
    },
    /// Run every catalog source, then every PDF in the PDF folder
    ScrapeAll {
        /// Folder scanned for *.pdf files, overriding the catalog
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn ingest_settings(&self) -> IngestSettings {
        let order = if self.unordered {
            OutputOrder::Unordered
        } else {
            OutputOrder::Sequential
        };
        let ids = if self.content_ids {
            IdStrategy::ContentHash
        } else {
            IdStrategy::Random
        };
        IngestSettings {
            fetch: FetchSettings {
                request_timeout: Duration::from_secs(self.timeout_secs),
                max_file_bytes: self.max_file_bytes,
                ..FetchSettings::default()
            },
            concurrency: self.concurrency,
            order,
            ids,
        }
    }
}
