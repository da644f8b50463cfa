mod catalog;
mod cli;
mod logging;

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ingest_engine::{Ingestor, RecordEmitter, SourceReport};
use ingest_logging::ingest_error;

use crate::catalog::load_catalog;
use crate::cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::initialize(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("ingest: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ingest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let ingestor = Ingestor::new(cli.ingest_settings());
    let emitter = RecordEmitter::new(io::stdout());

    match cli.command {
        Command::ScrapeHtml {
            start_url,
            list_selector,
            link_selector,
            name,
        } => {
            let name = name.unwrap_or_else(|| start_url.clone());
            let report = runtime.block_on(ingestor.run_html_source(
                &name,
                &start_url,
                &list_selector,
                &link_selector,
                &emitter,
            ))?;
            ensure_not_skipped(&report)?;
        }
        Command::ScrapePdf { path } => {
            let report = runtime.block_on(ingestor.run_pdf_source(&path, &emitter))?;
            ensure_not_skipped(&report)?;
        }
        Command::ScrapeAll { pdf_dir } => {
            let catalog = load_catalog(cli.catalog.as_deref(), pdf_dir)?;
            runtime.block_on(ingestor.run_all(&catalog, &emitter))?;
        }
    }
    Ok(())
}

/// A single-source command fails when its only source was skipped. Failed
/// items are already logged and do not change the exit status.
fn ensure_not_skipped(report: &SourceReport) -> anyhow::Result<()> {
    match &report.aborted {
        Some(err) => Err(anyhow::anyhow!("{} skipped: {}", report.name, err)),
        None => Ok(()),
    }
}
