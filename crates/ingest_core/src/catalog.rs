use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{SourceConfig, SourceKind};

pub const DEFAULT_PDF_DIR: &str = "data/pdfs";

/// Ordered list of sources plus a directory scanned for additional PDFs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub pdf_dir: Option<PathBuf>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error("catalog serialization error: {0}")]
    Serialize(String),
    #[error("duplicate source name {0:?}")]
    DuplicateName(String),
    #[error("source {name:?} has invalid start url {url:?}: {reason}")]
    InvalidStartUrl {
        name: String,
        url: String,
        reason: String,
    },
    #[error("source {name:?} has an empty {field}")]
    EmptyField { name: String, field: &'static str },
}

impl Catalog {
    /// Sources shipped with the tool.
    pub fn builtin() -> Self {
        Self {
            sources: vec![
                SourceConfig::html(
                    "interviewing_blog",
                    "https://interviewing.io/blog",
                    "h1",
                    "a",
                ),
                SourceConfig::html(
                    "company_guides",
                    "https://interviewing.io/topics#companies",
                    ".markdown-content",
                    "a[href*='/topics/']",
                ),
                SourceConfig::html(
                    "interview_guides",
                    "https://interviewing.io/learn#interview-guides",
                    ".markdown-content",
                    "a[href*='/learn/']",
                ),
                SourceConfig::html(
                    "nil_dsablog",
                    "https://nilmamano.com/blog/category/dsa",
                    "article",
                    "a",
                ),
            ],
            pdf_dir: Some(PathBuf::from(DEFAULT_PDF_DIR)),
        }
    }

    /// Parse and validate a catalog written in RON.
    pub fn from_ron_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            ron::from_str(text).map_err(|err| CatalogError::Parse(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_ron_string(&self) -> Result<String, CatalogError> {
        let pretty = ron::ser::PrettyConfig::new();
        ron::ser::to_string_pretty(self, pretty)
            .map_err(|err| CatalogError::Serialize(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(CatalogError::EmptyField {
                    name: source.name.clone(),
                    field: "name",
                });
            }
            if !names.insert(source.name.as_str()) {
                return Err(CatalogError::DuplicateName(source.name.clone()));
            }
            validate_kind(&source.name, &source.kind)?;
        }
        Ok(())
    }
}

fn validate_kind(name: &str, kind: &SourceKind) -> Result<(), CatalogError> {
    let empty = |field| CatalogError::EmptyField {
        name: name.to_string(),
        field,
    };
    match kind {
        SourceKind::Html {
            start_url,
            list_selector,
            link_selector,
        } => {
            let invalid = |reason: String| CatalogError::InvalidStartUrl {
                name: name.to_string(),
                url: start_url.clone(),
                reason,
            };
            let parsed = Url::parse(start_url).map_err(|err| invalid(err.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
            }
            if list_selector.trim().is_empty() {
                return Err(empty("list selector"));
            }
            if link_selector.trim().is_empty() {
                return Err(empty("link selector"));
            }
        }
        SourceKind::Pdf { path } => {
            if path.as_os_str().is_empty() {
                return Err(empty("path"));
            }
        }
    }
    Ok(())
}
