use std::fmt;

use ingest_core::Locator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch {locator} failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub locator: String,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, locator: &Locator, message: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    UnsupportedLocator,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
    NotFound,
    PermissionDenied,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::UnsupportedLocator => write!(f, "unsupported locator"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::PermissionDenied => write!(f, "permission denied"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Failure of one extractor stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("parse error at {locator}: {message}")]
    Parse { locator: String, message: String },
    #[error("extraction error at {locator}: {message}")]
    Extraction { locator: String, message: String },
    #[error("invalid source configuration: {0}")]
    Config(String),
}

impl IngestError {
    pub(crate) fn parse(locator: &Locator, message: impl Into<String>) -> Self {
        IngestError::Parse {
            locator: locator.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn extraction(locator: &Locator, message: impl Into<String>) -> Self {
        IngestError::Extraction {
            locator: locator.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching or enumerating a listed page; fatal to the source.
    Listing,
    /// Extracting one discovered item; only that item is lost.
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage:?} stage failed at {locator}: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    pub locator: Locator,
    pub error: IngestError,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),
}
