use std::io::ErrorKind;
use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use ingest_core::Locator;
use ingest_logging::ingest_debug;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Upper bound for one whole fetch, HTTP or filesystem.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Body cap for HTTP responses.
    pub max_bytes: u64,
    /// Size cap for local files; unbounded when `None`.
    pub max_file_bytes: Option<u64>,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 20 * 1024 * 1024,
            max_file_bytes: None,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Retrieves raw bytes for a locator. No business logic.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &Locator) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(
        &self,
        locator: &Locator,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, locator, err.to_string()))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn fetch_url(&self, locator: &Locator, url: &Url) -> Result<FetchOutput, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                locator,
                format!("unsupported scheme {}", url.scheme()),
            ));
        }
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(locator, redirect_counter.clone())?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| map_reqwest_error(locator, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                locator,
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(locator, content_len));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    locator,
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(locator, err))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(locator, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        ingest_debug!("fetched {} bytes from {}", bytes.len(), final_url);

        let metadata = FetchMetadata {
            locator: locator.clone(),
            final_url: Some(final_url),
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }

    fn too_large(&self, locator: &Locator, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            locator,
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<FetchOutput, FetchError> {
        match locator {
            Locator::Url(url) => self.fetch_url(locator, url).await,
            Locator::Path(_) => Err(FetchError::new(
                FailureKind::UnsupportedLocator,
                locator,
                "http fetcher cannot read local paths",
            )),
        }
    }
}

fn map_reqwest_error(locator: &Locator, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, locator, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, locator, err.to_string());
    }
    FetchError::new(FailureKind::Network, locator, err.to_string())
}

/// Reads whole files from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    settings: FetchSettings,
}

impl FsFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    async fn read(&self, locator: &Locator, path: &Path) -> Result<FetchOutput, FetchError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|err| map_io_error(locator, err))?;
        if meta.is_dir() {
            return Err(FetchError::new(FailureKind::Io, locator, "path is a directory"));
        }
        if let Some(limit) = self.settings.max_file_bytes {
            if meta.len() > limit {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: limit,
                        actual: Some(meta.len()),
                    },
                    locator,
                    "file too large",
                ));
            }
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| map_io_error(locator, err))?;
        ingest_debug!("read {} bytes from {}", bytes.len(), path.display());

        let metadata = FetchMetadata {
            locator: locator.clone(),
            final_url: None,
            redirect_count: 0,
            content_type: None,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}

#[async_trait::async_trait]
impl Fetcher for FsFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<FetchOutput, FetchError> {
        let Locator::Path(path) = locator else {
            return Err(FetchError::new(
                FailureKind::UnsupportedLocator,
                locator,
                "filesystem fetcher cannot read urls",
            ));
        };
        match tokio::time::timeout(self.settings.request_timeout, self.read(locator, path)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                FailureKind::Timeout,
                locator,
                format!("read exceeded {:?}", self.settings.request_timeout),
            )),
        }
    }
}

fn map_io_error(locator: &Locator, err: std::io::Error) -> FetchError {
    let kind = match err.kind() {
        ErrorKind::NotFound => FailureKind::NotFound,
        ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
        _ => FailureKind::Io,
    };
    FetchError::new(kind, locator, err.to_string())
}
