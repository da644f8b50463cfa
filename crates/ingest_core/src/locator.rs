use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// Reference to a page or content item: a resolved absolute URL or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Url(Url),
    Path(PathBuf),
}

impl Locator {
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Locator::Url(url) => Some(url),
            Locator::Path(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Locator::Url(_) => None,
            Locator::Path(path) => Some(path),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Url(url) => write!(f, "{url}"),
            Locator::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<Url> for Locator {
    fn from(url: Url) -> Self {
        Locator::Url(url)
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::Path(path)
    }
}
