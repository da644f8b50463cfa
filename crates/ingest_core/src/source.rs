use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One ingestible origin. Consumed once to build an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Html {
        start_url: String,
        list_selector: String,
        link_selector: String,
    },
    Pdf {
        path: PathBuf,
    },
}

impl SourceConfig {
    pub fn html(
        name: impl Into<String>,
        start_url: impl Into<String>,
        list_selector: impl Into<String>,
        link_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Html {
                start_url: start_url.into(),
                list_selector: list_selector.into(),
                link_selector: link_selector.into(),
            },
        }
    }

    /// PDF source named after the file's base name.
    pub fn pdf(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: file_base_name(&path),
            kind: SourceKind::Pdf { path },
        }
    }

    /// Human-readable origin used in progress markers.
    pub fn origin(&self) -> String {
        match &self.kind {
            SourceKind::Html { start_url, .. } => start_url.clone(),
            SourceKind::Pdf { path } => path.display().to_string(),
        }
    }
}

/// Base name of a path with the directory stripped; falls back to the full
/// path when there is no final component.
pub fn file_base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_source_is_named_after_file() {
        let source = SourceConfig::pdf("data/pdfs/guide.pdf");
        assert_eq!(source.name, "guide.pdf");
        assert_eq!(source.origin(), "data/pdfs/guide.pdf");
    }

    #[test]
    fn base_name_of_bare_root_falls_back_to_path() {
        assert_eq!(file_base_name(Path::new("/")), "/");
    }
}
