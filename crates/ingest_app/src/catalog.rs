use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ingest_core::Catalog;
use ingest_logging::ingest_info;

/// The catalog file when one is given, the built-in catalog otherwise. A
/// `pdf_dir` override replaces whatever folder the catalog names.
pub fn load_catalog(path: Option<&Path>, pdf_dir: Option<PathBuf>) -> anyhow::Result<Catalog> {
    let mut catalog = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read catalog {}", path.display()))?;
            let catalog = Catalog::from_ron_str(&text)
                .with_context(|| format!("invalid catalog {}", path.display()))?;
            ingest_info!(
                "Loaded {} sources from catalog {}",
                catalog.sources.len(),
                path.display()
            );
            catalog
        }
        None => Catalog::builtin(),
    };
    if pdf_dir.is_some() {
        catalog.pdf_dir = pdf_dir;
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_core::SourceKind;
    use pretty_assertions::assert_eq;

    fn write_catalog(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.ron");
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn builtin_catalog_without_a_file() {
        let catalog = load_catalog(None, None).unwrap();
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn pdf_dir_override_replaces_catalog_folder() {
        let catalog = load_catalog(None, Some(PathBuf::from("elsewhere"))).unwrap();
        assert_eq!(catalog.pdf_dir, Some(PathBuf::from("elsewhere")));
        assert_eq!(catalog.sources, Catalog::builtin().sources);
    }

    #[test]
    fn catalog_file_is_parsed() {
        let (_dir, path) = write_catalog(
            r#"(
                sources: [
                    (name: "manual", kind: Pdf(path: "manual.pdf")),
                ],
                pdf_dir: None,
            )"#,
        );
        let catalog = load_catalog(Some(&path), None).unwrap();
        assert_eq!(catalog.sources.len(), 1);
        assert_eq!(
            catalog.sources[0].kind,
            SourceKind::Pdf {
                path: PathBuf::from("manual.pdf")
            }
        );
        assert_eq!(catalog.pdf_dir, None);
    }

    #[test]
    fn unreadable_or_invalid_catalog_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = load_catalog(Some(&dir.path().join("absent.ron")), None).unwrap_err();
        assert!(missing.to_string().contains("could not read catalog"));

        let (_dir, path) = write_catalog("(sources: [ oops");
        let invalid = load_catalog(Some(&path), None).unwrap_err();
        assert!(invalid.to_string().contains("invalid catalog"));
    }
}
