//! Input file discovery.
//!
//! Used only for inputs the configuration does not name. The working
//! directory is scanned (top level only, sorted by file name so repeated runs
//! pick the same files) and candidates are ranked by a name hint: `dslip`
//! for the source document, `produttori` for the reference workbook.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SplitConfig;
use crate::error::{Error, Result};

/// Extensions accepted for the source document.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions accepted for the reference workbook.
pub const TABLE_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Name hint preferred for the source document.
pub const DOCUMENT_HINT: &str = "dslip";

/// Name hint preferred for the reference workbook.
pub const TABLE_HINT: &str = "produttori";

/// Resolved input and output locations of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    /// Source document
    pub source: PathBuf,
    /// Reference workbook
    pub table: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

/// Resolve the inputs of `config`, discovering the ones it leaves out.
pub fn resolve_inputs(config: &SplitConfig) -> Result<RunInputs> {
    let needs_scan = config.source.is_none() || config.table.is_none();
    let files = if needs_scan {
        list_files(config.working_dir())?
    } else {
        Vec::new()
    };

    let source = match &config.source {
        Some(path) => path.clone(),
        None => pick(&files, DOCUMENT_EXTENSIONS, DOCUMENT_HINT).ok_or_else(|| {
            Error::Discovery(format!(
                "no PDF document found in {}",
                config.working_dir().display()
            ))
        })?,
    };

    let table = match &config.table {
        Some(path) => path.clone(),
        None => pick(&files, TABLE_EXTENSIONS, TABLE_HINT).ok_or_else(|| {
            Error::Discovery(format!(
                "no reference workbook found in {}",
                config.working_dir().display()
            ))
        })?,
    };

    log::info!("Source document: {}", source.display());
    log::info!("Reference table: {}", table.display());

    Ok(RunInputs {
        source,
        table,
        output_dir: config.resolved_output_dir(),
    })
}

/// Regular, non-hidden files of `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::Discovery(format!("cannot read directory {}: {}", dir.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.') && !n.starts_with("~$"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// First file with a matching extension whose name contains `hint`, else the
/// first file with a matching extension.
fn pick(files: &[PathBuf], extensions: &[&str], hint: &str) -> Option<PathBuf> {
    let candidates: Vec<&PathBuf> = files
        .iter()
        .filter(|p| has_extension(p, extensions))
        .collect();

    candidates
        .iter()
        .find(|p| file_name_lower(p).contains(hint))
        .or_else(|| candidates.first())
        .map(|p| (*p).clone())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_hint_preferred() {
        let dir = tempdir().unwrap();
        for name in ["a.pdf", "b_DSLIP_marzo.PDF", "anagrafica.xlsx", "Produttori.xlsx"] {
            touch(dir.path(), name);
        }

        let inputs = resolve_inputs(&SplitConfig::new(dir.path())).unwrap();
        assert_eq!(inputs.source, dir.path().join("b_DSLIP_marzo.PDF"));
        assert_eq!(inputs.table, dir.path().join("Produttori.xlsx"));
        assert_eq!(inputs.output_dir, dir.path().join("output"));
    }

    #[test]
    fn test_first_by_name_without_hint() {
        let dir = tempdir().unwrap();
        for name in ["z.pdf", "m.pdf", "tabella.ods", "note.txt"] {
            touch(dir.path(), name);
        }

        let inputs = resolve_inputs(&SplitConfig::new(dir.path())).unwrap();
        assert_eq!(inputs.source, dir.path().join("m.pdf"));
        assert_eq!(inputs.table, dir.path().join("tabella.ods"));
    }

    #[test]
    fn test_lock_and_hidden_files_skipped() {
        let dir = tempdir().unwrap();
        for name in ["~$produttori.xlsx", ".dslip.pdf", "dslip.pdf", "elenco.xlsx"] {
            touch(dir.path(), name);
        }

        let inputs = resolve_inputs(&SplitConfig::new(dir.path())).unwrap();
        assert_eq!(inputs.source, dir.path().join("dslip.pdf"));
        assert_eq!(inputs.table, dir.path().join("elenco.xlsx"));
    }

    #[test]
    fn test_explicit_paths_win() {
        let dir = tempdir().unwrap();
        let config = SplitConfig::new(dir.path())
            .with_source("/elsewhere/in.pdf")
            .with_table("/elsewhere/t.xlsx");
        let inputs = resolve_inputs(&config).unwrap();
        assert_eq!(inputs.source, PathBuf::from("/elsewhere/in.pdf"));
        assert_eq!(inputs.table, PathBuf::from("/elsewhere/t.xlsx"));
    }

    #[test]
    fn test_missing_inputs_are_discovery_errors() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "produttori.xlsx");
        let err = resolve_inputs(&SplitConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Discovery(_)));

        let dir = tempdir().unwrap();
        touch(dir.path(), "dslip.pdf");
        let err = resolve_inputs(&SplitConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Discovery(ref m) if m.contains("workbook")));
    }
}
