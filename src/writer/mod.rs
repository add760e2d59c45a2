//! Output documents.
//!
//! [`DocumentWriter`] turns a [`Segmentation`] into the output file set: one
//! PDF per producer group, the unresolved PDF with its XLSX side report and,
//! optionally, a zip of everything. Files are first written into an
//! [`OutputStage`] inside the output directory and only moved into place
//! once every artifact has been produced.
//!
//! ```ignore
//! use dslip_split::writer::DocumentWriter;
//!
//! let writer = DocumentWriter::new(&source, "dslip.pdf").with_bundle(true);
//! let artifacts = writer.write(&segmentation, &resolved, "output".as_ref())?;
//! ```

pub mod bundle;
pub mod report;

pub use bundle::bundle_bytes;
pub use report::{workbook_bytes, ReportCell};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;

use crate::config::{BUNDLE_FILE_NAME, OUTPUT_PREFIX, REPORT_SUFFIX, UNRESOLVED_STEM};
use crate::error::{Error, Result};
use crate::reconcile::ResolvedPage;
use crate::segment::Segmentation;
use crate::source::PageSource;

/// Sheet name of the unresolved pages report.
pub const REPORT_SHEET: &str = "Senza produttore";

/// Header row of the unresolved pages report.
pub const REPORT_HEADERS: [&str; 4] = ["PDF", "PAGINA", "NUMERO", "CLIENTE"];

/// File stem for a producer: spaces become `_`, periods are dropped and `&`
/// becomes `E`. Path separators also become `_`.
pub fn producer_file_stem(producer: &str) -> String {
    let safe = producer
        .replace([' ', '/', '\\'], "_")
        .replace('.', "")
        .replace('&', "E");
    format!("{}{}", OUTPUT_PREFIX, safe)
}

/// File name of a producer's document.
pub fn producer_file_name(producer: &str) -> String {
    format!("{}.pdf", producer_file_stem(producer))
}

/// File name of the unresolved pages document.
pub fn unresolved_file_name() -> String {
    format!("{}{}.pdf", OUTPUT_PREFIX, UNRESOLVED_STEM)
}

/// File name of the unresolved pages report.
pub fn report_file_name() -> String {
    format!("{}{}{}.xlsx", OUTPUT_PREFIX, UNRESOLVED_STEM, REPORT_SUFFIX)
}

/// Kind of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Pages of one producer
    ProducerDocument,
    /// Pages without producer
    UnresolvedDocument,
    /// Listing of the pages without producer
    UnresolvedReport,
    /// Zip of every other artifact
    Bundle,
}

/// A file produced by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// File name inside the output directory
    pub file_name: String,
    /// What the file holds
    pub kind: ArtifactKind,
    /// Producer, for producer documents
    pub producer: Option<String>,
    /// Source pages the file covers, ascending
    pub pages: Vec<u32>,
}

/// Staging area for an all-or-nothing output set.
///
/// Files are written into a hidden temporary directory inside the target
/// directory, so [`commit`](Self::commit) only renames within one file
/// system. Dropping an uncommitted stage removes everything it holds.
pub struct OutputStage {
    staging: TempDir,
    target: PathBuf,
    staged: Vec<String>,
}

impl OutputStage {
    /// Create the target directory if needed and open a staging area in it.
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref();
        fs::create_dir_all(target).map_err(|e| Error::write(target, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".dslip-staging-")
            .tempdir_in(target)
            .map_err(|e| Error::write(target, e))?;
        log::debug!("Staging outputs in {}", staging.path().display());
        Ok(Self {
            staging,
            target: target.to_path_buf(),
            staged: Vec::new(),
        })
    }

    /// Stage `bytes` under `name`. A later write with the same name replaces it.
    pub fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.staging.path().join(name);
        fs::write(&path, bytes).map_err(|e| Error::write(&path, e))?;
        if !self.staged.iter().any(|n| n == name) {
            self.staged.push(name.to_string());
        }
        Ok(())
    }

    /// Contents of a staged file.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.staging.path().join(name))?)
    }

    /// Names staged so far, in staging order.
    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    /// Move every staged file into the target directory.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(self.staged.len());
        for name in &self.staged {
            let from = self.staging.path().join(name);
            let to = self.target.join(name);
            if to.is_file() {
                fs::remove_file(&to).map_err(|e| Error::write(&to, e))?;
            }
            fs::rename(&from, &to).map_err(|e| Error::write(&to, e))?;
            committed.push(to);
        }
        Ok(committed)
    }
}

/// Writes the output documents of one source document.
pub struct DocumentWriter<'a, S: PageSource + ?Sized> {
    source: &'a S,
    source_name: String,
    bundle: bool,
}

impl<'a, S: PageSource + ?Sized> DocumentWriter<'a, S> {
    /// Create a writer over `source`; `source_name` is reported in the side report.
    pub fn new(source: &'a S, source_name: impl Into<String>) -> Self {
        Self {
            source,
            source_name: source_name.into(),
            bundle: false,
        }
    }

    /// Also produce the zip bundle.
    pub fn with_bundle(mut self, enable: bool) -> Self {
        self.bundle = enable;
        self
    }

    /// Produce and commit every artifact into `output_dir`.
    pub fn write(
        &self,
        segmentation: &Segmentation,
        resolved: &[ResolvedPage],
        output_dir: &Path,
    ) -> Result<Vec<Artifact>> {
        let mut stage = OutputStage::create(output_dir)?;
        let artifacts = self.stage(&mut stage, segmentation, resolved)?;
        stage.commit()?;
        Ok(artifacts)
    }

    /// Produce every artifact into `stage` without committing.
    pub fn stage(
        &self,
        stage: &mut OutputStage,
        segmentation: &Segmentation,
        resolved: &[ResolvedPage],
    ) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let mut producer_files: HashMap<String, &str> = HashMap::new();

        for group in &segmentation.groups {
            let file_name = producer_file_name(&group.producer_name);
            if let Some(previous) = producer_files.insert(file_name.clone(), &group.producer_name) {
                log::warn!(
                    "Producers '{}' and '{}' share file name {}; only '{}' is kept",
                    previous,
                    group.producer_name,
                    file_name,
                    group.producer_name
                );
            }
            let bytes = self.source.render_pages(&group.pages)?;
            stage.write(&file_name, &bytes)?;
            log::info!("Generated {}: {} pages", file_name, group.pages.len());
            artifacts.push(Artifact {
                file_name,
                kind: ArtifactKind::ProducerDocument,
                producer: Some(group.producer_name.clone()),
                pages: group.pages.clone(),
            });
        }

        if !segmentation.unresolved.is_empty() {
            let file_name = unresolved_file_name();
            let bytes = self.source.render_pages(&segmentation.unresolved)?;
            stage.write(&file_name, &bytes)?;
            log::warn!("Pages without producer: {}", segmentation.unresolved.len());
            artifacts.push(Artifact {
                file_name,
                kind: ArtifactKind::UnresolvedDocument,
                producer: None,
                pages: segmentation.unresolved.clone(),
            });

            let file_name = report_file_name();
            let rows = self.report_rows(&segmentation.unresolved, resolved);
            stage.write(&file_name, &workbook_bytes(REPORT_SHEET, &rows)?)?;
            artifacts.push(Artifact {
                file_name,
                kind: ArtifactKind::UnresolvedReport,
                producer: None,
                pages: segmentation.unresolved.clone(),
            });
        }

        if self.bundle && !artifacts.is_empty() {
            let mut entries = Vec::with_capacity(stage.staged().len());
            for name in stage.staged() {
                entries.push((name.clone(), stage.read(name)?));
            }
            let bytes = bundle_bytes(entries.iter().map(|(n, b)| (n.as_str(), b.as_slice())))?;
            stage.write(BUNDLE_FILE_NAME, &bytes)?;
            artifacts.push(Artifact {
                file_name: BUNDLE_FILE_NAME.to_string(),
                kind: ArtifactKind::Bundle,
                producer: None,
                pages: Vec::new(),
            });
        }

        Ok(artifacts)
    }

    /// Header plus one row per unresolved page: source, page, identifier, client.
    pub fn report_rows(&self, unresolved: &[u32], resolved: &[ResolvedPage]) -> Vec<Vec<ReportCell>> {
        let by_page: HashMap<u32, &ResolvedPage> =
            resolved.iter().map(|r| (r.page_number(), r)).collect();

        let mut rows: Vec<Vec<ReportCell>> = vec![REPORT_HEADERS.iter().map(|h| ReportCell::from(*h)).collect()];
        for &page in unresolved {
            let record = by_page.get(&page).map(|r| &r.page);
            rows.push(vec![
                ReportCell::from(self.source_name.as_str()),
                ReportCell::from(page),
                ReportCell::from(record.and_then(|r| {
                    r.extracted_identifier
                        .clone()
                        .or_else(|| r.candidate_identifier.clone())
                })),
                ReportCell::from(record.and_then(|r| r.extracted_client_label.clone())),
            ]);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_file_stem() {
        assert_eq!(producer_file_stem("O'Reilly & Sons."), "dslip_O'Reilly_E_Sons");
        assert_eq!(producer_file_stem("Acme"), "dslip_Acme");
        assert_eq!(producer_file_stem("A.B. C&D"), "dslip_AB_CED");
    }

    #[test]
    fn test_producer_file_stem_has_no_path_separators() {
        assert_eq!(producer_file_stem("ROSSI S/N"), "dslip_ROSSI_S_N");
        assert_eq!(producer_file_stem("A\\B"), "dslip_A_B");
        assert_eq!(producer_file_name("../x"), "dslip__x.pdf");
    }

    #[test]
    fn test_fixed_file_names() {
        assert_eq!(producer_file_name("Acme"), "dslip_Acme.pdf");
        assert_eq!(unresolved_file_name(), "dslip_SENZA_PRODUTTORE.pdf");
        assert_eq!(report_file_name(), "dslip_SENZA_PRODUTTORE_elenco.xlsx");
    }

    #[test]
    fn test_stage_commit_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        let mut stage = OutputStage::create(&target).unwrap();
        stage.write("a.pdf", b"one").unwrap();
        stage.write("a.pdf", b"two").unwrap();
        stage.write("b.pdf", b"three").unwrap();
        assert_eq!(stage.staged(), &["a.pdf".to_string(), "b.pdf".to_string()]);
        assert!(!target.join("a.pdf").exists());

        let committed = stage.commit().unwrap();
        assert_eq!(committed, vec![target.join("a.pdf"), target.join("b.pdf")]);
        assert_eq!(fs::read(target.join("a.pdf")).unwrap(), b"two");

        let leftovers: Vec<_> = fs::read_dir(&target)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".dslip-staging-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_dropped_stage_leaves_target_clean() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut stage = OutputStage::create(dir.path()).unwrap();
            stage.write("a.pdf", b"one").unwrap();
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), b"old").unwrap();
        let mut stage = OutputStage::create(dir.path()).unwrap();
        stage.write("a.pdf", b"new").unwrap();
        stage.commit().unwrap();
        assert_eq!(fs::read(dir.path().join("a.pdf")).unwrap(), b"new");
    }
}
