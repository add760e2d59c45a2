//! End-to-end split runs.
//!
//! `run` wires the stages together for files on disk: discovery, reference
//! loading, per-page extraction, reconciliation, segmentation and writing.
//! `split` and `analyze` do the same for any [`PageSource`], which is how the
//! tests drive the pipeline without real PDFs.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SplitConfig;
use crate::discovery::{resolve_inputs, RunInputs};
use crate::error::Result;
use crate::extract::{extract_pages, PageRecord};
use crate::reconcile::{Reconciler, ResolvedPage};
use crate::reference::ReferenceTable;
use crate::segment::{segment, Segmentation};
use crate::source::{PageSource, PdfSource};
use crate::writer::{Artifact, ArtifactKind, DocumentWriter};

/// Everything derived from a source document before writing.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// One record per page, in page order
    pub pages: Vec<PageRecord>,
    /// Pages joined with the reference table
    pub resolved: Vec<ResolvedPage>,
    /// Producer groups and unresolved pages
    pub segmentation: Segmentation,
}

/// Page count of one producer file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerSummary {
    /// Producer name
    pub producer: String,
    /// Number of pages in the file
    pub pages: usize,
    /// Generated file name
    pub file: String,
}

/// Outcome of a split run.
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    /// Source document
    pub source: PathBuf,
    /// Reference workbook
    pub table: PathBuf,
    /// Directory the files were written to
    pub output_dir: PathBuf,
    /// Pages in the source document
    pub total_pages: u32,
    /// Pages attributed to a producer
    pub matched_pages: usize,
    /// Pages without producer
    pub unmatched_pages: usize,
    /// Identifiers the reference table maps to more than one producer
    pub identifier_conflicts: usize,
    /// Per producer page counts
    pub producers: Vec<ProducerSummary>,
    /// Every generated file
    pub artifacts: Vec<Artifact>,
}

/// Extract, reconcile and segment `source` against `table`.
pub fn analyze<S>(source: &S, table: &ReferenceTable, config: &SplitConfig) -> Analysis
where
    S: PageSource + ?Sized,
{
    let pages = extract_pages(source, table);
    let resolved = Reconciler::new(table)
        .with_assignments(&config.manual_assignments)
        .resolve(&pages);
    let segmentation = segment(&resolved);
    log::info!(
        "{} pages: {} matched to {} producers, {} without producer",
        segmentation.total_pages,
        segmentation.matched_pages(),
        segmentation.producer_count(),
        segmentation.unresolved_pages()
    );
    Analysis {
        pages,
        resolved,
        segmentation,
    }
}

/// Split `source` into `output_dir`.
///
/// Nothing is written to `output_dir` unless the partition check passes and
/// every artifact was produced.
pub fn split<S>(
    source: &S,
    source_name: &str,
    table: &ReferenceTable,
    config: &SplitConfig,
    output_dir: &Path,
) -> Result<(Analysis, Vec<Artifact>)>
where
    S: PageSource + ?Sized,
{
    let analysis = analyze(source, table, config);
    analysis.segmentation.verify()?;

    let artifacts = DocumentWriter::new(source, source_name)
        .with_bundle(config.bundle)
        .write(&analysis.segmentation, &analysis.resolved, output_dir)?;
    Ok((analysis, artifacts))
}

/// Load the inputs named or discovered by `config`.
pub fn load_inputs(config: &SplitConfig) -> Result<(RunInputs, ReferenceTable, PdfSource)> {
    let inputs = resolve_inputs(config)?;
    let table = ReferenceTable::load(
        &inputs.table,
        &config.columns,
        config.header_row,
        config.duplicate_policy,
    )?;
    let source = PdfSource::open(&inputs.source)?;
    Ok((inputs, table, source))
}

/// Analyse the configured inputs without writing anything.
pub fn preview(config: &SplitConfig) -> Result<Analysis> {
    let (_, table, source) = load_inputs(config)?;
    Ok(analyze(&source, &table, config))
}

/// Run a complete split as configured.
pub fn run(config: &SplitConfig) -> Result<SplitSummary> {
    let (inputs, table, source) = load_inputs(config)?;
    let source_name = inputs
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (analysis, artifacts) = split(&source, &source_name, &table, config, &inputs.output_dir)?;
    log::info!(
        "Wrote {} files to {}",
        artifacts.len(),
        inputs.output_dir.display()
    );

    Ok(summarize(inputs, &table, &analysis, artifacts))
}

fn summarize(
    inputs: RunInputs,
    table: &ReferenceTable,
    analysis: &Analysis,
    artifacts: Vec<Artifact>,
) -> SplitSummary {
    let segmentation = &analysis.segmentation;
    let producers = artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::ProducerDocument)
        .map(|a| ProducerSummary {
            producer: a.producer.clone().unwrap_or_default(),
            pages: a.pages.len(),
            file: a.file_name.clone(),
        })
        .collect();

    SplitSummary {
        source: inputs.source,
        table: inputs.table,
        output_dir: inputs.output_dir,
        total_pages: segmentation.total_pages,
        matched_pages: segmentation.matched_pages(),
        unmatched_pages: segmentation.unresolved_pages(),
        identifier_conflicts: table.conflicts().len(),
        producers,
        artifacts,
    }
}
