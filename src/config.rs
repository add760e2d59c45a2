//! Configuration for a split run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix shared by every generated file.
pub const OUTPUT_PREFIX: &str = "dslip_";

/// File stem (after the prefix) of the unresolved bucket.
pub const UNRESOLVED_STEM: &str = "SENZA_PRODUTTORE";

/// Suffix appended to the unresolved stem for the side report.
pub const REPORT_SUFFIX: &str = "_elenco";

/// Name of the optional archive holding every generated file.
pub const BUNDLE_FILE_NAME: &str = "dslip_output.zip";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Header names of the three required reference columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column holding the producer name.
    pub producer: String,
    /// Column holding the policy identifier.
    pub identifier: String,
    /// Column holding the client name.
    pub client: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            producer: "PRODUTTORE".to_string(),
            identifier: "NUMERO".to_string(),
            client: "CLIENTE".to_string(),
        }
    }
}

/// What to do when one identifier maps to two different producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Log the conflict and keep the first record in load order.
    #[default]
    Warn,
    /// Fail the load with [`Error::AmbiguousIdentifier`](crate::Error::AmbiguousIdentifier).
    Reject,
}

/// Split run configuration.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Directory scanned when an input path is not given.
    pub working_dir: PathBuf,

    /// Source document; discovered when `None`.
    pub source: Option<PathBuf>,

    /// Reference workbook; discovered when `None`.
    pub table: Option<PathBuf>,

    /// Output directory; `<working_dir>/output` when `None`.
    pub output_dir: Option<PathBuf>,

    /// Reference column headers.
    pub columns: ColumnMapping,

    /// 0-based sheet row holding the headers. Rows above it are decorative.
    pub header_row: usize,

    /// Handling of conflicting identifiers in the reference table.
    pub duplicate_policy: DuplicatePolicy,

    /// Page number to producer overrides applied after the join.
    pub manual_assignments: BTreeMap<u32, String>,

    /// Also write `dslip_output.zip` with every generated file.
    pub bundle: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl SplitConfig {
    /// Create new configuration rooted at `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            source: None,
            table: None,
            output_dir: None,
            columns: ColumnMapping::default(),
            header_row: 1,
            duplicate_policy: DuplicatePolicy::Warn,
            manual_assignments: BTreeMap::new(),
            bundle: false,
        }
    }

    /// Use an explicit source document.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Use an explicit reference workbook.
    pub fn with_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.table = Some(path.into());
        self
    }

    /// Write outputs into `path`.
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Override the reference column headers.
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Set the 0-based header row.
    pub fn with_header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    /// Set the duplicate identifier policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Attribute `page` to `producer` regardless of what was extracted.
    pub fn with_assignment(mut self, page: u32, producer: impl Into<String>) -> Self {
        self.manual_assignments.insert(page, producer.into());
        self
    }

    /// Enable the zip bundle.
    pub fn with_bundle(mut self, enable: bool) -> Self {
        self.bundle = enable;
        self
    }

    /// Effective output directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self.working_dir.join(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Working directory as a path.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
