//! Producer reference table.
//!
//! The table comes from a workbook whose first row is a decorative title,
//! second row the column headers and the remaining rows data. Columns are
//! located by header name. Policy identifiers and client names are
//! normalized (trimmed, uppercased) on load so that matching against page
//! text compares like with like.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use indexmap::IndexMap;

use crate::config::{ColumnMapping, DuplicatePolicy};
use crate::error::{Error, Result};

/// One data row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    /// Producer the policy belongs to
    pub producer_name: String,
    /// Normalized policy identifier
    pub policy_identifier: String,
    /// Normalized client name
    pub client_name: String,
    /// 1-based sheet row the record was read from
    pub row: usize,
}

/// An identifier that appears with more than one producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierConflict {
    /// Normalized policy identifier
    pub identifier: String,
    /// Producer of the record that is used for matching
    pub kept_producer: String,
    /// Producer of the ignored record
    pub ignored_producer: String,
    /// Sheet row of the ignored record
    pub row: usize,
}

/// Membership test for valid policy identifiers.
pub trait IdentifierLookup {
    /// True when `candidate` (already normalized) is a known identifier.
    fn contains_identifier(&self, candidate: &str) -> bool;
}

impl IdentifierLookup for HashSet<String> {
    fn contains_identifier(&self, candidate: &str) -> bool {
        self.contains(candidate)
    }
}

impl IdentifierLookup for BTreeSet<String> {
    fn contains_identifier(&self, candidate: &str) -> bool {
        self.contains(candidate)
    }
}

/// Normalize a policy identifier or client name.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Loaded, lookup-ready reference table.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<ReferenceRecord>,
    index: IndexMap<String, usize>,
    conflicts: Vec<IdentifierConflict>,
}

impl ReferenceTable {
    /// Load the first worksheet of the workbook at `path`.
    pub fn load(
        path: impl AsRef<Path>,
        columns: &ColumnMapping,
        header_row: usize,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            Error::Workbook(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::Workbook(format!("No sheets found in {}", path.display())))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Error::Workbook(format!("Failed to read sheet '{}': {}", sheet, e)))?;

        let grid = range_to_grid(&range);
        let table = Self::from_grid(&grid, columns, header_row, policy)?;
        log::info!(
            "Reference table loaded from {}: {} rows, {} distinct identifiers",
            path.display(),
            table.len(),
            table.identifier_count()
        );
        Ok(table)
    }

    /// Build the table from sheet rows, where `grid[0]` is the first sheet row.
    pub fn from_grid(
        grid: &[Vec<String>],
        columns: &ColumnMapping,
        header_row: usize,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        let headers = grid.get(header_row).map(Vec::as_slice).unwrap_or(&[]);
        let producer_col = find_column(headers, &columns.producer);
        let identifier_col = find_column(headers, &columns.identifier);
        let client_col = find_column(headers, &columns.client);

        let (producer_col, identifier_col, client_col) =
            match (producer_col, identifier_col, client_col) {
                (Some(p), Some(i), Some(c)) => (p, i, c),
                (p, i, c) => {
                    let missing = [(p, &columns.producer), (i, &columns.identifier), (c, &columns.client)]
                        .into_iter()
                        .filter(|(col, _)| col.is_none())
                        .map(|(_, name)| name.clone())
                        .collect();
                    return Err(Error::Schema { missing });
                },
            };

        let mut table = ReferenceTable::default();
        for (offset, row) in grid.iter().enumerate().skip(header_row + 1) {
            let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");
            let record = ReferenceRecord {
                producer_name: cell(producer_col).trim().to_string(),
                policy_identifier: normalize(cell(identifier_col)),
                client_name: normalize(cell(client_col)),
                row: offset + 1,
            };
            table.insert(record, policy)?;
        }

        Ok(table)
    }

    fn insert(&mut self, record: ReferenceRecord, policy: DuplicatePolicy) -> Result<()> {
        let position = self.records.len();
        if !record.policy_identifier.is_empty() {
            match self.index.get(&record.policy_identifier) {
                None => {
                    self.index.insert(record.policy_identifier.clone(), position);
                },
                Some(&first) => {
                    let kept = &self.records[first];
                    if kept.producer_name != record.producer_name {
                        if policy == DuplicatePolicy::Reject {
                            return Err(Error::AmbiguousIdentifier {
                                identifier: record.policy_identifier,
                                first: kept.producer_name.clone(),
                                second: record.producer_name,
                            });
                        }
                        log::warn!(
                            "Identifier {} (row {}) maps to '{}' but row {} already maps it to '{}'; keeping '{}'",
                            record.policy_identifier,
                            record.row,
                            record.producer_name,
                            kept.row,
                            kept.producer_name,
                            kept.producer_name
                        );
                        self.conflicts.push(IdentifierConflict {
                            identifier: record.policy_identifier.clone(),
                            kept_producer: kept.producer_name.clone(),
                            ignored_producer: record.producer_name.clone(),
                            row: record.row,
                        });
                    }
                },
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Record used for `identifier`: the first one in load order.
    pub fn lookup(&self, identifier: &str) -> Option<&ReferenceRecord> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    /// All records in load order, duplicates included.
    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// Identifiers that were seen with more than one producer.
    pub fn conflicts(&self) -> &[IdentifierConflict] {
        &self.conflicts
    }

    /// Distinct non-empty producer names, sorted.
    pub fn producers(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.producer_name.as_str())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Number of distinct identifiers.
    pub fn identifier_count(&self) -> usize {
        self.index.len()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IdentifierLookup for ReferenceTable {
    fn contains_identifier(&self, candidate: &str) -> bool {
        self.index.contains_key(candidate)
    }
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = normalize(name);
    headers.iter().position(|h| normalize(h) == wanted)
}

/// Expand a worksheet range into rows indexed from the first sheet row.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row];
    grid.extend(
        range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>()),
    );
    grid
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Policy numbers stored as numbers print without a fraction
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        },
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}
