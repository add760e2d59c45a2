//! Page to producer reconciliation.
//!
//! A left join of the extracted page records against the reference table on
//! the policy identifier. Both sides are normalized before they get here, so
//! the join is a plain string comparison.

use std::collections::BTreeMap;

use crate::extract::PageRecord;
use crate::reference::ReferenceTable;

/// How a page's producer was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Identifier found in the reference table
    Matched,
    /// Producer set by a manual assignment
    Manual,
    /// No producer
    Unresolved,
}

/// A page record joined with at most one reference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    /// The extracted page record
    pub page: PageRecord,
    /// Producer the page is attributed to
    pub producer: Option<String>,
    /// Client name from the matched reference record
    pub reference_client: Option<String>,
    /// How `producer` was decided
    pub resolution: Resolution,
}

impl ResolvedPage {
    /// 1-based page number.
    pub fn page_number(&self) -> u32 {
        self.page.page_number
    }

    /// True when the page has a producer.
    pub fn is_resolved(&self) -> bool {
        self.producer.is_some()
    }
}

/// Joins page records against a reference table.
pub struct Reconciler<'a> {
    table: &'a ReferenceTable,
    assignments: Option<&'a BTreeMap<u32, String>>,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over `table`.
    pub fn new(table: &'a ReferenceTable) -> Self {
        Self {
            table,
            assignments: None,
        }
    }

    /// Apply page to producer overrides after the join.
    pub fn with_assignments(mut self, assignments: &'a BTreeMap<u32, String>) -> Self {
        self.assignments = Some(assignments);
        self
    }

    /// Resolve every page, preserving page order.
    pub fn resolve(&self, pages: &[PageRecord]) -> Vec<ResolvedPage> {
        if let Some(assignments) = self.assignments {
            self.check_assignments(assignments, pages);
        }
        pages.iter().map(|page| self.resolve_page(page)).collect()
    }

    fn resolve_page(&self, page: &PageRecord) -> ResolvedPage {
        let record = page
            .extracted_identifier
            .as_deref()
            .and_then(|id| self.table.lookup(id));
        let reference_client = record.map(|r| r.client_name.clone());
        let matched = record
            .map(|r| r.producer_name.as_str())
            .filter(|producer| !producer.is_empty());

        let manual = self
            .assignments
            .and_then(|a| a.get(&page.page_number))
            .map(String::as_str)
            .filter(|producer| !producer.trim().is_empty());

        let (producer, resolution) = match (manual, matched) {
            (Some(producer), _) => (Some(producer.to_string()), Resolution::Manual),
            (None, Some(producer)) => (Some(producer.to_string()), Resolution::Matched),
            (None, None) => (None, Resolution::Unresolved),
        };

        ResolvedPage {
            page: page.clone(),
            producer,
            reference_client,
            resolution,
        }
    }

    fn check_assignments(&self, assignments: &BTreeMap<u32, String>, pages: &[PageRecord]) {
        let known = self.table.producers();
        for (&page, producer) in assignments {
            if !pages.iter().any(|p| p.page_number == page) {
                log::warn!("Manual assignment for page {} ignored: no such page", page);
            } else if !known.contains(producer.as_str()) {
                log::warn!(
                    "Manual assignment page {} -> '{}': producer not in reference table",
                    page,
                    producer
                );
            } else {
                log::info!("Manual assignment page {} -> {}", page, producer);
            }
        }
    }
}
