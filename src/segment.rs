//! Grouping of resolved pages by producer.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::reconcile::ResolvedPage;

/// Pages attributed to one producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerGroup {
    /// Producer name as it appears in the reference table
    pub producer_name: String,
    /// Distinct page numbers, ascending
    pub pages: Vec<u32>,
}

/// Producer groups plus the unresolved remainder of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// Groups sorted by producer name
    pub groups: Vec<ProducerGroup>,
    /// Pages without producer, ascending
    pub unresolved: Vec<u32>,
    /// Number of pages of the source document
    pub total_pages: u32,
}

impl Segmentation {
    /// Number of pages attributed to some producer.
    pub fn matched_pages(&self) -> usize {
        self.groups.iter().map(|g| g.pages.len()).sum()
    }

    /// Number of pages without producer.
    pub fn unresolved_pages(&self) -> usize {
        self.unresolved.len()
    }

    /// Number of producer groups.
    pub fn producer_count(&self) -> usize {
        self.groups.len()
    }

    /// Check that every page `1..=total_pages` is in exactly one group or in
    /// the unresolved set.
    pub fn verify(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        let buckets = self
            .groups
            .iter()
            .map(|g| (g.producer_name.as_str(), &g.pages))
            .chain(std::iter::once(("unresolved", &self.unresolved)));

        for (name, pages) in buckets {
            if pages.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Partition(format!("pages of '{}' are not strictly ascending", name)));
            }
            for &page in pages {
                if page == 0 || page > self.total_pages {
                    return Err(Error::Partition(format!(
                        "page {} of '{}' is outside 1..={}",
                        page, name, self.total_pages
                    )));
                }
                if !seen.insert(page) {
                    return Err(Error::Partition(format!("page {} appears more than once", page)));
                }
            }
        }

        if seen.len() != self.total_pages as usize {
            let missing: Vec<u32> = (1..=self.total_pages).filter(|p| !seen.contains(p)).collect();
            return Err(Error::Partition(format!("pages {:?} are not assigned", missing)));
        }
        Ok(())
    }
}

/// Group resolved pages by producer and compute the unresolved complement.
pub fn segment(resolved: &[ResolvedPage]) -> Segmentation {
    let mut by_producer: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    let mut all_pages = BTreeSet::new();

    for page in resolved {
        all_pages.insert(page.page_number());
        if let Some(producer) = page.producer.as_deref() {
            by_producer.entry(producer).or_default().insert(page.page_number());
        }
    }

    let mut grouped = BTreeSet::new();
    let groups: Vec<ProducerGroup> = by_producer
        .into_iter()
        .map(|(producer, pages)| {
            // A page attributed to a producer already seen stays with the first (sorted) one
            let pages: Vec<u32> = pages.into_iter().filter(|p| grouped.insert(*p)).collect();
            ProducerGroup {
                producer_name: producer.to_string(),
                pages,
            }
        })
        .filter(|g| !g.pages.is_empty())
        .collect();

    let unresolved = all_pages.difference(&grouped).copied().collect();

    Segmentation {
        groups,
        unresolved,
        total_pages: all_pages.len() as u32,
    }
}
