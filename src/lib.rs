// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # DSLIP split
//!
//! Splits a DSLIP policy-statement bundle (one PDF, many policies) into one
//! PDF per issuing producer, using a reference workbook that maps policy
//! numbers to producers.
//!
//! ## Stages
//! - **Reference table**: the workbook (title row, header row, data rows) is
//!   normalized into a lookup table ([`reference`]).
//! - **Extraction**: each page's `COMPAGNIA` line yields at most one known
//!   policy number, the `CLIENTE` label yields an informational client name
//!   ([`extract`]).
//! - **Reconciliation**: pages are joined with the table on the policy number,
//!   manual assignments override the join ([`reconcile`]).
//! - **Segmentation**: pages are grouped by producer, the rest is the
//!   unresolved set ([`segment`]).
//! - **Writing**: one `dslip_<producer>.pdf` per group, plus
//!   `dslip_SENZA_PRODUTTORE.pdf` and its `_elenco.xlsx` report for the
//!   unresolved pages, committed all at once ([`writer`]).
//!
//! ## Quick Start
//!
//! ```ignore
//! use dslip_split::{pipeline, SplitConfig};
//!
//! # fn main() -> dslip_split::Result<()> {
//! let config = SplitConfig::new("incoming").with_table("incoming/produttori.xlsx");
//! let summary = pipeline::run(&config)?;
//! println!("{} pages, {} without producer", summary.total_pages, summary.unmatched_pages);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Input discovery
pub mod discovery;

// Reference table
pub mod reference;

// Source documents
pub mod source;
pub mod text;

// Matching and grouping
pub mod extract;
pub mod reconcile;
pub mod segment;

// Output documents
pub mod writer;

// End-to-end runs
pub mod pipeline;

pub use config::{ColumnMapping, DuplicatePolicy, SplitConfig};
pub use error::{Error, Result};
pub use extract::PageRecord;
pub use reconcile::{Reconciler, Resolution, ResolvedPage};
pub use reference::{ReferenceRecord, ReferenceTable};
pub use segment::{ProducerGroup, Segmentation};
pub use source::{PageSource, PdfSource};
