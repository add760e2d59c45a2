//! Source documents.
//!
//! The splitter only needs three things from a document: how many pages it
//! has, the text of a page, and a new document made of a subset of its pages.
//! [`PdfSource`] provides them on top of `lopdf`, with page text laid out
//! line by line by [`crate::text`].

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::Document;

use crate::error::{Error, Result};
use crate::text;

/// A paged document the splitter can read and subset.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Extracted text of a 1-based page.
    fn page_text(&self, page_number: u32) -> Result<String>;

    /// Serialize a document holding the given 1-based pages, in ascending order.
    fn render_pages(&self, page_numbers: &[u32]) -> Result<Vec<u8>>;
}

/// PDF document loaded with `lopdf`.
pub struct PdfSource {
    document: Document,
    page_count: u32,
}

impl PdfSource {
    /// Open the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path)?;
        let source = Self::from_document(document);
        log::info!("Opened {}: {} pages", path.display(), source.page_count);
        Ok(source)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    fn from_document(document: Document) -> Self {
        let page_count = document.get_pages().len() as u32;
        Self {
            document,
            page_count,
        }
    }

    fn check_page(&self, page_number: u32) -> Result<()> {
        if page_number == 0 || page_number > self.page_count {
            return Err(Error::Pdf(lopdf::Error::PageNumberNotFound(page_number)));
        }
        Ok(())
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page_number: u32) -> Result<String> {
        self.check_page(page_number)?;
        text::page_text(&self.document, page_number)
    }

    fn render_pages(&self, page_numbers: &[u32]) -> Result<Vec<u8>> {
        for &page in page_numbers {
            self.check_page(page)?;
        }
        let keep: BTreeSet<u32> = page_numbers.iter().copied().collect();
        let drop: Vec<u32> = (1..=self.page_count).filter(|n| !keep.contains(n)).collect();

        let mut subset = self.document.clone();
        if !drop.is_empty() {
            subset.delete_pages(&drop);
            subset.prune_objects();
            subset.renumber_objects();
        }

        let mut bytes = Vec::new();
        subset.save_to(&mut bytes)?;
        Ok(bytes)
    }
}
