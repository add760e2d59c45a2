//! Shared fixtures: generated PDFs, reference workbooks and an in-memory page source.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use dslip_split::writer::{workbook_bytes, ReportCell};
use dslip_split::{PageSource, PdfSource, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF where each entry of `pages` is the list of text lines of one page.
/// Every line is its own text object.
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let contents = pages
        .iter()
        .map(|lines| {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
                operations.push(Operation::new("Td", vec![50.into(), (780 - 16 * i as i64).into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            operations
        })
        .collect();
    assemble_pdf(contents)
}

/// Build a PDF the way report exporters lay pages out: a single text object
/// per page, every field its own `Tj` placed with `Td`. Each page is a list
/// of lines, each line a list of fields.
pub fn build_positioned_pdf(pages: &[&[&[&str]]]) -> Vec<u8> {
    let contents = pages
        .iter()
        .map(|lines| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
            ];
            for (i, fields) in lines.iter().enumerate() {
                let mut x = 0;
                for (j, field) in fields.iter().enumerate() {
                    if j > 0 {
                        operations.push(Operation::new("Td", vec![90.into(), 0.into()]));
                        x += 90;
                    }
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*field)]));
                }
                if i + 1 < lines.len() {
                    operations.push(Operation::new("Td", vec![(-x).into(), (-16).into()]));
                }
            }
            operations.push(Operation::new("ET", vec![]));
            operations
        })
        .collect();
    assemble_pdf(contents)
}

fn assemble_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a reference workbook: title row, header row, then `(producer, identifier, client)` rows.
pub fn write_reference_workbook(path: &Path, rows: &[(&str, &str, &str)]) {
    let mut sheet = vec![
        vec![ReportCell::from("ELENCO PRODUTTORI")],
        vec![
            ReportCell::from("PRODUTTORE"),
            ReportCell::from("NUMERO"),
            ReportCell::from("CLIENTE"),
        ],
    ];
    for (producer, identifier, client) in rows {
        sheet.push(vec![
            ReportCell::from(*producer),
            ReportCell::from(*identifier),
            ReportCell::from(*client),
        ]);
    }
    std::fs::write(path, workbook_bytes("Produttori", &sheet).unwrap()).unwrap();
}

/// Texts of every page of a PDF file.
pub fn pdf_page_texts(path: &Path) -> Vec<String> {
    let source = PdfSource::open(path).unwrap();
    (1..=source.page_count()).map(|n| source.page_text(n).unwrap()).collect()
}

/// Page source backed by plain strings; rendered documents list their page numbers.
pub struct TextPages {
    pub pages: Vec<String>,
    pub rendered: RefCell<Vec<Vec<u32>>>,
}

impl TextPages {
    pub fn new<S: AsRef<str>>(pages: &[S]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.as_ref().to_string()).collect(),
            rendered: RefCell::new(Vec::new()),
        }
    }
}

impl PageSource for TextPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page_number: u32) -> Result<String> {
        Ok(self.pages[(page_number - 1) as usize].clone())
    }

    fn render_pages(&self, page_numbers: &[u32]) -> Result<Vec<u8>> {
        self.rendered.borrow_mut().push(page_numbers.to_vec());
        let listing: Vec<String> = page_numbers.iter().map(|p| p.to_string()).collect();
        Ok(listing.join(",").into_bytes())
    }
}
