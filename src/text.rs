//! Page text with line structure.
//!
//! The text operators of a content stream are replayed keeping track of the
//! text line origin: a vertical move (`Td`/`TD` with a y offset, `T*`, `'`,
//! `"`, a `Tm` on another baseline, the end of a text object) starts a new
//! line, a horizontal move between two runs on the same baseline inserts a
//! space. Glyph widths are not known here, so runs that are only kerned apart
//! inside one `TJ` array follow the usual `-100` threshold.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Offsets smaller than this (in text space units) are not moves.
const MOVE_EPSILON: f32 = 0.01;

/// `TJ` adjustment below which a gap counts as a word break.
const TJ_SPACE_THRESHOLD: i64 = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Space,
    Line,
}

struct TextBuilder {
    text: String,
    pending: Option<Break>,
}

impl TextBuilder {
    fn new() -> Self {
        Self {
            text: String::new(),
            pending: None,
        }
    }

    fn request(&mut self, kind: Break) {
        self.pending = self.pending.max(Some(kind));
    }

    fn push_str(&mut self, run: &str) {
        if run.is_empty() {
            return;
        }
        if let Some(kind) = self.pending.take() {
            match kind {
                Break::Line if !self.text.is_empty() && !self.text.ends_with('\n') => {
                    // Trailing blanks of the finished line are noise
                    let trimmed = self.text.trim_end_matches(' ').len();
                    self.text.truncate(trimmed);
                    self.text.push('\n');
                },
                Break::Space if !self.text.is_empty() && !self.text.ends_with([' ', '\n']) => {
                    self.text.push(' ');
                },
                _ => {},
            }
        }
        self.text.push_str(run);
    }

    fn finish(mut self) -> String {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text
    }
}

/// Text of the 1-based page `page_number` of `document`, one line per baseline.
pub fn page_text(document: &Document, page_number: u32) -> Result<String> {
    let page_id = *document
        .get_pages()
        .get(&page_number)
        .ok_or(Error::Pdf(lopdf::Error::PageNumberNotFound(page_number)))?;

    let encodings: BTreeMap<Vec<u8>, &str> = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();

    let content = Content::decode(&document.get_page_content(page_id)?)?;
    Ok(layout_text(&content.operations, &encodings))
}

/// Replay text operators, resolving string operands through `encodings`
/// (font resource name to encoding name).
pub fn layout_text(operations: &[Operation], encodings: &BTreeMap<Vec<u8>, &str>) -> String {
    let mut builder = TextBuilder::new();
    let mut encoding: Option<&str> = None;
    let mut line_y = 0.0_f32;

    for operation in operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => line_y = 0.0,
            "ET" => builder.request(Break::Line),
            "Tf" => {
                encoding = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
            },
            "Td" | "TD" => {
                let tx = number(operands, 0);
                let ty = number(operands, 1);
                if ty.abs() > MOVE_EPSILON {
                    line_y += ty;
                    builder.request(Break::Line);
                } else if tx.abs() > MOVE_EPSILON {
                    builder.request(Break::Space);
                }
            },
            "Tm" => {
                let y = number(operands, 5);
                if (y - line_y).abs() > MOVE_EPSILON {
                    builder.request(Break::Line);
                } else {
                    builder.request(Break::Space);
                }
                line_y = y;
            },
            "T*" => builder.request(Break::Line),
            "Tj" | "TJ" => collect(&mut builder, encoding, operands),
            "'" => {
                builder.request(Break::Line);
                collect(&mut builder, encoding, operands);
            },
            "\"" => {
                builder.request(Break::Line);
                collect(&mut builder, encoding, operands.get(2..).unwrap_or(&[]));
            },
            _ => {},
        }
    }

    builder.finish()
}

fn number(operands: &[Object], index: usize) -> f32 {
    operands.get(index).and_then(|o| o.as_float().ok()).unwrap_or(0.0)
}

fn collect(builder: &mut TextBuilder, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => builder.push_str(&Document::decode_text(encoding, bytes)),
            Object::Array(items) => collect(builder, encoding, items),
            Object::Integer(adjust) if *adjust < TJ_SPACE_THRESHOLD => builder.request(Break::Space),
            Object::Real(adjust) if *adjust < TJ_SPACE_THRESHOLD as f32 => builder.request(Break::Space),
            _ => {},
        }
    }
}
