//! Minimal single-sheet XLSX writer.
//!
//! Produces an Office Open XML workbook with one worksheet and inline string
//! cells, which is all the unresolved-pages report needs. The parts written
//! are the content types, the package and workbook relationships, the
//! workbook and the sheet itself.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

/// One cell of a report row.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportCell {
    /// Inline string
    Text(String),
    /// Numeric value
    Number(f64),
    /// No value
    Empty,
}

impl From<&str> for ReportCell {
    fn from(value: &str) -> Self {
        ReportCell::Text(value.to_string())
    }
}

impl From<String> for ReportCell {
    fn from(value: String) -> Self {
        ReportCell::Text(value)
    }
}

impl From<Option<String>> for ReportCell {
    fn from(value: Option<String>) -> Self {
        value.map(ReportCell::Text).unwrap_or(ReportCell::Empty)
    }
}

impl From<u32> for ReportCell {
    fn from(value: u32) -> Self {
        ReportCell::Number(f64::from(value))
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Serialize `rows` as a workbook with a single sheet named `sheet_name`.
pub fn workbook_bytes(sheet_name: &str, rows: &[Vec<ReportCell>]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet_xml(rows).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        escape(sheet_name)
    )
}

fn sheet_xml(rows: &[Vec<ReportCell>]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#
    ));

    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        xml.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), row_number);
            match cell {
                ReportCell::Text(text) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    escape(text.as_str())
                )),
                ReportCell::Number(value) => {
                    xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value))
                },
                ReportCell::Empty => {},
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Spreadsheet column letters for a 0-based index (0 -> A, 26 -> AA).
fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(3), "D");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_sheet_xml_escapes_and_skips_empty() {
        let rows = vec![vec![
            ReportCell::from("A & <B>"),
            ReportCell::Empty,
            ReportCell::from(3u32),
        ]];
        let xml = sheet_xml(&rows);
        assert!(xml.contains(r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">A &amp; &lt;B&gt;</t></is></c>"#));
        assert!(!xml.contains(r#"r="B1""#));
        assert!(xml.contains(r#"<c r="C1"><v>3</v></c>"#));
    }

    #[test]
    fn test_workbook_contains_parts() {
        let bytes = workbook_bytes("Elenco", &[vec![ReportCell::from("PAGINA")]]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }

        let mut workbook = String::new();
        archive
            .by_name("xl/workbook.xml")
            .unwrap()
            .read_to_string(&mut workbook)
            .unwrap();
        assert!(workbook.contains(r#"<sheet name="Elenco""#));
    }
}
