//! Fixture builders for workbooks and PDFs.
#![allow(dead_code)]

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One cell of a fixture sheet
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    /// Serial date number styled with the built-in `m/d/yyyy` format
    Date(f64),
    Bool(bool),
    /// Formula text (without `=`) with its cached string result
    Formula(&'a str, &'a str),
}

/// One worksheet of a fixture workbook
pub struct Sheet<'a> {
    pub name: &'a str,
    pub hidden: bool,
    /// `(reference, cell)` pairs such as `("B3", Cell::Text("Invoice"))`
    pub cells: Vec<(&'a str, Cell<'a>)>,
}

impl<'a> Sheet<'a> {
    pub fn new(name: &'a str, cells: Vec<(&'a str, Cell<'a>)>) -> Self {
        Self {
            name,
            hidden: false,
            cells,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Splits `B3` into its row number so cells can be grouped into rows
fn row_of(reference: &str) -> u32 {
    reference
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(1)
}

fn sheet_xml(sheet: &Sheet) -> String {
    let mut rows: Vec<(u32, Vec<String>)> = Vec::new();
    for (reference, cell) in &sheet.cells {
        let xml = match cell {
            Cell::Text(text) => format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                reference,
                escape(text)
            ),
            Cell::Number(value) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value),
            Cell::Date(serial) => format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, serial),
            Cell::Bool(value) => format!(
                r#"<c r="{}" t="b"><v>{}</v></c>"#,
                reference,
                u8::from(*value)
            ),
            Cell::Formula(formula, cached) => format!(
                r#"<c r="{}" t="str"><f>{}</f><v>{}</v></c>"#,
                reference,
                escape(formula),
                escape(cached)
            ),
        };
        let row = row_of(reference);
        match rows.iter_mut().find(|(r, _)| *r == row) {
            Some((_, cells)) => cells.push(xml),
            None => rows.push((row, vec![xml])),
        }
    }
    rows.sort_by_key(|(row, _)| *row);

    let body: String = rows
        .into_iter()
        .map(|(row, cells)| format!(r#"<row r="{}">{}</row>"#, row, cells.concat()))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        body
    )
}

/// Writes a minimal `.xlsx` package holding `sheets` in order
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let overrides: String = (1..=sheets.len())
        .map(|i| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            )
        })
        .collect();
    zip.start_file("[Content_Types].xml", options)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{}</Types>"#,
        overrides
    )?;

    zip.start_file("_rels/.rels", options)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )?;

    let entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let state = if sheet.hidden { r#" state="hidden""# } else { "" };
            format!(
                r#"<sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                escape(sheet.name),
                i + 1,
                state,
                i + 1
            )
        })
        .collect();
    zip.start_file("xl/workbook.xml", options)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
        entries
    )?;

    let relationships: String = (1..=sheets.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            )
        })
        .collect();
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#,
        relationships
    )?;

    // Style 0 is General, style 1 the built-in date format 14
    zip.start_file("xl/styles.xml", options)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#
    )?;

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(sheet_xml(sheet).as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

/// Writes a PDF with one page per entry of `pages`; an empty slice gives a
/// document with no pages
pub fn write_pdf(path: &Path, pages: &[&str]) -> Result<()> {
    build_pdf(pages)?.save(path)?;
    Ok(())
}

/// Writes a PDF whose trailer declares Standard security handler encryption
pub fn write_encrypted_pdf(path: &Path, pages: &[&str]) -> Result<()> {
    let mut doc = build_pdf(pages)?;
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![1u8; 16]),
            Object::string_literal(vec![1u8; 16]),
        ],
    );
    doc.save(path)?;
    Ok(())
}

fn build_pdf(pages: &[&str]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::from(page_id));
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
    Ok(doc)
}
