use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ReportError;
use crate::gateway::GatewayRecord;

pub const SHEET_NAME: &str = "Gateways";
pub const HEADERS: [&str; 7] = [
    "Site",
    "Gateway",
    "URL",
    "Client ID",
    "Client Secret",
    "Active",
    "Other Data",
];

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// style 0 = default, style 1 = bold header
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Writes aggregated records to a single-sheet `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    max_column_width: usize,
}

impl ReportWriter {
    pub fn new(max_column_width: usize) -> Self {
        Self { max_column_width }
    }

    pub fn write(&self, records: &[GatewayRecord], output: &Path) -> Result<(), ReportError> {
        let rows: Vec<[String; 7]> = records.iter().map(GatewayRecord::row).collect();
        let widths = column_widths(&rows, self.max_column_width);

        let file = File::create(output)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(&workbook_xml()?)?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(WORKBOOK_RELS.as_bytes())?;
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;
        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(&sheet_xml(&rows, &widths)?)?;
        zip.finish()?;

        info!("Excel file written: {}", output.display());
        log_summary(records);
        Ok(())
    }
}

/// Per column: longest text (header included) + 2, capped.
pub fn column_widths(rows: &[[String; 7]], cap: usize) -> [usize; 7] {
    let mut widths = [0usize; 7];
    for (i, header) in HEADERS.iter().enumerate() {
        let longest = rows
            .iter()
            .map(|row| row[i].chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0);
        widths[i] = (longest + 2).min(cap);
    }
    widths
}

/// Excel column letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn new_writer() -> Result<Writer<Cursor<Vec<u8>>>, ReportError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn workbook_xml() -> Result<Vec<u8>, ReportError> {
    let mut w = new_writer()?;
    w.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("sheets")))?;
    w.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
        ("name", SHEET_NAME),
        ("sheetId", "1"),
        ("r:id", "rId1"),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("sheets")))?;
    w.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(w.into_inner().into_inner())
}

fn sheet_xml(rows: &[[String; 7]], widths: &[usize; 7]) -> Result<Vec<u8>, ReportError> {
    let mut w = new_writer()?;
    w.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)]),
    ))?;

    w.write_event(Event::Start(BytesStart::new("cols")))?;
    for (i, width) in widths.iter().enumerate() {
        let n = (i + 1).to_string();
        let width = width.to_string();
        w.write_event(Event::Empty(BytesStart::new("col").with_attributes([
            ("min", n.as_str()),
            ("max", n.as_str()),
            ("width", width.as_str()),
            ("customWidth", "1"),
        ])))?;
    }
    w.write_event(Event::End(BytesEnd::new("cols")))?;

    w.write_event(Event::Start(BytesStart::new("sheetData")))?;
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    write_row(&mut w, 1, &header, Some("1"))?;
    for (i, row) in rows.iter().enumerate() {
        write_row(&mut w, i + 2, row, None)?;
    }
    w.write_event(Event::End(BytesEnd::new("sheetData")))?;

    w.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner().into_inner())
}

fn write_row(
    w: &mut Writer<Cursor<Vec<u8>>>,
    row_num: usize,
    cells: &[String],
    style: Option<&str>,
) -> Result<(), ReportError> {
    let r = row_num.to_string();
    w.write_event(Event::Start(BytesStart::new("row").with_attributes([("r", r.as_str())])))?;

    for (col, text) in cells.iter().enumerate() {
        // empty cells are left out, as spreadsheet writers do
        if text.is_empty() {
            continue;
        }
        let cell_ref = format!("{}{}", column_letter(col), row_num);
        let mut c = BytesStart::new("c").with_attributes([
            ("r", cell_ref.as_str()),
            ("t", "inlineStr"),
        ]);
        if let Some(s) = style {
            c.push_attribute(("s", s));
        }
        w.write_event(Event::Start(c))?;
        w.write_event(Event::Start(BytesStart::new("is")))?;
        w.write_event(Event::Start(
            BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
        ))?;
        w.write_event(Event::Text(BytesText::new(text)))?;
        w.write_event(Event::End(BytesEnd::new("t")))?;
        w.write_event(Event::End(BytesEnd::new("is")))?;
        w.write_event(Event::End(BytesEnd::new("c")))?;
    }

    w.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn log_summary(records: &[GatewayRecord]) {
    let mut by_site: Vec<(&str, Vec<&str>)> = Vec::new();
    for r in records {
        match by_site.iter_mut().find(|(site, _)| *site == r.source_id) {
            Some((_, names)) => names.push(r.name.as_str()),
            None => by_site.push((r.source_id.as_str(), vec![r.name.as_str()])),
        }
    }

    info!("Sites processed: {}", by_site.len());
    info!("Total gateways: {}", records.len());
    for (site, names) in &by_site {
        info!("{}: {}", site, names.join(", "));
    }
}
