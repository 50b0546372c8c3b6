//! Tabular grid extraction from uploaded spreadsheet bytes.
//!
//! Workbooks (xlsx, xlsm, xls, ods) are read with `calamine`; anything that
//! is not a workbook container is parsed as delimited text with `csv`. Only
//! the active worksheet is read (the first one when the workbook does not
//! record an active tab), and cells keep their position relative to `A1` so
//! header and data columns stay aligned.

use calamine::{Data, Reader};
use std::borrow::Cow;
use std::io::{Cursor, Read};

use crate::error::ProcessError;
use crate::models::{Cell, Grid, Row};

/// Accepted MIME types for uploads.
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_CSV: &str = "text/csv";

/// Extensions recognised as spreadsheet uploads.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv", "txt"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Upper bound on `xl/workbook.xml` when looking up the active tab.
const MAX_WORKBOOK_XML_BYTES: u64 = 4 * 1024 * 1024;

/// Container format detected from the upload payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

/// Lower-cased extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Decides how to read `bytes`. Magic numbers win over the file name.
pub fn detect_format(bytes: &[u8], filename: Option<&str>) -> Result<SourceFormat, ProcessError> {
    if bytes.is_empty() {
        return Err(ProcessError::Decode("file is empty".to_string()));
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC) {
        return Ok(SourceFormat::Workbook);
    }
    match filename.and_then(file_extension).as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "ods") => Err(ProcessError::Decode(
            "file extension says workbook but content is not a workbook".to_string(),
        )),
        _ => Ok(SourceFormat::Csv),
    }
}

/// Decodes an uploaded file into a [`Grid`]. The header row is kept as the
/// first row.
pub fn decode_spreadsheet(bytes: &[u8], filename: Option<&str>) -> Result<Grid, ProcessError> {
    let mut rows = match detect_format(bytes, filename)? {
        SourceFormat::Workbook => decode_workbook(bytes)?,
        SourceFormat::Csv => decode_csv(bytes)?,
    };
    trim_trailing_empty_rows(&mut rows);
    tracing::debug!(rows = rows.len(), "decoded spreadsheet");
    Ok(Grid::new(rows))
}

fn decode_workbook(bytes: &[u8]) -> Result<Vec<Row>, ProcessError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ProcessError::Decode(e.to_string()))?;
    let sheet = active_sheet_index(bytes);
    let range = workbook
        .worksheet_range_at(sheet)
        .ok_or_else(|| ProcessError::Decode("workbook has no worksheets".to_string()))?
        .map_err(|e| ProcessError::Decode(e.to_string()))?;

    // calamine ranges begin at the first used cell; pad back to A1.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Row> = vec![Vec::new(); row_offset];
    for data_row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(data_row.iter().map(cell_from_data));
        rows.push(cells);
    }
    Ok(rows)
}

/// Zero-based index of the tab that was active when an xlsx was saved.
///
/// Reads `activeTab` from the first `<workbookView>` in `xl/workbook.xml`.
/// Other workbook formats, and xlsx files without the attribute, yield `0`.
fn active_sheet_index(bytes: &[u8]) -> usize {
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
        return 0;
    };
    let Ok(entry) = archive.by_name("xl/workbook.xml") else {
        return 0;
    };
    let mut xml = Vec::new();
    if entry
        .take(MAX_WORKBOOK_XML_BYTES)
        .read_to_end(&mut xml)
        .is_err()
    {
        return 0;
    }

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e))
                if e.local_name().as_ref() == b"workbookView" =>
            {
                return e
                    .try_get_attribute("activeTab")
                    .ok()
                    .flatten()
                    .and_then(|attr| attr.unescape_value().ok()?.trim().parse().ok())
                    .unwrap_or(0);
            }
            Ok(quick_xml::events::Event::Eof) | Err(_) => return 0,
            _ => {}
        }
        buf.clear();
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<Row>, ProcessError> {
    if bytes.contains(&0) {
        return Err(ProcessError::Decode(
            "binary content is neither a workbook nor CSV".to_string(),
        ));
    }
    let decoded = decode_text(bytes);
    let text: &str = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| ProcessError::Decode(format!("CSV row {}: {}", index + 1, e)))?;
        rows.push(record.iter().map(Cell::from).collect());
    }
    Ok(rows)
}

/// UTF-8 when valid, otherwise Latin-1 (every byte maps to the same code point).
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Picks `;` over `,` when the first line uses more semicolons.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn trim_trailing_empty_rows(rows: &mut Vec<Row>) {
    while rows
        .last()
        .is_some_and(|row| row.iter().all(|c| c.as_text().trim().is_empty()))
    {
        rows.pop();
    }
}
