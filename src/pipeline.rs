//! End-to-end processing of one uploaded contact spreadsheet.
//!
//! ```text
//! bytes ─▶ extract ─▶ header ─▶ classify ─▶ sanitize ─▶ archive
//! ```
//!
//! The flow is linear and single-pass. Nothing is kept between calls.

use crate::archive::{build_archive, ProcessedArchive, RunCounts};
use crate::classify::{detect_columns, ColumnMatch, Columns};
use crate::error::ProcessError;
use crate::extract::decode_spreadsheet;
use crate::header::normalize_header;
use crate::models::{ContactList, Grid, ProcessOptions, Row};
use crate::sanitize::{sanitize_rows, Sanitized};

/// Decodes `bytes` and runs the whole pipeline on the resulting grid.
pub fn process_upload(
    bytes: &[u8],
    filename: Option<&str>,
    options: &ProcessOptions,
) -> Result<ProcessedArchive, ProcessError> {
    let grid = decode_spreadsheet(bytes, filename)?;
    process_grid(grid, options)
}

/// Runs normalizer → classifier → sanitizer → archive builder on `grid`.
pub fn process_grid(grid: Grid, options: &ProcessOptions) -> Result<ProcessedArchive, ProcessError> {
    let prepared = prepare(grid, options)?;

    if prepared.sanitized.contacts.is_empty() {
        return Err(ProcessError::NoValidPhones);
    }

    let counts = RunCounts {
        rows_read: prepared.rows_read,
        rows_discarded: prepared.sanitized.discarded,
        duplicates_skipped: prepared.sanitized.duplicates,
    };
    let archive = build_archive(&prepared.sanitized.contacts, options, counts)?;

    tracing::info!(
        contacts = archive.statistics.total_contacts,
        files = archive.statistics.file_count,
        rows_read = counts.rows_read,
        discarded = counts.rows_discarded,
        duplicates = counts.duplicates_skipped,
        download_type = %options.download_type,
        "contact list processed"
    );
    Ok(archive)
}

/// What the pipeline found in a grid, without building an archive.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub header: Vec<String>,
    pub number_column: ColumnMatch,
    pub name_column: ColumnMatch,
    pub rows_read: usize,
    pub contacts: ContactList,
    pub discarded: usize,
    pub duplicates: usize,
}

/// Decodes and classifies `bytes`, returning the detection results.
pub fn inspect_upload(
    bytes: &[u8],
    filename: Option<&str>,
    options: &ProcessOptions,
) -> Result<Inspection, ProcessError> {
    let grid = decode_spreadsheet(bytes, filename)?;
    let prepared = prepare(grid, options)?;
    Ok(Inspection {
        header: prepared.header,
        number_column: prepared.columns.number,
        name_column: prepared.columns.name,
        rows_read: prepared.rows_read,
        contacts: prepared.sanitized.contacts,
        discarded: prepared.sanitized.discarded,
        duplicates: prepared.sanitized.duplicates,
    })
}

struct Prepared {
    header: Vec<String>,
    columns: Columns,
    rows_read: usize,
    sanitized: Sanitized,
}

fn prepare(grid: Grid, options: &ProcessOptions) -> Result<Prepared, ProcessError> {
    if grid.len() <= 1 {
        return Err(ProcessError::EmptySheet);
    }
    let (raw_header, rows): (Row, Vec<Row>) = grid.split_header().ok_or(ProcessError::EmptySheet)?;
    let header = normalize_header(&raw_header);
    let columns = detect_columns(&header, &rows)?;
    let sanitized = sanitize_rows(
        &rows,
        columns.number.index,
        columns.name.index,
        options.remove_duplicates,
    );

    Ok(Prepared {
        header,
        columns,
        rows_read: rows.len(),
        sanitized,
    })
}
