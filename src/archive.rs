//! Output archive assembly.
//!
//! The cleaned contact list is partitioned into one group (grouped download)
//! or consecutive chunks of `chunk_size` contacts (separated download). Each
//! group is rendered as its own `.xlsx` with a `Mobile Number` / `Name`
//! header, and all of them are zipped together with a statistics report.
//!
//! Everything is built in memory. A rendered chunk lives only until it has
//! been copied into the archive, on success and on error alike.

use std::io::{Cursor, Write};

use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ProcessError;
use crate::models::{Contact, ContactList, DownloadType, ProcessOptions, ProcessingStatistics};
use crate::stats::{render_report, REPORT_FILE_NAME};
use crate::xlsx::encode_spreadsheet;

/// Header row written at the top of every generated spreadsheet.
pub const HEADER_ROW: [&str; 2] = ["Mobile Number", "Name"];

/// Entry name used for grouped downloads.
pub const GROUPED_FILE_NAME: &str = "lista_completa.xlsx";

/// Row counts gathered before archive assembly, carried into the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub rows_read: usize,
    pub rows_discarded: usize,
    pub duplicates_skipped: usize,
}

/// A finished archive, ready to be sent or written to disk.
#[derive(Debug, Clone)]
pub struct ProcessedArchive {
    /// Suggested download name, `listas_padronizadas_<uuid>.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Names of the spreadsheet entries, in archive order.
    pub entries: Vec<String>,
    pub statistics: ProcessingStatistics,
}

/// Entry name of the chunk at zero-based `index` (`lista_001.xlsx`, ...).
pub fn chunk_file_name(index: usize) -> String {
    format!("lista_{:03}.xlsx", index + 1)
}

/// Pairs every output entry name with the contacts it will hold.
///
/// `chunk_size` must be at least 1; it is ignored for grouped downloads.
pub fn plan_chunks(
    contacts: &[Contact],
    download_type: DownloadType,
    chunk_size: usize,
) -> Vec<(String, &[Contact])> {
    match download_type {
        DownloadType::Grouped => vec![(GROUPED_FILE_NAME.to_string(), contacts)],
        DownloadType::Separated => contacts
            .chunks(chunk_size.max(1))
            .enumerate()
            .map(|(index, chunk)| (chunk_file_name(index), chunk))
            .collect(),
    }
}

/// Header row followed by one `[phone, name]` row per contact.
pub fn chunk_rows(contacts: &[Contact]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(contacts.len() + 1);
    rows.push(HEADER_ROW.iter().map(|h| h.to_string()).collect());
    rows.extend(
        contacts
            .iter()
            .map(|c| vec![c.phone.clone(), c.name.clone()]),
    );
    rows
}

fn stored() -> SimpleFileOptions {
    // xlsx payloads are already deflated
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Renders every group and packages them, plus the report, into one zip.
pub fn build_archive(
    contacts: &ContactList,
    options: &ProcessOptions,
    counts: RunCounts,
) -> Result<ProcessedArchive, ProcessError> {
    if options.download_type == DownloadType::Separated && !options.chunk_size_in_range() {
        return Err(ProcessError::InvalidOption(format!(
            "chunk_size must be between 1 and 1000, got {}",
            options.chunk_size
        )));
    }

    let plan = plan_chunks(contacts.as_slice(), options.download_type, options.chunk_size);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(plan.len());

    for (name, chunk) in plan {
        let rendered = encode_spreadsheet(&chunk_rows(chunk))?;
        zip.start_file(name.as_str(), stored())?;
        zip.write_all(&rendered)?;
        tracing::debug!(entry = %name, contacts = chunk.len(), bytes = rendered.len(), "archive entry written");
        entries.push(name);
    }

    let statistics = ProcessingStatistics {
        total_contacts: contacts.len(),
        file_count: entries.len(),
        chunk_size: match options.download_type {
            DownloadType::Grouped => None,
            DownloadType::Separated => Some(options.chunk_size),
        },
        download_type: options.download_type,
        duplicates_removed: options.remove_duplicates,
        rows_read: counts.rows_read,
        rows_discarded: counts.rows_discarded,
        duplicates_skipped: counts.duplicates_skipped,
        processed_at: chrono::Utc::now(),
    };

    zip.start_file(REPORT_FILE_NAME, deflated())?;
    zip.write_all(render_report(&statistics).as_bytes())?;

    let bytes = zip.finish()?.into_inner();

    Ok(ProcessedArchive {
        file_name: format!("listas_padronizadas_{}.zip", Uuid::new_v4()),
        bytes,
        entries,
        statistics,
    })
}
