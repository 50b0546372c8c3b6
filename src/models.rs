//! Core data models used throughout the contact-list pipeline.
//!
//! These types represent the decoded grid, the cleaned contacts and the
//! run summary that flow from extraction to archive assembly. Every value
//! here is created and consumed within a single request.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Fixed home-country prefix every canonical phone starts with.
pub const COUNTRY_CODE: &str = "55";

/// Smallest accepted chunk size for separated downloads.
pub const MIN_CHUNK_SIZE: usize = 1;
/// Largest accepted chunk size for separated downloads.
pub const MAX_CHUNK_SIZE: usize = 1000;
/// Chunk size used when the caller does not provide one.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// String form of the cell, as a spreadsheet application would print it.
    ///
    /// Integral floats below 1e15 render without a fractional part so that
    /// phone numbers typed into numeric cells keep their exact digits.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{:.0}", f)
                } else {
                    f.to_string()
                }
            }
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// One spreadsheet row; cells are index-aligned with the header.
pub type Row = Vec<Cell>;

/// Decoded tabular content of the uploaded file. The first row is the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Row>,
}

impl Grid {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Builds a grid from string literals; empty strings become [`Cell::Empty`].
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| Cell::from(c.as_ref())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits off the header row. Returns `None` when the grid has no rows.
    pub fn split_header(self) -> Option<(Row, Vec<Row>)> {
        let mut rows = self.rows.into_iter();
        let header = rows.next()?;
        Some((header, rows.collect()))
    }
}

/// A cleaned contact: canonical phone digits plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Digits only, starts with [`COUNTRY_CODE`], length 12 or 13.
    pub phone: String,
    /// Trimmed display name, possibly empty.
    pub name: String,
}

impl Contact {
    pub fn new(phone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
        }
    }
}

/// Ordered list of contacts in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactList {
    contacts: Vec<Contact>,
}

impl ContactList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.contacts.iter()
    }

    pub fn as_slice(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn into_vec(self) -> Vec<Contact> {
        self.contacts
    }
}

impl FromIterator<Contact> for ContactList {
    fn from_iter<T: IntoIterator<Item = Contact>>(iter: T) -> Self {
        Self {
            contacts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ContactList {
    type Item = &'a Contact;
    type IntoIter = std::slice::Iter<'a, Contact>;

    fn into_iter(self) -> Self::IntoIter {
        self.contacts.iter()
    }
}

/// How the cleaned list is split across output spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadType {
    /// One spreadsheet holding every contact.
    Grouped,
    /// One spreadsheet per chunk of `chunk_size` contacts.
    #[default]
    Separated,
}

impl DownloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadType::Grouped => "grouped",
            DownloadType::Separated => "separated",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grouped" => Ok(DownloadType::Grouped),
            "separated" => Ok(DownloadType::Separated),
            other => Err(format!(
                "download_type must be 'grouped' or 'separated', got '{}'",
                other
            )),
        }
    }
}

/// Per-request processing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub remove_duplicates: bool,
    pub download_type: DownloadType,
    /// Ignored for [`DownloadType::Grouped`].
    pub chunk_size: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            download_type: DownloadType::Separated,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ProcessOptions {
    pub fn chunk_size_in_range(&self) -> bool {
        (MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size)
    }
}

/// Read-only summary of one processing run, embedded in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStatistics {
    pub total_contacts: usize,
    pub file_count: usize,
    /// `None` for grouped downloads.
    pub chunk_size: Option<usize>,
    pub download_type: DownloadType,
    pub duplicates_removed: bool,
    /// Data rows read from the source grid (header excluded).
    pub rows_read: usize,
    /// Rows dropped for failing the digit-count or length checks.
    pub rows_discarded: usize,
    /// Rows dropped because their phone was already accepted.
    pub duplicates_skipped: usize,
    pub processed_at: DateTime<Utc>,
}
