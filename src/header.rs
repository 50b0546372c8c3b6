//! Header row normalization.

use crate::models::Cell;

/// Lower-cases and trims every header cell so labels can be compared.
///
/// Never fails; empty or missing cells become empty strings.
pub fn normalize_header(header: &[Cell]) -> Vec<String> {
    header
        .iter()
        .map(|cell| cell.as_text().trim().to_lowercase())
        .collect()
}
