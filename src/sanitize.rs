//! Phone sanitation, canonicalization and deduplication.
//!
//! A canonical phone is digits only, starts with the home country code `55`
//! and is 12 or 13 digits long (country code + 2-digit area code + 8- or
//! 9-digit local number).
//!
//! Numbers that already start with `55` are kept as they are; every other
//! number has its leading zeros stripped before the country code is
//! prepended. A local number that happens to begin with `55` is therefore
//! not prefixed, and usually fails the length check afterwards.

use std::collections::HashSet;

use crate::models::{Contact, ContactList, Row, COUNTRY_CODE};

/// Fewest digits a cell may hold to be considered a phone.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Accepted lengths of a canonical phone.
pub const CANONICAL_LENGTHS: [usize; 2] = [12, 13];

/// Strips every character that is not an ASCII digit.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Canonical form of `raw`, or `None` when it cannot be a phone.
pub fn canonicalize_phone(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() < MIN_PHONE_DIGITS {
        return None;
    }

    let canonical = if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits.trim_start_matches('0'))
    };

    CANONICAL_LENGTHS
        .contains(&canonical.len())
        .then_some(canonical)
}

/// Result of sanitizing a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitized {
    pub contacts: ContactList,
    /// Rows rejected by the digit-count or length checks.
    pub discarded: usize,
    /// Rows skipped because their phone was already accepted.
    pub duplicates: usize,
}

/// Extracts one contact per valid row, in source order.
///
/// With `remove_duplicates`, the first row carrying a given canonical phone
/// wins and later rows with the same phone are skipped. Missing cells read
/// as empty strings.
pub fn sanitize_rows(
    rows: &[Row],
    number_index: usize,
    name_index: usize,
    remove_duplicates: bool,
) -> Sanitized {
    let mut out = Sanitized::default();
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        let raw_number = cell_text(row, number_index);
        let Some(phone) = canonicalize_phone(&raw_number) else {
            out.discarded += 1;
            continue;
        };

        if remove_duplicates && !seen.insert(phone.clone()) {
            out.duplicates += 1;
            continue;
        }

        let name = cell_text(row, name_index).trim().to_string();
        out.contacts.push(Contact::new(phone, name));
    }

    tracing::debug!(
        accepted = out.contacts.len(),
        discarded = out.discarded,
        duplicates = out.duplicates,
        "rows sanitized"
    );
    out
}

fn cell_text(row: &Row, index: usize) -> String {
    row.get(index).map(|cell| cell.as_text()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Grid};

    fn rows(data: Vec<Vec<&str>>) -> Vec<Row> {
        Grid::from_strings(data).rows
    }

    #[test]
    fn strips_formatting_and_prefixes_country_code() {
        assert_eq!(
            canonicalize_phone("(11) 99999-8888").as_deref(),
            Some("5511999998888")
        );
        assert_eq!(
            canonicalize_phone("21 8888-7777").as_deref(),
            Some("552188887777")
        );
    }

    #[test]
    fn keeps_numbers_already_prefixed() {
        assert_eq!(
            canonicalize_phone("+55 (11) 98888-7777").as_deref(),
            Some("5511988887777")
        );
    }

    #[test]
    fn strips_leading_zeros_before_prefixing() {
        assert_eq!(
            canonicalize_phone("011 99999-8888").as_deref(),
            Some("5511999998888")
        );
    }

    #[test]
    fn rejects_short_numbers() {
        assert_eq!(canonicalize_phone("99999-888"), None);
        assert_eq!(canonicalize_phone(""), None);
        assert_eq!(canonicalize_phone("no digits here"), None);
    }

    #[test]
    fn rejects_bad_lengths_after_prefixing() {
        // 12 digits without the country code become 14.
        assert_eq!(canonicalize_phone("123456789012"), None);
        // Starts with 55 but only 11 digits: not prefixed, too short.
        assert_eq!(canonicalize_phone("55999998888"), None);
    }

    #[test]
    fn leading_zero_run_can_shrink_below_length() {
        assert_eq!(canonicalize_phone("0000099998888"), None);
    }

    #[test]
    fn sanitizes_rows_in_order() {
        let data = rows(vec![
            vec!["Alice", "(11) 99999-8888"],
            vec!["Bob", "21988887777"],
        ]);
        let out = sanitize_rows(&data, 1, 0, true);
        assert_eq!(
            out.contacts.into_vec(),
            vec![
                Contact::new("5511999998888", "Alice"),
                Contact::new("5521988887777", "Bob"),
            ]
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let data = rows(vec![
            vec!["Alice", "11999998888"],
            vec!["Alicia", "+55 11 99999-8888"],
        ]);
        let out = sanitize_rows(&data, 1, 0, true);
        assert_eq!(out.contacts.len(), 1);
        assert_eq!(out.contacts.as_slice()[0].name, "Alice");
        assert_eq!(out.duplicates, 1);
    }

    #[test]
    fn duplicates_survive_when_not_removed() {
        let data = rows(vec![
            vec!["Alice", "11999998888"],
            vec!["Alicia", "+55 11 99999-8888"],
        ]);
        let out = sanitize_rows(&data, 1, 0, false);
        assert_eq!(out.contacts.len(), 2);
        assert_eq!(out.duplicates, 0);
    }

    #[test]
    fn missing_cells_read_as_empty() {
        let data = vec![vec![Cell::from("11999998888")], vec![]];
        let out = sanitize_rows(&data, 0, 5, true);
        assert_eq!(out.contacts.into_vec(), vec![Contact::new("5511999998888", "")]);
        assert_eq!(out.discarded, 1);
    }

    #[test]
    fn names_are_trimmed() {
        let data = rows(vec![vec!["  Carla  ", "31977776666"]]);
        let out = sanitize_rows(&data, 1, 0, true);
        assert_eq!(out.contacts.as_slice()[0].name, "Carla");
    }

    #[test]
    fn numeric_cells_keep_their_digits() {
        let data = vec![vec![Cell::Float(5511988887777.0), Cell::from("Dani")]];
        let out = sanitize_rows(&data, 0, 1, true);
        assert_eq!(out.contacts.as_slice()[0].phone, "5511988887777");
    }

    #[test]
    fn sanitizing_output_again_changes_nothing() {
        let data = rows(vec![
            vec!["Alice", "(11) 99999-8888"],
            vec!["Bob", "021 8888-7777"],
            vec!["Caio", "123"],
        ]);
        let first = sanitize_rows(&data, 1, 0, true).contacts;
        let replay: Vec<Row> = first
            .iter()
            .map(|c| vec![Cell::from(c.phone.as_str()), Cell::from(c.name.as_str())])
            .collect();
        let second = sanitize_rows(&replay, 0, 1, true).contacts;
        assert_eq!(first, second);
    }

    #[test]
    fn every_accepted_phone_is_canonical() {
        let inputs = [
            "11999998888",
            "(21) 3333-4444",
            "5531988887777",
            "0800 123 4567",
            "+1 415 555 1212",
            "00551199998888",
        ];
        for raw in inputs {
            if let Some(phone) = canonicalize_phone(raw) {
                assert!(phone.starts_with("55"), "{raw} -> {phone}");
                assert!(CANONICAL_LENGTHS.contains(&phone.len()), "{raw} -> {phone}");
                assert!(phone.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
