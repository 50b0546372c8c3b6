//! Column classification for phone and name columns.
//!
//! Each target column is located independently in two stages:
//!
//! 1. **Keyword**: the first header cell (left to right) containing any of
//!    the target's keywords wins. Column order decides, not keyword order.
//! 2. **Content**: only when no header matched. Every cell of every data row
//!    is tested against a shape predicate; the column with the most hits is
//!    chosen, ties going to the lowest index. Fewer than two hits means the
//!    column is reported as absent rather than guessed.

use std::collections::BTreeMap;

use crate::error::ProcessError;
use crate::models::{Cell, Row};
use crate::sanitize::{digits_only, MIN_PHONE_DIGITS};

/// Header keywords that mark a phone column.
pub const PHONE_KEYWORDS: &[&str] = &[
    "phone", "telefone", "cel", "whats", "numero", "number", "contato",
];

/// Header keywords that mark a name column.
pub const NAME_KEYWORDS: &[&str] = &["name", "nome", "contato", "cliente"];

/// Minimum number of matching cells for the content stage to pick a column.
const MIN_CONTENT_HITS: usize = 2;

/// Which stage located a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStage {
    Keyword,
    Content,
}

impl DetectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStage::Keyword => "keyword",
            DetectionStage::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMatch {
    pub index: usize,
    pub stage: DetectionStage,
}

/// The two columns the sanitizer reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub number: ColumnMatch,
    pub name: ColumnMatch,
}

/// Index of the first non-empty header cell containing any keyword.
pub fn detect_by_keywords(header: &[String], keywords: &[&str]) -> Option<usize> {
    header.iter().position(|column| {
        !column.is_empty() && keywords.iter().any(|keyword| column.contains(keyword))
    })
}

/// Scores every column by how many cells satisfy `rule`.
///
/// Ranking is count descending, then column index ascending.
pub fn detect_by_content<F>(rows: &[Row], rule: F) -> Option<usize>
where
    F: Fn(&Cell) -> bool,
{
    let mut scores: BTreeMap<usize, usize> = BTreeMap::new();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if rule(cell) {
                *scores.entry(index).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(usize, usize)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .first()
        .filter(|(_, hits)| *hits >= MIN_CONTENT_HITS)
        .map(|(index, _)| *index)
}

/// At least ten digits once every non-digit is stripped.
pub fn looks_like_phone(cell: &Cell) -> bool {
    digits_only(&cell.as_text()).len() >= MIN_PHONE_DIGITS
}

/// Two or more characters after trimming and at least one Latin letter
/// (ASCII or the accented Latin-1 range).
pub fn looks_like_name(cell: &Cell) -> bool {
    let text = cell.as_text();
    text.trim().chars().count() >= 2 && text.chars().any(is_latin_letter)
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c)
}

pub fn detect_number_column(header: &[String], rows: &[Row]) -> Option<ColumnMatch> {
    detect_column(header, rows, PHONE_KEYWORDS, looks_like_phone)
}

pub fn detect_name_column(header: &[String], rows: &[Row]) -> Option<ColumnMatch> {
    detect_column(header, rows, NAME_KEYWORDS, looks_like_name)
}

fn detect_column(
    header: &[String],
    rows: &[Row],
    keywords: &[&str],
    rule: fn(&Cell) -> bool,
) -> Option<ColumnMatch> {
    if let Some(index) = detect_by_keywords(header, keywords) {
        return Some(ColumnMatch {
            index,
            stage: DetectionStage::Keyword,
        });
    }
    detect_by_content(rows, rule).map(|index| ColumnMatch {
        index,
        stage: DetectionStage::Content,
    })
}

/// Locates both columns, failing when either one is missing.
pub fn detect_columns(header: &[String], rows: &[Row]) -> Result<Columns, ProcessError> {
    let number = detect_number_column(header, rows);
    let name = detect_name_column(header, rows);

    match (number, name) {
        (Some(number), Some(name)) => {
            tracing::debug!(
                number = number.index,
                number_stage = number.stage.as_str(),
                name = name.index,
                name_stage = name.stage.as_str(),
                "columns identified"
            );
            Ok(Columns { number, name })
        }
        (number, name) => Err(ProcessError::ColumnsNotIdentified {
            number: number.map(|m| m.index),
            name: name.map(|m| m.index),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::normalize_header;
    use crate::models::Grid;

    fn split(rows: Vec<Vec<&str>>) -> (Vec<String>, Vec<Row>) {
        let (header, data) = Grid::from_strings(rows).split_header().unwrap();
        (normalize_header(&header), data)
    }

    #[test]
    fn keyword_stage_finds_both_columns() {
        let (header, rows) = split(vec![
            vec!["Nome completo", "Celular"],
            vec!["Alice", "(11) 99999-8888"],
        ]);
        let columns = detect_columns(&header, &rows).unwrap();
        assert_eq!(columns.number.index, 1);
        assert_eq!(columns.number.stage, DetectionStage::Keyword);
        assert_eq!(columns.name.index, 0);
        assert_eq!(columns.name.stage, DetectionStage::Keyword);
    }

    #[test]
    fn first_matching_column_wins_over_keyword_priority() {
        // "number" is later in the keyword list than "phone", but its column comes first.
        let header = vec!["number".to_string(), "phone".to_string()];
        assert_eq!(detect_by_keywords(&header, PHONE_KEYWORDS), Some(0));
    }

    #[test]
    fn empty_header_cells_never_match() {
        let header = vec![String::new(), "whatsapp".to_string()];
        assert_eq!(detect_by_keywords(&header, PHONE_KEYWORDS), Some(1));
    }

    #[test]
    fn keyword_stage_beats_content_stage() {
        let (header, rows) = split(vec![
            vec!["Código", "Telefone", "Nome"],
            vec!["11999998888", "", "Ana"],
            vec!["21988887777", "", "Bia"],
            vec!["31977776666", "", "Caio"],
        ]);
        let number = detect_number_column(&header, &rows).unwrap();
        assert_eq!(number.index, 1);
        assert_eq!(number.stage, DetectionStage::Keyword);
    }

    #[test]
    fn content_stage_finds_columns_without_keywords() {
        let (header, rows) = split(vec![
            vec!["Coluna 1", "Coluna 2"],
            vec!["Foo", "5511988887777"],
            vec!["Bar", "5511977776666"],
        ]);
        let columns = detect_columns(&header, &rows).unwrap();
        assert_eq!(columns.number.index, 1);
        assert_eq!(columns.number.stage, DetectionStage::Content);
        assert_eq!(columns.name.index, 0);
        assert_eq!(columns.name.stage, DetectionStage::Content);
    }

    #[test]
    fn content_stage_requires_two_hits() {
        let (header, rows) = split(vec![vec!["Coluna 1", "Coluna 2"], vec!["Foo", "Bar"]]);
        assert_eq!(detect_number_column(&header, &rows), None);
        let err = detect_columns(&header, &rows).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::ColumnsNotIdentified { number: None, .. }
        ));
    }

    #[test]
    fn content_ties_go_to_lowest_index() {
        let rows: Vec<Row> = Grid::from_strings(vec![
            vec!["", "11999998888", "11999997777"],
            vec!["", "11999998888", "11999997777"],
        ])
        .rows;
        assert_eq!(detect_by_content(&rows, looks_like_phone), Some(1));
    }

    #[test]
    fn content_prefers_higher_counts() {
        let rows: Vec<Row> = Grid::from_strings(vec![
            vec!["11999998888", "11999997777"],
            vec!["x", "11999997777"],
            vec!["11999998888", "11999997777"],
        ])
        .rows;
        assert_eq!(detect_by_content(&rows, looks_like_phone), Some(1));
    }

    #[test]
    fn phone_predicate_counts_digits_only() {
        assert!(looks_like_phone(&Cell::from("(11) 9999-8888")));
        assert!(!looks_like_phone(&Cell::from("(11) 999-888")));
        assert!(looks_like_phone(&Cell::Float(5511988887777.0)));
    }

    #[test]
    fn name_predicate_needs_letters_and_length() {
        assert!(looks_like_name(&Cell::from("Jo")));
        assert!(looks_like_name(&Cell::from("Élio")));
        assert!(!looks_like_name(&Cell::from("A")));
        assert!(!looks_like_name(&Cell::from("12345")));
        assert!(!looks_like_name(&Cell::Empty));
    }
}
