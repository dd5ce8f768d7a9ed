use std::sync::OnceLock;

use regex::Regex;

use crate::{data::RowRecord, normalize::LEGAL_BIRTHDAY_COLUMN};

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?\d{8,15}$").expect("phone pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

pub fn is_phone_column(name: &str) -> bool {
    name.to_lowercase().contains("phone")
}

pub fn is_email_column(name: &str) -> bool {
    name.to_lowercase().contains("email")
}

/// Optional leading `+`, then 8 to 15 digits once separators (spaces, dots,
/// dashes, parentheses) are stripped.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '(' | ')'))
        .collect();
    phone_pattern().is_match(&compact)
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

/// Cells to highlight as invalid in the mapped export: non-empty phone and
/// email values that fail their shape checks, plus the rows already flagged
/// for an unrecognized `legal_birthday`. Returned as zero-based data row
/// index paired with the column name. Validity never rejects a row.
pub fn find_invalid_cells(
    rows: &[RowRecord],
    invalid_legal_birthday: &[usize],
) -> Vec<(usize, String)> {
    let mut invalid = Vec::new();
    for (row_index, record) in rows.iter().enumerate() {
        for (name, cell) in record.iter() {
            if cell.is_empty() {
                continue;
            }
            let value = cell.as_display();
            let bad = (is_phone_column(name) && !is_valid_phone(&value))
                || (is_email_column(name) && !is_valid_email(&value));
            if bad {
                invalid.push((row_index, name.to_string()));
            }
        }
    }
    for &row_index in invalid_legal_birthday {
        invalid.push((row_index, LEGAL_BIRTHDAY_COLUMN.to_string()));
    }
    invalid
}
