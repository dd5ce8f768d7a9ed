use std::fmt;

use chrono::NaiveDate;

/// A single spreadsheet cell value. String content is stored trimmed; the
/// distinction between `Text("")` and `Empty` is collapsed at construction
/// time so the two never coexist.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    /// Builds a text cell, trimming the input and demoting whitespace-only
    /// content to [`Cell::Empty`].
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// String form used for lookups, grouping keys, and output encoding.
    /// Integral floats render without the trailing `.0` so identifiers read
    /// back from Excel number cells keep their original shape.
    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A rectangular-by-convention grid of cells as decoded from one sheet.
/// Rows may be shorter than the widest row.
pub type RawGrid = Vec<Vec<Cell>>;

/// One normalized data row: an insertion-ordered map from column name to
/// cell value. Column names are unique; setting an existing name overwrites
/// in place, so duplicate headers resolve last-wins without reordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    entries: Vec<(String, Cell)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    pub fn set(&mut self, column: &str, cell: Cell) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = cell,
            None => self.entries.push((column.to_string(), cell)),
        }
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.entries.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// String form of a column's value; empty string when the column is
    /// absent or holds an empty cell.
    pub fn display_value(&self, column: &str) -> String {
        self.get(column).map(Cell::as_display).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn text_cells_are_trimmed_and_demoted_when_blank() {
        assert_eq!(Cell::text("  abc "), Cell::Text("abc".to_string()));
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::text(""), Cell::Empty);
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Cell::Number(79123456.0).as_display(), "79123456");
        assert_eq!(Cell::Number(1.5).as_display(), "1.5");
        assert_eq!(Cell::Empty.as_display(), "");
    }

    #[test]
    fn dates_display_in_iso_form() {
        let d = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        assert_eq!(Cell::Date(d).as_display(), "2020-12-31");
    }

    #[test]
    fn row_record_overwrites_in_place_preserving_order() {
        let mut record = RowRecord::new();
        record.set("a", Cell::text("1"));
        record.set("b", Cell::text("2"));
        record.set("a", Cell::text("3"));
        assert_eq!(record.len(), 2);
        assert_eq!(record.display_value("a"), "3");
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn display_value_defaults_to_empty_string() {
        let record = RowRecord::new();
        assert_eq!(record.display_value("missing"), "");
    }
}
