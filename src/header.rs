use crate::{data::RawGrid, error::PipelineError};

/// Outcome of scanning a grid for the marker column: the raw header row
/// (empty names preserved so positions stay stable), the row index where the
/// header sits, and the full name of the column that matched the marker.
#[derive(Debug, Clone)]
pub struct LocatedHeader {
    pub columns: Vec<String>,
    pub row_index: usize,
    pub marker_column: String,
}

impl LocatedHeader {
    /// Treats the first grid row as the header, for inputs without leading
    /// non-tabular rows. The marker column falls back to the first non-empty
    /// header name.
    pub fn first_row(grid: &RawGrid) -> Result<Self, PipelineError> {
        let columns: Vec<String> = grid
            .first()
            .map(|row| row.iter().map(|cell| cell.as_display()).collect())
            .unwrap_or_default();
        let marker_column = columns
            .iter()
            .find(|name| !name.is_empty())
            .cloned()
            .ok_or_else(|| PipelineError::NoDataRows {
                scope: "the selected sheet".to_string(),
            })?;
        Ok(LocatedHeader {
            columns,
            row_index: 0,
            marker_column,
        })
    }
}

/// Scans rows top-to-bottom for the first one where any cell contains the
/// marker substring, case-insensitively. The whole run aborts when no row
/// qualifies; there is no retry.
pub fn locate_header(grid: &RawGrid, marker: &str) -> Result<LocatedHeader, PipelineError> {
    let needle = marker.to_lowercase();
    for (row_index, row) in grid.iter().enumerate() {
        let matched = row
            .iter()
            .find(|cell| cell.as_display().to_lowercase().contains(&needle));
        if let Some(cell) = matched {
            return Ok(LocatedHeader {
                columns: row.iter().map(|c| c.as_display()).collect(),
                row_index,
                marker_column: cell.as_display(),
            });
        }
    }
    Err(PipelineError::HeaderNotFound {
        marker: marker.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|row| row.iter().map(|cell| Cell::text(cell)).collect())
            .collect()
    }

    #[test]
    fn finds_first_row_containing_marker() {
        let grid = grid(&[
            &["Report", ""],
            &["Generated", "2024"],
            &["Name", "ID card/Passport pick", "Phone"],
            &["A", "123", "555"],
        ]);
        let header = locate_header(&grid, "id card/passport pick").unwrap();
        assert_eq!(header.row_index, 2);
        assert_eq!(header.marker_column, "ID card/Passport pick");
        assert_eq!(header.columns[0], "Name");
    }

    #[test]
    fn marker_match_is_case_insensitive_substring() {
        let grid = grid(&[&["my ID CARD PICK column"]]);
        let header = locate_header(&grid, "id card pick").unwrap();
        assert_eq!(header.row_index, 0);
        assert_eq!(header.marker_column, "my ID CARD PICK column");
    }

    #[test]
    fn missing_marker_aborts_with_header_not_found() {
        let grid = grid(&[&["Name", "Phone"], &["A", "555"]]);
        let err = locate_header(&grid, "id card pick").unwrap_err();
        assert!(matches!(err, PipelineError::HeaderNotFound { .. }));
    }

    #[test]
    fn first_row_header_keeps_positions() {
        let grid = grid(&[&["a", "", "c"], &["1", "2", "3"]]);
        let header = LocatedHeader::first_row(&grid).unwrap();
        assert_eq!(header.columns, vec!["a", "", "c"]);
        assert_eq!(header.marker_column, "a");
    }
}
