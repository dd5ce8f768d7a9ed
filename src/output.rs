use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use crate::{
    data::{Cell, RowRecord},
    error::PipelineError,
    group::Group,
    mapping::MapOutcome,
    stats,
};

/// Excel caps sheet names at 31 characters.
pub const SHEET_NAME_LIMIT: usize = 31;

/// Header of the per-group statistic blocks and the miss-count column of the
/// statistics sheet ("quantity").
pub const COUNT_HEADER: &str = "Số lượng";

/// Name of the unmapped-cell statistics sheet in the mapped export.
pub const STATISTICS_SHEET: &str = "Thống kê";

const PROCESSED_SHEET: &str = "Processed Data";
const MIN_COLUMN_WIDTH: f64 = 15.0;

// Fill colors: Excel's classic "bad" red for unmapped cells, "neutral"
// yellow for invalid phone/email/legal_birthday values.
const UNMAPPED_FILL: Color = Color::RGB(0xFFC7CE);
const INVALID_FILL: Color = Color::RGB(0xFFEB9C);

/// Replaces the characters Excel forbids in sheet names (`: \ / ? * [ ]`)
/// with underscores and truncates to the 31-character limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => '_',
            other => other,
        })
        .take(SHEET_NAME_LIMIT)
        .collect()
}

/// `"ID {key} ({count} dòng)"`, sanitized.
pub fn group_sheet_name(key: &str, count: usize) -> String {
    sanitize_sheet_name(&format!("ID {key} ({count} dòng)"))
}

fn column_width(name: &str) -> f64 {
    (name.chars().count() as f64).max(MIN_COLUMN_WIDTH)
}

/// Disambiguates a candidate name against the already-used set with `_1`,
/// `_2`… suffixes, keeping the result within the sheet-name limit.
fn unique_name(used: &mut HashSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    for counter in 1.. {
        let suffix = format!("_{counter}");
        let keep = SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count());
        let mut renamed: String = candidate.chars().take(keep).collect();
        renamed.push_str(&suffix);
        if used.insert(renamed.clone()) {
            return renamed;
        }
    }
    unreachable!("suffix space exhausted");
}

/// Export row sequence for one group: the member rows, then (when statistic
/// columns are selected) one blank separator and per column a
/// `{column} | Số lượng` header followed by its histogram, each block
/// closed by a blank row.
fn assemble_group_rows(
    group: &Group,
    columns: &[String],
    stats_columns: &[String],
) -> Vec<Vec<Cell>> {
    let mut out = Vec::with_capacity(group.rows.len() + 1);
    out.push(columns.iter().map(|name| Cell::text(name)).collect());
    for record in &group.rows {
        out.push(
            columns
                .iter()
                .map(|name| record.get(name).cloned().unwrap_or(Cell::Empty))
                .collect(),
        );
    }
    if !stats_columns.is_empty() {
        out.push(Vec::new());
        for column in stats_columns {
            out.push(vec![Cell::text(column), Cell::text(COUNT_HEADER)]);
            for (value, count) in stats::value_counts(&group.rows, column) {
                out.push(vec![Cell::Text(value), Cell::Number(count as f64)]);
            }
            out.push(Vec::new());
        }
    }
    out
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (cell, format) {
        (Cell::Number(n), Some(fmt)) => {
            worksheet.write_number_with_format(row, col, *n, fmt)?;
        }
        (Cell::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (Cell::Empty, None) => {}
        (other, Some(fmt)) => {
            worksheet.write_string_with_format(row, col, other.as_display(), fmt)?;
        }
        (other, None) => {
            worksheet.write_string(row, col, other.as_display())?;
        }
    }
    Ok(())
}

fn encode_failure(path: &Path) -> impl FnOnce(XlsxError) -> PipelineError + '_ {
    move |source| PipelineError::EncodeOrSaveFailure {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

/// Grouping export: one sheet per group, in group order, named
/// `"ID {key} ({n} dòng)"`.
pub fn write_group_workbook(
    path: &Path,
    groups: &[Group],
    stats_columns: &[String],
) -> Result<(), PipelineError> {
    build_group_workbook(groups, stats_columns)
        .and_then(|mut workbook| workbook.save(path))
        .map_err(encode_failure(path))
}

fn build_group_workbook(
    groups: &[Group],
    stats_columns: &[String],
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let mut used_names = HashSet::new();
    for group in groups {
        let columns: Vec<String> = group
            .rows
            .first()
            .map(|record| record.columns().map(str::to_string).collect())
            .unwrap_or_default();
        let name = unique_name(
            &mut used_names,
            group_sheet_name(&group.key, group.rows.len()),
        );
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;
        for (position, column) in columns.iter().enumerate() {
            worksheet.set_column_width(position as u16, column_width(column))?;
        }
        for (row_index, row) in assemble_group_rows(group, &columns, stats_columns)
            .iter()
            .enumerate()
        {
            for (col_index, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_index as u32, col_index as u16, cell, None)?;
            }
        }
    }
    Ok(workbook)
}

/// Mapping export: a `Processed Data` sheet with unmapped and invalid cells
/// highlighted, plus a `Thống kê` sheet when any mapping miss was recorded.
pub fn write_mapped_workbook(
    path: &Path,
    rows: &[RowRecord],
    outcome: &MapOutcome,
    invalid_cells: &[(usize, String)],
) -> Result<(), PipelineError> {
    build_mapped_workbook(rows, outcome, invalid_cells)
        .and_then(|mut workbook| workbook.save(path))
        .map_err(encode_failure(path))
}

fn build_mapped_workbook(
    rows: &[RowRecord],
    outcome: &MapOutcome,
    invalid_cells: &[(usize, String)],
) -> Result<Workbook, XlsxError> {
    let columns: Vec<String> = rows
        .first()
        .map(|record| record.columns().map(str::to_string).collect())
        .unwrap_or_default();
    let invalid: HashSet<(usize, &str)> = invalid_cells
        .iter()
        .map(|(row, column)| (*row, column.as_str()))
        .collect();

    let mut workbook = Workbook::new();
    let unmapped_format = Format::new().set_background_color(UNMAPPED_FILL);
    let invalid_format = Format::new().set_background_color(INVALID_FILL);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(PROCESSED_SHEET)?;
    for (position, column) in columns.iter().enumerate() {
        worksheet.set_column_width(position as u16, column_width(column))?;
        worksheet.write_string(0, position as u16, column)?;
    }
    for (row_index, record) in rows.iter().enumerate() {
        for (col_index, column) in columns.iter().enumerate() {
            let cell = record.get(column).cloned().unwrap_or(Cell::Empty);
            let format = if outcome.cell_is_unmapped(row_index, column) {
                Some(&unmapped_format)
            } else if invalid.contains(&(row_index, column.as_str())) {
                Some(&invalid_format)
            } else {
                None
            };
            write_cell(
                worksheet,
                (row_index + 1) as u32,
                col_index as u16,
                &cell,
                format,
            )?;
        }
    }

    if !outcome.is_clean() {
        append_statistics_sheet(&mut workbook, outcome)?;
    }
    Ok(workbook)
}

fn append_statistics_sheet(workbook: &mut Workbook, outcome: &MapOutcome) -> Result<(), XlsxError> {
    let headers = ["Cột", "Giá trị", "Số ô", "Vị trí"];
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(STATISTICS_SHEET)?;
    for (position, header) in headers.iter().enumerate() {
        worksheet.set_column_width(position as u16, column_width(header))?;
        worksheet.write_string(0, position as u16, *header)?;
    }
    let mut row_index: u32 = 1;
    for (column, values) in &outcome.unmapped_values {
        for value in values {
            let hits: Vec<&crate::mapping::UnmappedObservation> = outcome
                .observations
                .iter()
                .filter(|obs| &obs.column_name == column && &obs.value == value)
                .collect();
            let positions = hits
                .iter()
                .map(|obs| format!("R{}C{}", obs.row, obs.column))
                .collect::<Vec<_>>()
                .join(", ");
            worksheet.write_string(row_index, 0, column)?;
            worksheet.write_string(row_index, 1, value)?;
            worksheet.write_number(row_index, 2, hits.len() as f64)?;
            worksheet.write_string(row_index, 3, positions)?;
            row_index += 1;
        }
    }
    Ok(())
}
