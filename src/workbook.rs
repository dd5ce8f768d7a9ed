use std::{fs, io::BufReader, path::Path};

use anyhow::{Context, Result};
use calamine::{Data, DataType as _, Reader as _, Sheets, open_workbook_auto};
use log::debug;

use crate::{
    data::{Cell, RawGrid},
    error::PipelineError,
};

/// Pre-flight size cap: inputs above 10 MB are rejected before any parse
/// attempt.
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Sheet names preferred when auto-selecting the data sheet of a source
/// workbook, matched case-insensitively as substrings.
const PREFERRED_SHEET_NAMES: &[&str] = &["Data", "Sheet1", "Sheet 1", "Dữ liệu", "Data1"];

pub type Workbook = Sheets<BufReader<fs::File>>;

/// Sheet names in workbook order. Sole call site of the `Reader` trait's
/// accessor, so the trait import stays local to this module.
pub fn sheet_names(workbook: &Workbook) -> Vec<String> {
    workbook.sheet_names().to_owned()
}

/// Validates extension and size, then decodes the workbook. All failures
/// here map to the pre-flight or parse error kinds; nothing downstream
/// retries them.
pub fn open(path: &Path) -> Result<Workbook, PipelineError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if extension != "xlsx" && extension != "xls" {
        return Err(PipelineError::UnsupportedFileType {
            path: path.to_path_buf(),
            extension,
        });
    }
    if let Ok(metadata) = fs::metadata(path)
        && metadata.len() > MAX_INPUT_BYTES
    {
        return Err(PipelineError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: MAX_INPUT_BYTES,
        });
    }
    open_workbook_auto(path).map_err(|source| PipelineError::WorkbookParseFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes one sheet into a cell grid. Trailing fully-empty rows are kept as
/// calamine reports them; ragged rows stay ragged.
pub fn sheet_grid(workbook: &mut Workbook, sheet: &str) -> Result<RawGrid> {
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Reading sheet '{sheet}'"))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect())
}

fn convert_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match value.as_date() {
            Some(date) => Cell::Date(date),
            None => Cell::text(&value.to_string()),
        },
        Data::DurationIso(s) => Cell::text(s),
        Data::Error(e) => Cell::text(&format!("{e:?}")),
    }
}

fn has_data_rows(grid: &RawGrid) -> bool {
    grid.len() >= 2
        && grid
            .iter()
            .skip(1)
            .any(|row| row.iter().any(|cell| !cell.is_empty()))
}

/// Picks the sheet holding the actual data table: first a sheet whose name
/// matches one of the preferred names and has at least one non-empty data
/// row, otherwise the qualifying sheet with the most rows.
pub fn select_data_sheet(workbook: &mut Workbook) -> Result<(String, RawGrid)> {
    let names = sheet_names(workbook);

    for name in &names {
        let lowered = name.to_lowercase();
        if PREFERRED_SHEET_NAMES
            .iter()
            .any(|preferred| lowered.contains(&preferred.to_lowercase()))
        {
            let grid = sheet_grid(workbook, name)?;
            if has_data_rows(&grid) {
                debug!("Selected preferred sheet '{name}'");
                return Ok((name.clone(), grid));
            }
        }
    }

    let mut best: Option<(String, RawGrid)> = None;
    for name in &names {
        let grid = sheet_grid(workbook, name)?;
        if has_data_rows(&grid)
            && best
                .as_ref()
                .is_none_or(|(_, current)| grid.len() > current.len())
        {
            best = Some((name.clone(), grid));
        }
    }
    match best {
        Some((name, grid)) => {
            debug!("Selected densest sheet '{name}' ({} rows)", grid.len());
            Ok((name, grid))
        }
        None => Err(PipelineError::NoDataRows {
            scope: "any sheet".to_string(),
        }
        .into()),
    }
}

#[derive(Debug)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// Dimensions of every sheet, for the `sheets` listing command.
pub fn summarize(workbook: &mut Workbook) -> Result<Vec<SheetSummary>> {
    let names = sheet_names(workbook);
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        let grid = sheet_grid(workbook, &name)?;
        let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
        summaries.push(SheetSummary {
            name,
            rows: grid.len(),
            columns,
        });
    }
    Ok(summaries)
}
