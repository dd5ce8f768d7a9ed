use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::{
    cli::MapArgs,
    data::{Cell, RowRecord},
    group::{self, EmptyKeyPolicy},
    header::{self, LocatedHeader},
    normalize::{self, NormalizedSheet},
    output, validate, workbook,
};

/// Per-column substitution tables built from the mapping workbook. Each
/// sheet name is a target column; rows are `(value, key)` pairs read from
/// the columns headed `value` and `key`. Read-only after construction.
#[derive(Debug, Default)]
pub struct MappingTable {
    tables: HashMap<String, HashMap<String, String>>,
    order: Vec<String>,
}

impl MappingTable {
    pub fn from_workbook(workbook: &mut workbook::Workbook) -> Result<Self> {
        let mut mapping = MappingTable::default();
        let names = crate::workbook::sheet_names(workbook);
        for name in names {
            let grid = workbook::sheet_grid(workbook, &name)
                .with_context(|| format!("Reading mapping sheet '{name}'"))?;
            let mut entries = HashMap::new();
            if let Some((header, data)) = grid.split_first() {
                let value_pos = find_column(header, "value");
                let key_pos = find_column(header, "key");
                for row in data {
                    if row.iter().all(Cell::is_empty) {
                        continue;
                    }
                    let value = cell_at(row, value_pos);
                    let key = cell_at(row, key_pos);
                    // Last duplicate wins, including explicit empty-string
                    // source values.
                    entries.insert(value, key);
                }
            }
            if entries.is_empty() {
                debug!("Mapping sheet '{name}' has no usable pairs");
            }
            mapping.order.push(name.clone());
            mapping.tables.insert(name, entries);
        }
        Ok(mapping)
    }

    /// True when a mapping sheet exists for this column, even an empty one.
    pub fn has_column(&self, column: &str) -> bool {
        self.tables.contains_key(column)
    }

    /// Exact-match lookup on the trimmed string form of a source value.
    /// `None` covers both "no table for this column" and "no entry for this
    /// value"; `has_column` separates the two. An entry mapping to the empty
    /// string is a hit.
    pub fn resolve(&self, column: &str, value: &str) -> Option<&str> {
        self.tables
            .get(column)?
            .get(value)
            .map(String::as_str)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Mapping sheets whose name matches no source header under the
    /// case-insensitive substring test. These only take effect through an
    /// explicit `--extra-mapping` binding.
    pub fn unmatched_sheets(&self, headers: &[String]) -> Vec<&str> {
        self.order
            .iter()
            .filter(|sheet| {
                let needle = sheet.to_lowercase();
                !headers
                    .iter()
                    .any(|header| header.to_lowercase().contains(&needle))
            })
            .map(String::as_str)
            .collect()
    }
}

fn find_column(header: &[Cell], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| cell.as_display().trim().eq_ignore_ascii_case(name))
}

fn cell_at(row: &[Cell], position: Option<usize>) -> String {
    position
        .and_then(|pos| row.get(pos))
        .map(Cell::as_display)
        .unwrap_or_default()
}

/// A mapping miss: the column has a substitution table but the value is not
/// registered in it. Coordinates are 1-based Excel style and refer to the
/// produced `Processed Data` sheet, not the source sheet: `row` counts the
/// header as row 1 (data row *i* reports as `i + 2`), and `column` is the
/// position within the normalized record, which drops unnamed header
/// columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedObservation {
    pub row: usize,
    pub column: usize,
    pub column_name: String,
    pub value: String,
}

/// Everything collected during one mapping pass: the observation list in
/// row-major order, per-column deduplicated sorted miss values, and a cell
/// set for highlight lookups.
#[derive(Debug, Default)]
pub struct MapOutcome {
    pub observations: Vec<UnmappedObservation>,
    pub unmapped_values: BTreeMap<String, BTreeSet<String>>,
    unmapped_cells: HashSet<(usize, String)>,
}

impl MapOutcome {
    pub fn is_clean(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether the cell at zero-based data row `row` in `column` missed its
    /// mapping during this pass.
    pub fn cell_is_unmapped(&self, row: usize, column: &str) -> bool {
        self.unmapped_cells
            .contains(&(row, column.to_string()))
    }

    fn record(&mut self, row: usize, column: usize, column_name: &str, value: String) {
        self.unmapped_cells
            .insert((row, column_name.to_string()));
        self.unmapped_values
            .entry(column_name.to_string())
            .or_default()
            .insert(value.clone());
        self.observations.push(UnmappedObservation {
            row: row + 2,
            column: column + 1,
            column_name: column_name.to_string(),
            value,
        });
    }
}

/// Binds a mapping sheet that matches no source column to a proxy source
/// column, written as `sheet=source_column` on the command line.
#[derive(Debug, Clone)]
pub struct ExtraMapping {
    pub sheet: String,
    pub source_column: String,
}

impl ExtraMapping {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(2, '=');
        let sheet = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Extra mapping is missing a sheet name"))?;
        let source_column = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Extra mapping '{sheet}' is missing a source column"))?;
        Ok(ExtraMapping {
            sheet: sheet.to_string(),
            source_column: source_column.to_string(),
        })
    }
}

pub fn parse_extra_mappings(specs: &[String]) -> Result<Vec<ExtraMapping>> {
    specs.iter().map(|spec| ExtraMapping::parse(spec)).collect()
}

/// Applies the mapping table to every cell of every row in place. Hits
/// replace the value (trimmed); misses keep the original and are recorded
/// exactly once per cell per pass. Extra mappings then fill their additional
/// columns from the bound proxy column, defaulting to empty.
pub fn apply_mappings(
    rows: &mut [RowRecord],
    table: &MappingTable,
    extras: &[ExtraMapping],
) -> MapOutcome {
    let mut outcome = MapOutcome::default();

    for (row_index, record) in rows.iter_mut().enumerate() {
        let cells: Vec<(usize, String, String)> = record
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| table.has_column(name))
            .map(|(position, (name, cell))| (position, name.to_string(), cell.as_display()))
            .collect();
        for (position, name, value) in cells {
            match table.resolve(&name, &value) {
                Some(mapped) => record.set(&name, Cell::text(mapped)),
                None => outcome.record(row_index, position, &name, value),
            }
        }
    }

    for extra in extras {
        if !table.has_column(&extra.sheet) {
            continue;
        }
        for record in rows.iter_mut() {
            let proxy = record.display_value(&extra.source_column);
            let mapped = table
                .resolve(&extra.sheet, &proxy)
                .map(Cell::text)
                .unwrap_or(Cell::Empty);
            record.set(&extra.sheet, mapped);
        }
    }

    outcome
}

/// Entry point of the `map` subcommand: source workbook + mapping workbook
/// in, processed workbook (with statistics and highlights) out.
pub fn execute(args: &MapArgs) -> Result<()> {
    let mut source = workbook::open(&args.input)?;
    let (sheet_name, grid) = match &args.sheet {
        Some(name) => (name.clone(), workbook::sheet_grid(&mut source, name)?),
        None => workbook::select_data_sheet(&mut source)?,
    };
    info!(
        "Mapping '{}' using sheet '{sheet_name}' with tables from '{}'",
        args.input.display(),
        args.mapping.display()
    );

    let header = match &args.marker {
        Some(marker) => header::locate_header(&grid, marker)?,
        None => LocatedHeader::first_row(&grid)?,
    };
    let NormalizedSheet {
        mut rows,
        invalid_legal_birthday,
    } = normalize::normalize_rows(&grid, &header, &sheet_name)?;

    let mut mapping_workbook = workbook::open(&args.mapping)?;
    let table = MappingTable::from_workbook(&mut mapping_workbook)?;
    let extras = parse_extra_mappings(&args.extra_mappings)?;

    for sheet in table.unmatched_sheets(&header.columns) {
        if !extras.iter().any(|extra| extra.sheet == sheet) {
            warn!(
                "Mapping sheet '{sheet}' matches no source column; bind it with --extra-mapping '{sheet}=<column>'"
            );
        }
    }

    let outcome = apply_mappings(&mut rows, &table, &extras);
    if outcome.is_clean() {
        info!("All mapped cells resolved");
    } else {
        info!(
            "{} cell(s) across {} column(s) had no mapping entry",
            outcome.observations.len(),
            outcome.unmapped_values.len()
        );
    }

    let invalid_cells = validate::find_invalid_cells(&rows, &invalid_legal_birthday);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("processed_data.xlsx"));

    if let Some(key_column) = &args.group_by {
        // Grouped variant of the mapping export: empty keys never group.
        let groups = group::group_rows(
            rows,
            key_column,
            args.threshold,
            EmptyKeyPolicy::Exclude,
        )?;
        info!("{} group(s) above threshold {}", groups.len(), args.threshold);
        output::write_group_workbook(&output_path, &groups, &args.stats_columns)?;
    } else {
        output::write_mapped_workbook(&output_path, &rows, &outcome, &invalid_cells)?;
    }
    info!("Output written to {:?}", output_path);
    Ok(())
}
