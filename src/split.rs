use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;
use rust_xlsxwriter::Workbook;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    cli::SplitArgs,
    data::RawGrid,
    error::PipelineError,
    output::{self, SHEET_NAME_LIMIT},
    workbook,
};

const DEFAULT_OUTPUT: &str = "split_sheets.zip";

/// Splits a multi-sheet workbook into a ZIP archive holding one single-sheet
/// `.xlsx` file per selected sheet.
pub fn execute(args: &SplitArgs) -> Result<()> {
    let mut source = workbook::open(&args.input)?;
    let names = workbook::sheet_names(&source);

    let selected: Vec<String> = if args.sheets.is_empty() {
        names.clone()
    } else {
        for requested in &args.sheets {
            if !names.iter().any(|name| name == requested) {
                bail!(
                    "Sheet '{requested}' not found in {}; available: {}",
                    args.input.display(),
                    names.join(", ")
                );
            }
        }
        args.sheets.clone()
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let file = fs::File::create(&output_path)
        .with_context(|| format!("Creating archive {}", output_path.display()))?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used_stems = HashSet::new();
    for name in &selected {
        let grid = workbook::sheet_grid(&mut source, name)?;
        let stem = unique_stem(&mut used_stems, sanitize_file_stem(name));
        let buffer = encode_single_sheet(name, &grid).map_err(|err| {
            PipelineError::EncodeOrSaveFailure {
                path: output_path.clone(),
                source: err,
            }
        })?;
        archive
            .start_file(format!("{stem}.xlsx"), options)
            .with_context(|| format!("Adding {stem}.xlsx to the archive"))?;
        archive
            .write_all(&buffer)
            .with_context(|| format!("Writing {stem}.xlsx into the archive"))?;
        info!("Packed sheet '{name}' as {stem}.xlsx ({} rows)", grid.len());
    }
    archive
        .finish()
        .with_context(|| format!("Finalizing {}", output_path.display()))?;

    info!(
        "Split {} sheet(s) into {}",
        selected.len(),
        output_path.display()
    );
    Ok(())
}

/// File stems additionally replace `-`, so the archived names stay friendly
/// on every filesystem.
fn sanitize_file_stem(name: &str) -> String {
    output::sanitize_sheet_name(name).replace('-', "_")
}

fn unique_stem(used: &mut HashSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    for counter in 1.. {
        let renamed = format!("{candidate}_{counter}");
        if used.insert(renamed.clone()) {
            return renamed;
        }
    }
    unreachable!("suffix space exhausted");
}

fn encode_single_sheet(name: &str, grid: &RawGrid) -> Result<Vec<u8>, anyhow::Error> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let sheet_name: String = name.chars().take(SHEET_NAME_LIMIT).collect();
    worksheet.set_name(output::sanitize_sheet_name(&sheet_name))?;
    if let Some(header) = grid.first() {
        for (position, cell) in header.iter().enumerate() {
            let width = (cell.as_display().chars().count() as f64).max(15.0);
            worksheet.set_column_width(position as u16, width)?;
        }
    }
    for (row_index, row) in grid.iter().enumerate() {
        for (col_index, cell) in row.iter().enumerate() {
            match cell {
                crate::data::Cell::Number(n) => {
                    worksheet.write_number(row_index as u32, col_index as u16, *n)?;
                }
                crate::data::Cell::Empty => {}
                other => {
                    worksheet.write_string(row_index as u32, col_index as u16, other.as_display())?;
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_replace_hyphens_and_forbidden_characters() {
        assert_eq!(sanitize_file_stem("Q1-2024/Hà Nội"), "Q1_2024_Hà Nội");
        assert_eq!(sanitize_file_stem("plain"), "plain");
    }

    #[test]
    fn duplicate_stems_get_counter_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_stem(&mut used, "data".into()), "data");
        assert_eq!(unique_stem(&mut used, "data".into()), "data_1");
        assert_eq!(unique_stem(&mut used, "data".into()), "data_2");
    }

    #[test]
    fn encoded_sheet_round_trips_through_a_buffer() {
        use crate::data::Cell;
        let grid: RawGrid = vec![
            vec![Cell::text("id"), Cell::text("amount")],
            vec![Cell::text("A"), Cell::Number(3.0)],
        ];
        let buffer = encode_single_sheet("Data", &grid).unwrap();
        // XLSX files are ZIP containers; check the magic bytes.
        assert_eq!(&buffer[..2], b"PK");
    }
}
