#![allow(dead_code)]

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tempfile::{tempdir, TempDir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Builds an `.xlsx` fixture with one sheet per `(name, rows)` pair,
    /// all cells written as strings, and returns its path.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, &[&[&str]])]) -> PathBuf {
        let mut workbook = Workbook::new();
        for (sheet, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*sheet).expect("sheet name");
            for (row, cells) in rows.iter().enumerate() {
                for (col, value) in cells.iter().enumerate() {
                    worksheet
                        .write_string(row as u32, col as u16, *value)
                        .expect("write cell");
                }
            }
        }
        let path = self.temp_dir.path().join(name);
        workbook.save(&path).expect("save fixture workbook");
        path
    }
}

/// Sheet names of a produced workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).expect("open produced workbook");
    workbook.sheet_names().to_owned()
}

/// Full contents of one sheet as display strings, trailing empty cells
/// included up to the sheet's width.
pub fn read_sheet(path: &Path, sheet: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("open produced workbook");
    let range = workbook.worksheet_range(sheet).expect("read sheet");
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}
