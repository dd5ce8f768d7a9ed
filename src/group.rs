use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use log::info;

use crate::{
    cli::GroupArgs,
    data::RowRecord,
    error::PipelineError,
    header, normalize, output, workbook,
};

/// What to do with rows whose grouping key is empty. The grouping-only
/// export keeps them (they form their own partition); the mapping export
/// drops them before partitioning. The two paths intentionally differ and
/// are never unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKeyPolicy {
    Include,
    Exclude,
}

/// Rows sharing one value of the designated key column.
#[derive(Debug)]
pub struct Group {
    pub key: String,
    pub rows: Vec<RowRecord>,
}

/// Partitions rows by the string value of `key_column`, drops partitions
/// below `threshold`, and orders survivors by member count descending.
/// Ties keep the first-seen order of their keys (stable sort over the
/// insertion-ordered partition list).
pub fn group_rows(
    rows: Vec<RowRecord>,
    key_column: &str,
    threshold: usize,
    policy: EmptyKeyPolicy,
) -> Result<Vec<Group>, PipelineError> {
    let mut partitions: Vec<Group> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for record in rows {
        let key = record.display_value(key_column);
        if key.is_empty() && policy == EmptyKeyPolicy::Exclude {
            continue;
        }
        match by_key.get(&key) {
            Some(&index) => partitions[index].rows.push(record),
            None => {
                by_key.insert(key.clone(), partitions.len());
                partitions.push(Group {
                    key,
                    rows: vec![record],
                });
            }
        }
    }

    partitions.retain(|group| group.rows.len() >= threshold);
    partitions.sort_by(|a, b| b.rows.len().cmp(&a.rows.len()));

    if partitions.is_empty() {
        return Err(PipelineError::NoGroupsAboveThreshold { threshold });
    }
    Ok(partitions)
}

/// Entry point of the `group` subcommand: locate the marker header in the
/// first sheet, normalize, group by the marker column, and write one sheet
/// per surviving group.
pub fn execute(args: &GroupArgs) -> Result<()> {
    let mut source = workbook::open(&args.input)?;
    let (sheet_name, grid) = match &args.sheet {
        Some(name) => (name.clone(), workbook::sheet_grid(&mut source, name)?),
        None => {
            let names = workbook::sheet_names(&source);
            let first = names.first().cloned().ok_or(PipelineError::NoDataRows {
                scope: "any sheet".to_string(),
            })?;
            let grid = workbook::sheet_grid(&mut source, &first)?;
            (first, grid)
        }
    };
    info!(
        "Grouping '{}' sheet '{sheet_name}' by marker '{}'",
        args.input.display(),
        args.marker
    );

    let header = header::locate_header(&grid, &args.marker)?;
    let sheet = normalize::normalize_rows(&grid, &header, &sheet_name)?;

    let key_column = args
        .key_column
        .clone()
        .unwrap_or_else(|| header.marker_column.clone());
    let policy = if args.exclude_empty_keys {
        EmptyKeyPolicy::Exclude
    } else {
        EmptyKeyPolicy::Include
    };

    let groups = group_rows(sheet.rows, &key_column, args.threshold, policy)?;
    info!(
        "{} group(s) with {} or more rows sharing '{key_column}'",
        groups.len(),
        args.threshold
    );

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_name(&key_column));
    output::write_group_workbook(&output_path, &groups, &args.stats_columns)?;
    info!("Output written to {:?}", output_path);
    Ok(())
}

fn default_output_name(key_column: &str) -> PathBuf {
    let slug: String = key_column
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    PathBuf::from(format!("filtered_{slug}.xlsx"))
}
