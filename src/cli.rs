use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default header marker: the column whose header contains this text
/// (case-insensitive) anchors the header row and doubles as the grouping key.
pub const DEFAULT_MARKER: &str = "ID card/Passport pick";

#[derive(Debug, Parser)]
#[command(author, version, about = "Group, map, and split Excel workbooks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Group rows by a key column and export one sheet per group
    Group(GroupArgs),
    /// Substitute cell values from a mapping workbook and flag the misses
    Map(MapArgs),
    /// Split a multi-sheet workbook into a ZIP of single-sheet files
    Split(SplitArgs),
    /// List the sheets of a workbook with row and column counts
    Sheets(SheetsArgs),
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output workbook path (defaults to filtered_<key>.xlsx)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Header text that anchors the header row, matched case-insensitively
    #[arg(long, default_value = DEFAULT_MARKER)]
    pub marker: String,
    /// Column to group by (defaults to the marker column)
    #[arg(short = 'k', long = "key-column")]
    pub key_column: Option<String>,
    /// Minimum rows a group needs to be exported
    #[arg(long, default_value_t = 2, value_parser = parse_threshold)]
    pub threshold: usize,
    /// Columns to append value histograms for, comma-separated and repeatable
    #[arg(long = "stats", action = clap::ArgAction::Append, value_delimiter = ',')]
    pub stats_columns: Vec<String>,
    /// Drop rows whose key cell is empty instead of grouping them together
    #[arg(long = "exclude-empty-keys")]
    pub exclude_empty_keys: bool,
    /// Sheet to read (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Mapping workbook; each sheet holds value/key substitution pairs
    #[arg(short = 'm', long = "mapping")]
    pub mapping: PathBuf,
    /// Output workbook path (defaults to processed_data.xlsx)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Anchor the header row by this marker instead of using the first row
    #[arg(long)]
    pub marker: Option<String>,
    /// Bind a mapping sheet to a source column, as `sheet=column`
    #[arg(long = "extra-mapping", action = clap::ArgAction::Append)]
    pub extra_mappings: Vec<String>,
    /// Sheet to read (defaults to the preferred or densest sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// After mapping, group by this column and export one sheet per group
    #[arg(short = 'g', long = "group-by")]
    pub group_by: Option<String>,
    /// Minimum rows a group needs to be exported (with --group-by)
    #[arg(long, default_value_t = 2, value_parser = parse_threshold)]
    pub threshold: usize,
    /// Columns to append value histograms for (with --group-by)
    #[arg(long = "stats", action = clap::ArgAction::Append, value_delimiter = ',')]
    pub stats_columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output ZIP archive (defaults to split_sheets.zip)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Sheets to include, repeatable (defaults to every sheet)
    #[arg(short = 's', long = "sheet", action = clap::ArgAction::Append)]
    pub sheets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SheetsArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

fn parse_threshold(value: &str) -> Result<usize, String> {
    let parsed: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if parsed < 2 {
        return Err("threshold must be at least 2".to_string());
    }
    Ok(parsed)
}
