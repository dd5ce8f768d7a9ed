pub mod cli;
pub mod data;
pub mod error;
pub mod group;
pub mod header;
pub mod mapping;
pub mod normalize;
pub mod output;
pub mod split;
pub mod stats;
pub mod table;
pub mod validate;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("xlsx_wrangler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Group(args) => group::execute(&args),
        Commands::Map(args) => mapping::execute(&args),
        Commands::Split(args) => split::execute(&args),
        Commands::Sheets(args) => handle_sheets(&args),
    }
}

fn handle_sheets(args: &cli::SheetsArgs) -> Result<()> {
    let mut source = workbook::open(&args.input)?;
    let summaries = workbook::summarize(&mut source)?;
    info!(
        "'{}' holds {} sheet(s)",
        args.input.display(),
        summaries.len()
    );
    let headers = vec![
        "Sheet".to_string(),
        "Rows".to_string(),
        "Columns".to_string(),
    ];
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.name.clone(),
                summary.rows.to_string(),
                summary.columns.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}
