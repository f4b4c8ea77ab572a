//! dayblock CLI - daily weather ledger kept in an XLSX workbook
//!
//! Merges one run's per-location forecast records into the workbook as a
//! dated block, replacing that day's block on a rerun.

mod config;
mod source;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use config::{Config, DEFAULT_CONFIG_FILE};
use dayblock_core::{assemble_block, collect_outcomes, default_headers, run_update, CellValue};
use dayblock_xlsx::{read_workbook_file, XlsxStore};
use source::JsonRecordSource;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dayblock")]
#[command(author, version, about = "Daily weather ledger in an XLSX workbook", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(long, value_name = "FILE", global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a run's forecast records into the workbook
    Update {
        /// JSON file with one entry per location
        #[arg(long, value_name = "FILE")]
        records: PathBuf,

        /// Workbook to update (overrides the configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date the block is filed under (defaults to the records' date)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Print the rows stored in a workbook
    Show {
        /// Workbook to read (defaults to the configured output)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Text)]
        format: ShowFormat,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Update {
            records,
            output,
            date,
        } => cmd_update(&cli.config, &records, output, date),
        Commands::Show { file, format } => cmd_show(&cli.config, file, format),
        Commands::Init { force } => cmd_init(&cli.config, force),
    }
}

fn cmd_update(
    config_path: &Path,
    records: &Path,
    output: Option<PathBuf>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let output = output.unwrap_or_else(|| config.output.clone());

    let source = JsonRecordSource::from_file(records)?;
    let outcomes = collect_outcomes(&source, &config.locations, config.request_delay());
    let mut block = assemble_block(outcomes);
    if let Some(date) = date {
        debug!(date = %date, "run date overridden");
        block.run_date = Some(date.format("%Y-%m-%d").to_string());
    }

    let mut store = XlsxStore::new(&output)
        .sheet_name(config.sheet_name.as_str())
        .on_unreadable(config.on_unreadable.into());
    let report = run_update(&mut store, &default_headers(), &block)
        .with_context(|| format!("Failed to update {}", output.display()))?;

    println!("Wrote {} rows to {}", report.rows_written, output.display());
    for error in &report.errors {
        println!("{error}");
    }
    Ok(())
}

fn cmd_show(config_path: &Path, file: Option<PathBuf>, format: ShowFormat) -> Result<()> {
    let path = match file {
        Some(path) => path,
        None => Config::load(config_path)?.output,
    };
    let rows = read_workbook_file(&path)
        .with_context(|| format!("Failed to read workbook {}", path.display()))?;

    match format {
        ShowFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).context("Failed to serialize rows")?;
            println!("{json}");
        }
        ShowFormat::Text => {
            for row in &rows {
                let line: Vec<String> = row.iter().map(CellValue::to_string).collect();
                println!("{}", line.join("\t").trim_end());
            }
        }
    }
    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    Config::default().save(config_path)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
