#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the Boston crime dashboard.
//!
//! Starts the dashboard server, downloads the unified table to CSV, and
//! prints or exports filtered views of it without a browser.
//!
//! Uses `indicatif-log-bridge` (via [`boston_crime_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod data;
mod report;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use boston_crime_analytics::{aggregate, filter, key_metrics, top_n};
use boston_crime_analytics_models::{Dimension, FilterSelection, GroupingSpec};
use boston_crime_server::ServerConfig;
use boston_crime_server::export::{DEFAULT_EXPORT_ROW_CAP, export_file_name, write_csv};
use boston_crime_source::HistoricalRange;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boston_crime_cli", about = "Boston crime dashboard toolchain")]
struct Cli {
    /// Read the source definition from a TOML file instead of using the
    /// built-in Boston one
    #[arg(long, global = true)]
    source_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

/// Filter widgets as command-line flags.
#[derive(Args)]
struct SelectionArgs {
    /// Comma-separated years (e.g., "2021,2022")
    #[arg(long)]
    years: Option<String>,
    /// Comma-separated offense descriptions
    #[arg(long)]
    offenses: Option<String>,
    /// Comma-separated district codes (e.g., "A1,B2")
    #[arg(long)]
    districts: Option<String>,
}

impl SelectionArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::from_lists(
            self.years.as_deref(),
            self.offenses.as_deref(),
            self.districts.as_deref(),
        )
    }
}

/// Where the unified table comes from.
#[derive(Args)]
struct InputArgs {
    /// Read a unified CSV written by `fetch` instead of downloading
    #[arg(long)]
    input: Option<PathBuf>,
    /// Skip the live API when downloading
    #[arg(long)]
    no_live: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server (settings from `BIND_ADDR`, `PORT`, ...)
    Serve,
    /// Download every source and write the unified table as CSV.
    /// Fails if any historical file cannot be downloaded.
    Fetch {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,
        /// First snapshot year to download
        #[arg(long)]
        from_year: Option<i32>,
        /// Last snapshot year to download
        #[arg(long)]
        to_year: Option<i32>,
        /// Skip the live API
        #[arg(long)]
        no_live: bool,
    },
    /// Print key metrics and the most frequent offenses for a selection
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        input: InputArgs,
        /// Number of offenses to list
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Write the filtered table as CSV
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        input: InputArgs,
        /// Output file (defaults to a name describing the selection)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Maximum number of rows to write
        #[arg(long, default_value_t = DEFAULT_EXPORT_ROW_CAP)]
        cap: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = boston_crime_cli_utils::init_logger();
    let cli = Cli::parse();

    let source_file = cli.source_file.as_deref();

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new()
                    .block_on(boston_crime_server::run_server(ServerConfig::from_env()))
            })
            .await??;
        }
        Commands::Fetch {
            output,
            from_year,
            to_year,
            no_live,
        } => {
            let range = HistoricalRange::new(
                from_year.unwrap_or(i32::MIN),
                to_year.unwrap_or(i32::MAX),
            );
            let loaded = data::fetch_strict(source_file, range, !no_live, &multi).await?;
            let export = write_csv(
                &loaded.table,
                usize::MAX,
                BufWriter::new(File::create(&output)?),
            )?;
            log::info!(
                "Wrote {} records to {} ({} duplicates removed, {} undated rows dropped)",
                export.rows_written,
                output.display(),
                loaded.stats.duplicates_removed,
                loaded.stats.dropped_unparsable_date
            );
        }
        Commands::Summary {
            selection,
            input,
            top,
        } => {
            let selection = selection.selection();
            let table = data::unified_table(
                source_file,
                input.input.as_deref(),
                !input.no_live,
                &multi,
            )
            .await?;
            let filtered = filter(&table, &selection);
            let metrics = key_metrics(&filtered, chrono::Local::now().date_naive());
            let offenses = top_n(
                &aggregate(&filtered, &GroupingSpec::by(Dimension::Offense)),
                top,
            );
            for line in report::summary_lines(&selection, &metrics, &offenses) {
                println!("{line}");
            }
        }
        Commands::Export {
            selection,
            input,
            output,
            cap,
        } => {
            let selection = selection.selection();
            let table = data::unified_table(
                source_file,
                input.input.as_deref(),
                !input.no_live,
                &multi,
            )
            .await?;
            let filtered = filter(&table, &selection);
            let output = output.unwrap_or_else(|| PathBuf::from(export_file_name(&selection)));

            let export = write_csv(&filtered, cap, BufWriter::new(File::create(&output)?))?;
            if let Some(truncation) = export.truncation {
                println!("Warning: {truncation}");
            }
            println!("Wrote {} rows to {}", export.rows_written, output.display());
        }
    }

    Ok(())
}
