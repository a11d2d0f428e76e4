//! Command-line interface for the extract client.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::ApiConfig;
use crate::error::Result;
use crate::extract::{ExtractClient, ExtractId, PollOutcome};
use crate::geography::GEOGRAPHIC_EXTENT_OPTIONS;
use crate::metadata::{MetadataClient, MetadataQuery};
use crate::request_file::RequestFile;

/// NHGIS Extract - Validate and submit IPUMS NHGIS extract requests.
///
/// Reads the API key from IPUMS_API_KEY.
#[derive(Parser)]
#[command(name = "nhgis-extract")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print dataset metadata (all datasets, one dataset, or one data table).
    Datasets {
        /// Dataset name (e.g., 1990_STF1)
        name: Option<String>,

        /// Data table within the dataset
        #[arg(short, long, requires = "name")]
        table: Option<String>,
    },

    /// Print time-series table metadata.
    TimeSeries {
        /// Time-series table name (e.g., A00)
        name: Option<String>,
    },

    /// List available shapefiles.
    Shapefiles,

    /// List recognized geographic extent codes.
    Extents,

    /// Validate a request file and submit it.
    Submit {
        /// YAML or JSON request file
        file: PathBuf,

        /// Print the composed document instead of submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the status of an extract.
    Status {
        /// Extract number
        number: Option<String>,

        /// Print the full status document
        #[arg(long)]
        full: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extents => {
            extents_command();
            Ok(())
        }
        Commands::Datasets { name, table } => {
            let query = match (name, table) {
                (None, _) => MetadataQuery::Datasets,
                (Some(dataset), None) => MetadataQuery::Dataset(dataset),
                (Some(dataset), Some(table)) => MetadataQuery::DataTable { dataset, table },
            };
            metadata_command(&query)
        }
        Commands::TimeSeries { name } => {
            let query = name.map_or(MetadataQuery::TimeSeriesTables, MetadataQuery::TimeSeriesTable);
            metadata_command(&query)
        }
        Commands::Shapefiles => shapefiles_command(),
        Commands::Submit { file, dry_run } => submit_command(&file, dry_run),
        Commands::Status { number, full } => status_command(number.as_deref(), full),
    }
}

fn extents_command() {
    for (code, name) in GEOGRAPHIC_EXTENT_OPTIONS {
        println!("{}  {}", style(code).cyan(), name);
    }
}

fn metadata_command(query: &MetadataQuery) -> Result<()> {
    let metadata = MetadataClient::from_config(&ApiConfig::from_env()?)?;
    let document = metadata.fetch(query)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn shapefiles_command() -> Result<()> {
    let metadata = MetadataClient::from_config(&ApiConfig::from_env()?)?;
    for shapefile in metadata.shapefiles()? {
        println!("{}", shapefile.name);
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn submit_command(file: &Path, dry_run: bool) -> Result<()> {
    // Parse before any network access so syntax errors surface first
    let request_file = RequestFile::load(file)?;
    let mut client = ExtractClient::from_config(&ApiConfig::from_env()?)?;

    let pb = spinner();
    pb.set_message("Validating selections against metadata...");

    let document = match request_file
        .into_request(client.metadata())
        .and_then(|request| request.compose(client.metadata()))
    {
        Ok(document) => document,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    if dry_run {
        pb.finish_and_clear();
        print_warnings(document.warnings());
        println!("{}", serde_json::to_string_pretty(&document.to_json()?)?);
        return Ok(());
    }

    pb.set_message("Submitting extract...");
    let response = client.submit(&document);
    pb.finish_and_clear();
    let response = response?;

    print_warnings(document.warnings());
    match client.last_extract() {
        Some(number) => println!(
            "{} extract {}",
            style("Submitted").green().bold(),
            style(number).cyan()
        ),
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    Ok(())
}

fn status_command(number: Option<&str>, full: bool) -> Result<()> {
    let id = number.map(str::parse::<ExtractId>).transpose()?;
    let client = ExtractClient::from_config(&ApiConfig::from_env()?)?;

    match client.poll(id.as_ref(), !full)? {
        PollOutcome::Status(status) => println!("{status}"),
        PollOutcome::Document(document) => {
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
    }
}
