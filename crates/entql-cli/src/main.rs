//! entql command line
//!
//! Translates JSON-encoded commands offline, optionally against a YAML
//! metadata catalog, and prints the resulting request or the column
//! metadata its result set would carry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entql_exec::{created_columns, query_columns};
use entql_ir::metadata::{MetadataProvider, StaticMetadataProvider};
use entql_ir::translate::RequestTranslator;
use entql_ir::{Command, Request};
use std::path::{Path, PathBuf};
use tracing::info;

mod config;
mod logging;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "entql", version, about = "Translate SQL-shaped commands into entity service requests")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, short, env = "ENTQL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the request a command translates to
    Translate {
        /// Command file (JSON)
        command: PathBuf,

        /// Print only the request fingerprint
        #[arg(long)]
        fingerprint: bool,
    },
    /// Print the column metadata of the command's result set
    Columns {
        /// Command file (JSON)
        command: PathBuf,
    },
    /// List the entities in the metadata catalog
    Entities,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env()?,
    };
    config.apply_logging_env();
    logging::init()?;

    match cli.command {
        Commands::Translate {
            command,
            fingerprint,
        } => translate(&config, &command, fingerprint),
        Commands::Columns { command } => columns(&config, &command),
        Commands::Entities => entities(&config),
    }
}

fn read_command(path: &Path) -> Result<Command> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read command from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse command in {}", path.display()))
}

fn translate(config: &Config, path: &Path, fingerprint: bool) -> Result<()> {
    let command = read_command(path)?;

    // Without a catalog, insert values are sent as translated.
    let catalog = match config.metadata.path {
        Some(_) => Some(config.load_catalog()?),
        None => None,
    };
    let translator = match &catalog {
        Some(catalog) => RequestTranslator::new(catalog),
        None => RequestTranslator::without_metadata(),
    }
    .with_options(config.translator.options());

    let request = translator.translate(&command)?;
    info!(fingerprint = %request.fingerprint(), "Translated command");

    if fingerprint {
        println!("{}", request.fingerprint());
    } else {
        println!("{}", serde_json::to_string_pretty(&request)?);
    }
    Ok(())
}

fn columns(config: &Config, path: &Path) -> Result<()> {
    let command = read_command(path)?;
    let catalog = config.load_catalog()?;
    let translator = RequestTranslator::new(&catalog).with_options(config.translator.options());

    let columns = match translator.translate(&command)? {
        Request::RetrieveMany { query } => query_columns(&query, &catalog)?,
        Request::Create { target } => {
            let id_attribute = format!("{}id", target.logical_name);
            created_columns(&target.logical_name, &id_attribute, &catalog)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&columns)?);
    Ok(())
}

fn entities(config: &Config) -> Result<()> {
    let catalog: StaticMetadataProvider = config.load_catalog()?;

    for name in catalog.entity_names() {
        let entity = catalog.get_entity_metadata(name)?;
        println!(
            "{}\t{} attributes\tid: {}",
            entity.logical_name,
            entity.attributes.len(),
            entity.primary_id_attribute()
        );
    }
    Ok(())
}
