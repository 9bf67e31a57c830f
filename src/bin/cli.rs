//! Resource publisher CLI
//!
//! Publishes files or whole folders from the configured source storage into
//! the configured target storage.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use publisher::{
    config::{build_publisher, build_storage, load_config},
    error::{AppError, Result},
    models::{File, Folder, Identifier},
    publisher::{FailurePolicy, Publisher},
    utils::normalize_base_dir,
};

/// Publish storage files to a public target
#[derive(Parser, Debug)]
#[command(name = "publisher", version, about = "Resource publisher")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "publisher.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a single file and print its URL
    File {
        /// Identifier of the file in the source storage
        identifier: String,
    },

    /// Publish every file below a folder
    Folder {
        /// Identifier of the folder in the source storage
        #[arg(default_value = "/")]
        identifier: String,

        /// Keep going after a file fails and report all failures
        #[arg(long)]
        continue_on_error: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the resolved publishing settings
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Validate reports its own failure, everything else needs a valid config.
    if let Command::Validate = cli.command {
        init_logging(cli.verbose, "info");
        return match load_config(&cli.config) {
            Ok(_) => {
                log::info!("✓ {} OK", cli.config.display());
                Ok(())
            }
            Err(e) => {
                log::error!("Config validation failed: {}", e);
                Err(e)
            }
        };
    }

    let config = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::File { identifier } => {
            let source = build_storage(&config.source).await?;
            let publisher = build_publisher(&config).await?;

            let identifier = Identifier::parse(&identifier)?;
            if !source.has_file(&identifier).await? {
                return Err(AppError::not_found(identifier.as_str()));
            }

            let url = publisher.publish_file(&File::new(identifier, source)).await?;
            println!("{url}");
        }

        Command::Folder {
            identifier,
            continue_on_error,
            json,
        } => {
            let source = build_storage(&config.source).await?;
            let publisher = build_publisher(&config).await?;

            let identifier = Identifier::parse(&identifier)?;
            if !source.has_folder(&identifier).await? {
                return Err(AppError::not_found(identifier.as_str()));
            }

            let policy = if continue_on_error {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            };
            let report = publisher
                .publish_folder_with(&Folder::new(identifier, source), policy)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entry in &report.entries {
                    println!("{}", entry.url);
                }
                for failure in &report.failures {
                    log::error!("{}: {}", failure.identifier, failure.message);
                }
            }

            if report.has_failures() {
                return Err(AppError::transfer(
                    report.root.as_str(),
                    format!("{} of {} files failed", report.failures.len(), report.total()),
                ));
            }
        }

        Command::Info => {
            let target = build_storage(&config.target).await?;
            let base_dir = match &config.publisher.base_dir {
                Some(raw) => normalize_base_dir(raw)?,
                None => None,
            };

            log::info!("Config: {}", cli.config.display());
            log::info!("Source: {:?}", config.source);
            log::info!("Target: {:?}", config.target);
            log::info!(
                "Base dir: {}",
                base_dir
                    .map(|dir| dir.to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            );
            log::info!(
                "Base URI: {}",
                config
                    .publisher
                    .base_uri
                    .clone()
                    .unwrap_or_else(|| target.base_uri())
            );
        }

        Command::Validate => {}
    }

    Ok(())
}
