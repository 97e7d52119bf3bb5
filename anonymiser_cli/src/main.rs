//! # Anonymiser CLI
//!

use anonymiser_cli::commands::{self, ApplyOptions};
use anonymiser_cli::CliError;
use anonymiser_core::{log_info, logging};
use anonymiser_engine::strategies::StrategyRegistry;
use anonymiser_engine::AnonymiserConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Declarative record anonymisation
#[derive(Parser, Debug)]
#[command(name = "anonymiser-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Runtime configuration file (TOML); defaults come from ANONYMISER_* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter passed to env_logger (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply policies to a JSON record file
    Apply {
        /// Policy declarations (TOML)
        #[arg(long)]
        policy: PathBuf,

        /// Records keyed by record type (JSON)
        #[arg(long)]
        records: PathBuf,

        /// Only anonymise records found by this subject selector
        #[arg(long, requires = "subject_id")]
        subject: Option<String>,

        /// Subject identifier passed to the selector
        #[arg(long, requires = "subject")]
        subject_id: Option<String>,

        /// Write the anonymised records here instead of rewriting --records
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Check the policies and stop before touching any record
        #[arg(long)]
        validate_only: bool,
    },

    /// Check policies for fields without an anonymisation strategy
    Validate {
        /// Policy declarations (TOML)
        #[arg(long)]
        policy: PathBuf,
    },

    /// List the named strategies available to policy files
    Strategies,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .parse_filters(&cli.log_level)
        .init();

    if let Err(error) = run(cli) {
        eprintln!("Error: {}", error);
        std::process::exit(error.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runtime = commands::load_runtime_config(cli.config.as_deref())?;

    logging::config::init_runtime_preferences(runtime.logging.clone()).map_err(CliError::Logging)?;
    logging::init_global_logging().map_err(CliError::Logging)?;
    log_info!("Anonymiser starting", "version" => env!("CARGO_PKG_VERSION"));

    let config = AnonymiserConfig::from_settings(&runtime.engine)?;

    match cli.command {
        Commands::Apply {
            policy,
            records,
            subject,
            subject_id,
            output,
            validate_only,
        } => {
            let options = ApplyOptions {
                policy,
                records,
                subject: subject.zip(subject_id),
                output,
                validate_only,
            };
            let report = commands::apply::run(&options, config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Validate { policy } => {
            let failures = commands::validate::run(&policy, config)?;
            if !failures.is_empty() {
                for failure in &failures {
                    println!("{}: {}", failure.record_type, failure.message);
                }
                return Err(CliError::IncompletePolicies {
                    count: failures.len(),
                });
            }
            println!("All policies are complete");
        }

        Commands::Strategies => {
            let registry = StrategyRegistry::with_defaults(&config);
            for name in registry.names() {
                println!("{}", name);
            }
            println!("hex");
            println!("hex:<length>");
        }
    }

    Ok(())
}
