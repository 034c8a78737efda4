//! Carbon Ledger CLI
//!
//! Hosts the ledger for one operation per run on behalf of one caller.
//!
//! ## Usage
//!
//! ```bash
//! # Publish a factor and register a user
//! carbon-ledger factor --activity-type commute --date 2024-01-01 --name car --value 2
//! carbon-ledger --caller alice register --username Alice
//!
//! # Record activity and report
//! carbon-ledger --caller alice record --activity-type commute --description "drove to work" \
//!     --emissions 50 --date 2024-01-01
//! carbon-ledger --caller alice total
//! carbon-ledger --caller alice report
//!
//! # Custom storage directory
//! carbon-ledger --storage-dir /data/carbon --caller alice history
//! ```

use anyhow::{anyhow, Context};
use carbon_ledger::{provision, BenchmarkData, Config, EntityKey, Ledger, StaticIdentity, Stores};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "carbon-ledger")]
#[command(about = "Per-user carbon emission ledger")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "CARBON_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Identity of the caller this run acts for
    #[arg(long, env = "CARBON_CALLER")]
    caller: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record an activity for the caller
    Record {
        #[arg(long)]
        activity_type: String,
        #[arg(long)]
        description: String,
        /// Raw quantity before factor adjustment
        #[arg(long)]
        emissions: u64,
        #[arg(long)]
        date: String,
    },

    /// Show the caller's total emissions
    Total,

    /// Show the caller's report with recommendations
    Report,

    /// List the caller's records
    History,

    /// Register the caller
    Register {
        #[arg(short, long)]
        username: String,
    },

    /// Publish an environmental factor
    Factor {
        #[arg(long)]
        activity_type: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Multiplier applied to raw quantities
        #[arg(long)]
        value: u64,
    },

    /// Show or update the caller's settings
    Settings {
        #[arg(long)]
        units: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
    },

    /// Show or update a benchmark
    Benchmark {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        threshold: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("carbon_ledger=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if args.caller.is_some() {
        config.default_caller = args.caller;
    }

    let stores = Stores::from_config(&config)?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    match args.command {
        Command::Factor {
            activity_type,
            date,
            name,
            description,
            value,
        } => {
            let factor = provision::provision_factor(&stores, &activity_type, &date, &name, &description, value)
                .map_err(|e| anyhow!(e.to_string()))?;
            print_json(&factor)?;
        }
        Command::Benchmark { id, name, threshold } => {
            let id = EntityKey::from_raw(id);
            if let (Some(benchmark_name), Some(emissions_threshold)) = (name, threshold) {
                let benchmark = BenchmarkData {
                    id,
                    benchmark_name,
                    emissions_threshold,
                };
                provision::put_benchmark(&stores, &benchmark).map_err(|e| anyhow!(e.to_string()))?;
                print_json(&benchmark)?;
            } else {
                let benchmark = provision::benchmark(&stores, &id)?
                    .ok_or_else(|| anyhow!("Benchmark not found."))?;
                print_json(&benchmark)?;
            }
        }
        command => {
            let caller = config
                .default_caller
                .clone()
                .ok_or_else(|| anyhow!("No caller identity; pass --caller or set CARBON_CALLER"))?;
            let mut ledger = Ledger::new(stores, StaticIdentity::new(caller));
            run_as_caller(&mut ledger, command)?;
        }
    }

    Ok(())
}

fn run_as_caller(ledger: &mut Ledger<StaticIdentity>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Record {
            activity_type,
            description,
            emissions,
            date,
        } => {
            let record = ledger
                .record_emission(&activity_type, &description, emissions, &date)
                .map_err(|e| anyhow!(e))?;
            print_json(&record)?;
        }
        Command::Total => {
            println!("{}", ledger.total_emissions().map_err(|e| anyhow!(e))?);
        }
        Command::Report => {
            println!("{}", ledger.generate_report().map_err(|e| anyhow!(e))?);
        }
        Command::History => {
            print_json(&ledger.history().map_err(|e| anyhow!(e))?)?;
        }
        Command::Register { username } => {
            print_json(&ledger.register(&username).map_err(|e| anyhow!(e))?)?;
        }
        Command::Settings { units, notifications } => {
            let settings = match (units, notifications) {
                (None, None) => ledger
                    .settings()
                    .map_err(|e| anyhow!(e))?
                    .ok_or_else(|| anyhow!("No settings saved."))?,
                (units, notifications) => {
                    let current = ledger.settings().map_err(|e| anyhow!(e))?;
                    let units = units
                        .or_else(|| current.as_ref().map(|s| s.preferred_units.clone()))
                        .unwrap_or_else(|| "kg".to_string());
                    let notifications = notifications
                        .or_else(|| current.as_ref().map(|s| s.notifications_enabled))
                        .unwrap_or(false);
                    ledger
                        .update_settings(&units, notifications)
                        .map_err(|e| anyhow!(e))?
                }
            };
            print_json(&settings)?;
        }
        Command::Factor { .. } | Command::Benchmark { .. } => unreachable!("handled without a caller"),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
