//! Coffee provenance ledger CLI
//!
//! Invokes one ledger operation against a local sled record store.
//!
//! ## Usage
//!
//! ```bash
//! # Register a grower
//! provenance-cli addMember g1 "Sidama Union" Hawassa grower
//!
//! # Originate a batch (prints the new batch id)
//! provenance-cli addCoffee 60kg light g1
//!
//! # Read any record by key
//! provenance-cli query <batch-id>
//!
//! # Use a config file and a different store directory
//! provenance-cli --config provenance.yaml --store /data/ledger pourCup CJB001
//! ```

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use config::CliConfig;
use provenance::{CoffeeContract, SledStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "provenance-cli")]
#[command(about = "Invoke coffee provenance ledger operations")]
struct Args {
    /// Path to YAML config file
    #[arg(short, long, env = "PROVENANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Record store directory
    #[arg(long, env = "PROVENANCE_STORE")]
    store: Option<PathBuf>,

    /// Operation name (addMember, addCoffee, submitFairTradeData,
    /// submitPackingList, submitWeightTally, submitCupping, releaseForSale,
    /// pourCup, query)
    operation: String,

    /// Positional operation arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("provenance=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(store) = args.store {
        config.store_path = store;
    }

    let store = Arc::new(SledStore::open(&config.store_path)?);
    info!(store = %config.store_path.display(), operation = %args.operation, "Invoking");

    let contract = CoffeeContract::new(store.clone(), config.contract);
    let outcome = contract.invoke(&args.operation, &args.args).await;
    store.flush().await?;

    match outcome {
        Ok(Some(output)) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(kind = %err.kind(), error = %err, "Operation failed");
            eprintln!("{}: {}", err.kind(), err);
            Ok(ExitCode::FAILURE)
        }
    }
}
