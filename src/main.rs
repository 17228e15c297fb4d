// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Bell Server
//!
//! # Usage
//!
//! ```bash
//! # Start the server
//! qubit-os-bell serve --config /path/to/config.yaml
//!
//! # Run one operation locally and print the result
//! qubit-os-bell run "Run CHSH"
//! qubit-os-bell run 301 --rig simulator
//!
//! # List operations and rigs
//! qubit-os-bell operations
//! qubit-os-bell rigs
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qubit_os_bell::config::Config;
use qubit_os_bell::hardware::{ContextHandle, HealthStatus, RigRegistry, SimulatedRig};
use qubit_os_bell::orchestrator::Experiment;
use qubit_os_bell::protocol::{Dispatcher, Outcome, OPERATIONS};
use qubit_os_bell::{server, Error, Result, VERSION};

/// QubitOS Bell-violation experiment server
#[derive(Parser)]
#[command(name = "qubit-os-bell")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Two-qubit Bell-violation experiment server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Serve {
        /// REST port
        #[arg(long, env = "QUBITOS_BELL_PORT")]
        port: Option<u16>,
    },

    /// Run one operation and print its values
    Run {
        /// Operation ID or name
        operation: String,

        /// Rig to run on (default rig if omitted)
        #[arg(short, long)]
        rig: Option<String>,

        /// Context handle, two words
        #[arg(long, num_args = 2, default_values_t = [0, 0])]
        context: Vec<u32>,
    },

    /// List operations
    Operations,

    /// List rigs
    Rigs,

    /// Check rig health
    Health,

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, &config.logging.format);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let dispatcher = Arc::new(build_dispatcher(&config)?);
            info!(
                version = VERSION,
                port = config.server.port,
                rigs = ?dispatcher.rigs().list_with_types(),
                "Starting QubitOS Bell server"
            );
            server::run_server(&config.server, dispatcher).await?;
        }

        Commands::Run {
            operation,
            rig,
            context,
        } => {
            config.validate()?;
            let dispatcher = build_dispatcher(&config)?;
            let ctx = ContextHandle(context[0], context[1]);
            match dispatcher
                .invoke_by_key(&operation, ctx, rig.as_deref())
                .await
            {
                Ok(Outcome::Values(values)) => {
                    println!("{}", serde_json::to_string(&values)?);
                }
                Ok(Outcome::Shutdown) => {
                    println!("Nothing to stop outside the server");
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Operations => {
            for (_, op) in OPERATIONS {
                println!("{:>6}  {:<22} {}", op.id, op.name, op.description);
            }
        }

        Commands::Rigs => {
            let registry = initialize_rigs(&config)?;
            println!("Available rigs:");
            for (name, rig_type) in registry.list_with_types() {
                let default_marker = if Some(&name) == registry.default_rig_name().as_ref() {
                    " (default)"
                } else {
                    ""
                };
                println!("  {} [{}]{}", name, rig_type, default_marker);
            }
        }

        Commands::Health => {
            let registry = initialize_rigs(&config)?;
            let mut all_healthy = true;
            for (name, _) in registry.list_with_types() {
                let rig = registry.get(&name)?;
                match rig.health_check().await {
                    Ok(status) => {
                        println!("{}: {:?}", name, status);
                        all_healthy &= status == HealthStatus::Healthy;
                    }
                    Err(e) => {
                        println!("{}: Error - {}", name, e);
                        all_healthy = false;
                    }
                }
            }
            if !all_healthy {
                std::process::exit(1);
            }
        }

        Commands::Config => {
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "compact" {
        registry.with(fmt::layer().compact().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

/// Register the rigs enabled in the configuration.
fn initialize_rigs(config: &Config) -> Result<RigRegistry> {
    let registry = RigRegistry::new();

    if config.simulator.enabled {
        registry.register(Arc::new(SimulatedRig::new("simulator", &config.simulator)));
        info!(seed = ?config.simulator.seed, "Simulated rig initialized");
    }

    if registry.is_empty() {
        error!("No rigs available. At least one rig must be enabled.");
        return Err(Error::Config(
            "No rigs available. At least one rig must be enabled.".to_string(),
        ));
    }

    if registry.contains(&config.experiment.rig) {
        registry.set_default(&config.experiment.rig)?;
    }

    Ok(registry)
}

fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let rigs = Arc::new(initialize_rigs(config)?);
    let experiment = Arc::new(Experiment::from_config(config)?);
    Ok(Dispatcher::new(experiment, rigs))
}
