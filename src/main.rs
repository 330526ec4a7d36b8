use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use waste_dispatch::batch::{DEFAULT_FLEET_SIZE, optimize_fleet};
use waste_dispatch::poller::{DispatchSession, PollOutcome, Poller};
use waste_dispatch::store::JsonFileStore;
use waste_dispatch::{
    CollectionPoint, DispatchConfig, Dispatcher, FleetState, OrsClient, OrsConfig, PollerConfig,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Evaluate candidate vehicles concurrently
    #[arg(long, global = true)]
    parallel: bool,

    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign one collection point and update the state file.
    Assign {
        /// Fleet state JSON; created if missing
        #[arg(short, long)]
        state: PathBuf,

        /// Collection point JSON
        #[arg(short, long)]
        point: PathBuf,
    },
    /// Run a single refresh cycle.
    Refresh {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Plan the whole fleet for every dustbin above the fill threshold.
    Optimize {
        /// JSON array of collection points
        #[arg(long)]
        dustbins: PathBuf,

        #[arg(long, default_value_t = DEFAULT_FLEET_SIZE)]
        vehicles: u32,
    },
    /// Keep routes live by refreshing on an interval.
    Poll {
        #[arg(short, long)]
        state: PathBuf,

        #[arg(long, default_value_t = 5000)]
        interval_ms: u64,

        /// Stop after this many cycles (runs forever when omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let solver = OrsClient::new(OrsConfig::from_env()).context("building solver client")?;
    let config = DispatchConfig {
        parallel_candidates: cli.parallel,
        ..DispatchConfig::default()
    };

    match cli.command {
        Commands::Assign { state, point } => {
            let raw = fs::read_to_string(&point)
                .with_context(|| format!("reading {}", point.display()))?;
            let point: CollectionPoint = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", point.display()))?;

            let session = DispatchSession::new(Dispatcher::new(solver, config), JsonFileStore::new(state));
            let next = session.submit(&point)?;
            print_summary(&next);
        }
        Commands::Refresh { state } => {
            let session = DispatchSession::new(Dispatcher::new(solver, config), JsonFileStore::new(state));
            match session.poll_once()? {
                PollOutcome::Refreshed(next) => print_summary(&next),
                PollOutcome::Skipped(reason) => info!(?reason, "nothing refreshed"),
            }
        }
        Commands::Optimize { dustbins, vehicles } => {
            let raw = fs::read_to_string(&dustbins)
                .with_context(|| format!("reading {}", dustbins.display()))?;
            let bins: Vec<CollectionPoint> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", dustbins.display()))?;

            let plan = optimize_fleet(&solver, &config, &bins, vehicles)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Poll {
            state,
            interval_ms,
            cycles,
        } => {
            let session = Arc::new(DispatchSession::new(
                Dispatcher::new(solver, config),
                JsonFileStore::new(state),
            ));
            let poller = Poller::spawn(
                Arc::clone(&session),
                PollerConfig {
                    interval: Duration::from_millis(interval_ms),
                    max_ticks: cycles,
                },
            );

            let ticks = poller.join();
            info!(ticks, "polling finished");
            print_summary(&session.state()?);
        }
    }

    Ok(())
}

fn print_summary(state: &FleetState) {
    for vehicle in &state.vehicles {
        let stops = state
            .route_for(vehicle.id)
            .map(|route| {
                route
                    .stops
                    .iter()
                    .filter(|stop| !stop.id.is_placeholder())
                    .map(|stop| stop.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            })
            .unwrap_or_default();
        info!(
            vehicle_id = vehicle.id,
            capacity_used = vehicle.capacity_used,
            "{}",
            if stops.is_empty() { "Idle" } else { stops.as_str() }
        );
    }
    info!(total_load = state.total_capacity_used(), "fleet");
}
