//! patimon - feeding-station monitoring daemon
//!
//! Seeds the station collection, restores the volunteer session, and runs
//! the decay timer until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use patimon_service::config::Config;
use patimon_service::logging::{self, Component, LogLevel};
use patimon_service::monitor::Monitor;
use patimon_service::rewards::{DEFAULT_DEMO_ACCOUNT, RewardLedger, SessionStore};
use patimon_service::stations;
use patimon_service::store::{JsonFileStore, KeyValueStore, MemoryStore};
use patimon_service::sync::HttpRemoteSync;

#[derive(Parser, Debug)]
#[command(name = "patimon", version, about = "Feeding-station monitoring daemon")]
struct Args {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, env = "PATIMON_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Volunteer account to sign in as
    #[arg(short, long, default_value = DEFAULT_DEMO_ACCOUNT)]
    user: String,

    /// Display name for a volunteer without a stored session
    #[arg(long, default_value = "Pati Dostu")]
    display_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    logging::init_logger(
        LogLevel::parse(level),
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );
    logging::info(
        Component::System,
        None,
        &format!("patimon {} starting", env!("CARGO_PKG_VERSION")),
    );

    // Stations
    let seeds = match &config.simulation.seed_file {
        Some(path) => stations::load_seed_file(path)?,
        None => {
            let mut rng = match config.simulation.seed {
                Some(seed) => Pcg64Mcg::seed_from_u64(seed),
                None => Pcg64Mcg::from_entropy(),
            };
            stations::generate_seeds(config.simulation.stations_per_city, &mut rng)
        }
    };
    let station_list = stations::build_stations(seeds, Utc::now());
    let summary = stations::summarize(&station_list);
    logging::info(
        Component::System,
        None,
        &format!(
            "{} stations seeded: {} full, {} decreasing, {} critical",
            summary.total, summary.full, summary.decreasing, summary.critical
        ),
    );

    // Rewards
    let kv: Arc<dyn KeyValueStore> = match &config.store.session_file {
        Some(path) => Arc::new(JsonFileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    let sessions = SessionStore::new(kv);
    let mut ledger =
        RewardLedger::new(sessions.clone()).with_demo_accounts(config.rewards.demo_accounts.clone());

    match &config.remote.base_url {
        Some(url) => {
            match HttpRemoteSync::new(url, config.remote.token.clone(), config.remote_timeout()) {
                Ok(remote) => {
                    logging::info(Component::Sync, None, &format!("remote sync via {}", remote.base_url()));
                    ledger = ledger.with_remote(Arc::new(remote));
                }
                Err(e) => logging::warn(
                    Component::Sync,
                    None,
                    &format!("remote sync disabled: {}", e),
                ),
            }
        }
        None => logging::info(Component::Sync, None, "no remote backend configured; local-only"),
    }

    let monitor = Monitor::new(
        station_list,
        config.decay_source(),
        ledger,
        config.rewards.refill_reward_points,
    );
    monitor.sign_in(sessions.restore_or_create(&args.user, &args.display_name));

    let handle = monitor.spawn(config.tick_interval());

    tokio::signal::ctrl_c().await?;
    logging::info(Component::System, None, "interrupt received, shutting down");

    handle.shutdown().await;
    if let Some(user) = monitor.current_user() {
        logging::info(
            Component::System,
            None,
            &format!("{} leaves with {} points", user.display_name, user.points),
        );
    }

    Ok(())
}
