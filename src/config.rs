/// Service configuration.
///
/// Loaded from a TOML file in which every field is optional, then
/// overridden from the environment (a `.env` file is read first via
/// `dotenv`). Secrets such as the backend token are expected to come from
/// the environment rather than the file.
///
/// Recognised environment variables:
///   PATIMON_REMOTE_URL    remote.base_url
///   PATIMON_REMOTE_TOKEN  remote.token
///   PATIMON_LOG_LEVEL     logging.level
///   PATIMON_SEED          simulation.seed

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::rewards::DEFAULT_DEMO_ACCOUNT;
use crate::simulation::decay::{DecayRange, DecaySource, RandomDecay};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds between decay ticks.
    pub tick_interval_secs: u64,
    /// Inclusive bounds of the random per-tick decrement.
    pub min_decay: u8,
    pub max_decay: u8,
    /// Stations generated per registry city when no seed file is given.
    pub stations_per_city: usize,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// JSON file of station seed records.
    pub seed_file: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            min_decay: 2,
            max_decay: 9,
            stations_per_city: 3,
            seed: None,
            seed_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    /// Points credited for a manual refill.
    pub refill_reward_points: u64,
    /// Accounts that never sync to the remote backend.
    pub demo_accounts: Vec<String>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            refill_reward_points: 50,
            demo_accounts: vec![DEFAULT_DEMO_ACCOUNT.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Remote sync is disabled when unset.
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Session file; an in-memory store is used when unset.
    pub session_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_file: Some(PathBuf::from("patimon_session.json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub rewards: RewardsConfig,
    pub remote: RemoteConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Loads `.env` (if present) and applies process environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        dotenv::dotenv().ok();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup, so tests do not need to
    /// touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PATIMON_REMOTE_URL") {
            self.remote.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(token) = lookup("PATIMON_REMOTE_TOKEN") {
            self.remote.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(level) = lookup("PATIMON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(seed) = lookup("PATIMON_SEED") {
            let seed = seed.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "PATIMON_SEED",
                message: e.to_string(),
            })?;
            self.simulation.seed = Some(seed);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "simulation.tick_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if sim.min_decay > sim.max_decay {
            return Err(ConfigError::Invalid {
                key: "simulation.min_decay",
                message: format!("{} exceeds max_decay {}", sim.min_decay, sim.max_decay),
            });
        }
        if sim.max_decay > 100 {
            return Err(ConfigError::Invalid {
                key: "simulation.max_decay",
                message: format!("{} exceeds 100", sim.max_decay),
            });
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "remote.timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.simulation.tick_interval_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    pub fn decay_range(&self) -> DecayRange {
        DecayRange::new(self.simulation.min_decay, self.simulation.max_decay).unwrap_or_default()
    }

    /// Random decay source, seeded from config when a seed is set.
    pub fn decay_source(&self) -> Box<dyn DecaySource> {
        match self.simulation.seed {
            Some(seed) => Box::new(RandomDecay::seeded(self.decay_range(), seed)),
            None => Box::new(RandomDecay::from_entropy(self.decay_range())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
