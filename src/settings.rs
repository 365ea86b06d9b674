use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://watch2earn-vie97.ondigitalocean.app/api";

#[derive(Clone, Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Storage {
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Rewards {
    pub ad_reward: f64,
    pub daily_bonus: f64,
    pub daily_cap: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    #[serde(default)]
    pub storage: Storage,
    pub rewards: Rewards,
}

impl Settings {
    /// Layers an optional config file and `ADWATCH_*` environment variables
    /// (e.g. `ADWATCH_API__BASE_URL`) over the defaults.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("api.base_url", DEFAULT_API_URL)?
            .set_default("api.timeout_secs", 10)?
            .set_default("rewards.ad_reward", 1.0)?
            .set_default("rewards.daily_bonus", 1.0)?
            .set_default("rewards.daily_cap", 5)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ADWATCH").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Directory of the durable store; the platform data dir unless configured.
    pub fn storage_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.dir {
            return dir.clone();
        }

        directories::ProjectDirs::from("app", "ukads", "adwatch")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| Path::new(".adwatch").to_path_buf())
    }
}
