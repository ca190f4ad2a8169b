use std::time::Duration;

use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/tally.toml";
const DEFAULT_STATE_PATH: &str = "config/tally_state.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub refresh_secs: u64,
    pub state_path: String,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: client::DEFAULT_BASE_URL.to_string(),
            timeout_secs: client::DEFAULT_TIMEOUT.as_secs(),
            refresh_secs: client::DEFAULT_REFRESH_INTERVAL.as_secs(),
            state_path: DEFAULT_STATE_PATH.to_string(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

/// Layers the config file, `TALLY_*` variables and command line flags, in
/// that order.
pub fn load(cli: &Cli) -> Result<AppConfig> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TALLY"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(level) = &cli.level {
        settings.level = level.clone();
    }
    if let Some(state_path) = &cli.state {
        settings.state_path = state_path.clone();
    }

    Ok(settings)
}
