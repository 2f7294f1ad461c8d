use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::error::AllocationResult;

const ENV_PREFIX: &str = "ALLOCATION";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub whitelist: WhitelistConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhitelistConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Config {
    /// Defaults, then `allocation.toml` (or `path`) if present, then
    /// `ALLOCATION__*` environment variables.
    pub fn load(path: Option<&Path>) -> AllocationResult<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> AllocationResult<Self> {
        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("allocation").required(false),
        };

        let config_builder = config::Config::builder()
            .set_default("whitelist.path", "whitelist.json")?
            .set_default("service.log_level", "info")?
            .add_source(file_source)
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;

        let config: Config = config_builder.try_deserialize()?;
        Ok(config)
    }

    /// Configured level, `INFO` when the value is not a level name.
    pub fn log_level(&self) -> tracing::Level {
        self.service
            .log_level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO)
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::new(self.log_level().as_str())
    }
}
