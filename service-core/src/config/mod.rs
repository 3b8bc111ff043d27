use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every service binary.
///
/// Read from an optional `configuration.{toml,yaml,json}` file, then from
/// `APP__*` environment variables (for example `APP__PORT=9000`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut loaded: Config = config.try_deserialize()?;

        // Unprefixed fallbacks used by the deployment manifests.
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            loaded.log_level = level;
        }
        if loaded.otlp_endpoint.is_none() {
            loaded.otlp_endpoint = std::env::var("OTLP_ENDPOINT")
                .ok()
                .filter(|endpoint| !endpoint.trim().is_empty());
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_listens_on_8080() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert!(config.otlp_endpoint.is_none());
    }
}
