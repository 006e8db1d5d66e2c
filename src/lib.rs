//! Noah Ops core library
//!
//! Metrics derivation over a static hospital dataset, threshold alerts and
//! the playback cursor that drives which hour the dashboard shows.

pub mod core;
pub mod error;
pub mod models;
pub mod ui;

pub use error::{OpsError, Result};

/// Application configuration
pub mod config {
    use serde::Deserialize;
    use validator::Validate;

    use crate::error::Result;

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct Config {
        #[validate]
        pub playback: PlaybackConfig,
        #[validate]
        pub dashboard: DashboardConfig,
        #[validate]
        pub data: DataConfig,
        pub logging: LoggingConfig,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct PlaybackConfig {
        pub initial_hour: u32,
        #[validate(range(min = 1, max = 60000))]
        pub base_interval_ms: u64,
        /// 1, 2 or 4; other values in range fall back to 1x.
        #[validate(range(min = 1, max = 4))]
        pub initial_speed: u32,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct DashboardConfig {
        #[validate(range(min = 1))]
        pub window_hours: u32,
        #[validate(range(min = 1))]
        pub max_selected: usize,
        #[validate(range(min = 1))]
        pub peak_hours: usize,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct DataConfig {
        /// JSON document to load; the synthetic dataset is used when unset.
        pub path: Option<String>,
        pub seed: u64,
        #[validate(range(min = 1, max = 8760))]
        pub hours: u32,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct LoggingConfig {
        pub level: String,
        pub json: bool,
    }

    /// Load configuration: built-in defaults, then `config/default`, then
    /// `config/{NOAH_OPS_ENV}`, then `NOAH_OPS__*` environment variables.
    pub fn load_config() -> Result<Config> {
        let env = std::env::var("NOAH_OPS_ENV").unwrap_or_else(|_| "development".into());

        let settings = ::config::Config::builder()
            .set_default("playback.initial_hour", 36)?
            .set_default("playback.base_interval_ms", 1000)?
            .set_default("playback.initial_speed", 1)?
            .set_default("dashboard.window_hours", 24)?
            .set_default("dashboard.max_selected", 4)?
            .set_default("dashboard.peak_hours", 5)?
            .set_default("data.seed", 42)?
            .set_default("data.hours", 48)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(::config::Environment::with_prefix("NOAH_OPS").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults_load_and_validate() {
            let config = load_config().unwrap();
            assert_eq!(config.dashboard.window_hours, 24);
            assert_eq!(config.playback.base_interval_ms, 1000);
            assert_eq!(config.data.hours, 48);
        }

        #[test]
        fn test_rejects_unsupported_speed() {
            let config =
                PlaybackConfig { initial_hour: 0, base_interval_ms: 1000, initial_speed: 8 };
            assert!(config.validate().is_err());
            let config = PlaybackConfig { initial_speed: 4, ..config };
            assert!(config.validate().is_ok());
            let config = PlaybackConfig { base_interval_ms: 0, ..config };
            assert!(config.validate().is_err());
        }
    }
}
