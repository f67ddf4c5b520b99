use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use std::path::Path;
use tracing::{debug, info};

use super::runtime::PipelineConfig;

pub const ENV_PREFIX: &str = "FORECAST";
const DEFAULT_CONFIG_FILE: &str = "forecast";

/// Loads settings from an optional TOML file, then `FORECAST__*` environment
/// variables (`FORECAST__FORECAST__HORIZON=20`). A `.env` file is read first
/// if present.
pub fn load(path: Option<&Path>) -> Result<PipelineConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", env_file.display());
    }

    let mut builder = Config::builder();
    builder = match path {
        Some(p) => {
            info!("Loading configuration from {}", p.display());
            builder.add_source(File::from(p).required(true))
        }
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config: PipelineConfig = builder.build()?.try_deserialize()?;
    config.validate().map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))?;

    Ok(config)
}

/// Default settings rendered as TOML, for `init-config`.
pub fn default_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&PipelineConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_toml_parses_back() {
        let text = default_toml().unwrap();
        let parsed: PipelineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.forecast.window_size, 100);
        assert_eq!(parsed.investment.min, PipelineConfig::default().investment.min);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("forecast-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[forecast]\nhorizon = 20\nsmoothing_window = 5").unwrap();
        drop(file);

        let config = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.forecast.horizon, 20);
        assert_eq!(config.forecast.smoothing_window, 5);
        assert_eq!(config.forecast.window_size, 100);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("forecast-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[forecast]\ntrain_split = 1.5\n").unwrap();

        let result = load(Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load(Some(Path::new("/nonexistent/forecast.toml")));
        assert!(result.is_err());
    }
}
