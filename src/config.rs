/// Service configuration.
///
/// Loaded from a TOML file (`surfmon.toml` by default, overridable via the
/// `SURFMON_CONFIG` environment variable), with every section optional and
/// serde-defaulted so an absent file yields a fully working configuration.
/// A few settings can additionally be overridden by environment variables
/// (`PORT`, `HND_BAYERN_URL`, `MODEL_PATH`), matching the deployment knobs
/// the binaries document. Binaries call `dotenv().ok()` before loading so a
/// local `.env` file participates.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;

use crate::spot;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub collect: CollectConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the prediction endpoint.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 5001 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Serialized model artifact, written by `train_model`, read by `serve`.
    pub model_artifact: String,
    /// Merged feature CSV written by `generate_features`.
    pub feature_csv: String,
    /// Labeled CSV read by `train_model`.
    pub training_csv: String,
    /// Output of `generate_synthetic`.
    pub synthetic_csv: String,
    /// Directory of GKD `temp_*.csv` exports.
    pub temperature_dir: String,
    /// Directory for cached Open-Meteo responses.
    pub weather_cache_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            model_artifact: "surfer_prediction_model.json".to_string(),
            feature_csv: "combined_feature_data.csv".to_string(),
            training_csv: "combined_feature_and_target_data.csv".to_string(),
            synthetic_csv: "dummy_surfer_data.csv".to_string(),
            temperature_dir: "temperature-data".to_string(),
            weather_cache_dir: ".meteo-cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// HND Bayern water-level history table URL.
    pub hnd_url: String,
    /// Coordinates for Open-Meteo archive queries.
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            hnd_url: spot::SPOT.history_url.to_string(),
            latitude: spot::SPOT.latitude,
            longitude: spot::SPOT.longitude,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// When false, air temperature and weather condition are filled with
    /// random placeholder values instead of querying the archive API.
    pub use_weather_api: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        CollectConfig { use_weather_api: true }
    }
}

impl Config {
    /// Load configuration: `SURFMON_CONFIG` path or `./surfmon.toml` if it
    /// exists, defaults otherwise, then environment overrides on top.
    pub fn load() -> Result<Config, Box<dyn Error>> {
        let path = std::env::var("SURFMON_CONFIG").unwrap_or_else(|_| "surfmon.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("HND_BAYERN_URL") {
            self.sources.hnd_url = url;
        }
        if let Ok(path) = std::env::var("MODEL_PATH") {
            self.paths.model_artifact = path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_section() {
        let config = Config::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.paths.model_artifact, "surfer_prediction_model.json");
        assert!(config.sources.hnd_url.contains("hnd.bayern.de"));
        assert!(config.collect.use_weather_api);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [collect]
            use_weather_api = false
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.collect.use_weather_api);
        // Untouched sections keep their defaults
        assert_eq!(config.paths.feature_csv, "combined_feature_data.csv");
        assert_eq!(config.sources.latitude, spot::SPOT.latitude);
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5001);
    }
}
