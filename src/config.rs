use serde::Deserialize;
use std::path::PathBuf;

const MIN_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Where the station list comes from.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume of every new session, 0.0..=1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Ask the decoder to reconnect on dropped live streams.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            country: default_country(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            stream: default_stream(),
        }
    }
}

fn default_base_url() -> String {
    "https://de1.api.radio-browser.info".to_string()
}

fn default_country() -> String {
    "India".to_string()
}

fn default_user_agent() -> String {
    concat!("india_radio_tui/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_volume() -> f32 {
    0.7
}

fn default_stream() -> bool {
    true
}

impl Config {
    /// Reads the config file if present. A missing or unreadable file yields
    /// defaults; nothing is ever written back.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| Self::from_toml(&s))
        {
            Ok(config) => {
                tracing::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Pulls values a user can write but the player cannot use back into range.
    fn sanitized(mut self) -> Self {
        if self.directory.timeout_secs < MIN_TIMEOUT_SECS {
            tracing::warn!(
                "timeout_secs = {} is too short, using {}",
                self.directory.timeout_secs,
                MIN_TIMEOUT_SECS
            );
            self.directory.timeout_secs = MIN_TIMEOUT_SECS;
        }
        if !self.playback.volume.is_finite() {
            tracing::warn!("volume = {} is not a number, using default", self.playback.volume);
            self.playback.volume = default_volume();
        }
        self.playback.volume = self.playback.volume.clamp(0.0, 1.0);
        self
    }

    pub fn config_path() -> PathBuf {
        data_root(dirs::config_dir()).join("config.toml")
    }

    pub fn log_path() -> PathBuf {
        data_root(dirs::data_local_dir()).join("india-radio.log")
    }

    /// Full URL of the by-country station listing.
    pub fn stations_url(&self) -> String {
        format!(
            "{}/json/stations/bycountryexact/{}",
            self.directory.base_url.trim_end_matches('/'),
            self.directory.country
        )
    }
}

fn data_root(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir).join("india-radio")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.directory.country, "India");
        assert_eq!(config.directory.timeout_secs, 30);
        assert!((config.playback.volume - 0.7).abs() < f32::EPSILON);
        assert!(config.playback.stream);
        assert_eq!(
            config.stations_url(),
            "https://de1.api.radio-browser.info/json/stations/bycountryexact/India"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [directory]
            base_url = "http://localhost:8080/"
            country = "Nepal"

            [playback]
            volume = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(
            config.stations_url(),
            "http://localhost:8080/json/stations/bycountryexact/Nepal"
        );
        assert_eq!(config.directory.timeout_secs, 30);
        assert!((config.playback.volume - 0.3).abs() < f32::EPSILON);
        assert!(config.playback.stream);
    }

    #[test]
    fn test_unusable_values_fall_back() {
        let config = Config::from_toml(
            r#"
            [directory]
            timeout_secs = 0

            [playback]
            volume = nan
            "#,
        )
        .unwrap();
        assert_eq!(config.directory.timeout_secs, 1);
        assert!((config.playback.volume - 0.7).abs() < f32::EPSILON);

        let loud = Config::from_toml("[playback]\nvolume = 3.5").unwrap();
        assert_eq!(loud.playback.volume, 1.0);
        let negative = Config::from_toml("[playback]\nvolume = -inf").unwrap();
        assert!((negative.playback.volume - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(Config::from_toml("[directory\ncountry = 1").is_err());
    }
}
