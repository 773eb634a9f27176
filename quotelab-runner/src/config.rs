//! Application configuration loaded from `quotelab.toml`.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) is a valid configuration.

use quotelab_core::data::{Interval, RangeHint};
use quotelab_core::resolve::DEFAULT_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "quotelab.toml";
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_LOOKBACK: usize = 60;
pub const DEFAULT_SIGNAL_TYPE: &str = "gemini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub resolver: ResolverConfig,
    pub collector: CollectorConfig,
    pub analyzer: AnalyzerConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Like [`AppConfig::from_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyzer.lookback == 0 {
            return Err(ConfigError::Invalid("analyzer.lookback must be at least 1".into()));
        }
        if self.analyzer.signal_type.trim().is_empty() {
            return Err(ConfigError::Invalid("analyzer.signal_type must not be empty".into()));
        }
        if self.analyzer.model.trim().is_empty() {
            return Err(ConfigError::Invalid("analyzer.model must not be empty".into()));
        }
        for (i, entry) in self.collector.watchlist.iter().enumerate() {
            if entry.target().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "collector.watchlist[{i}] needs a symbol or a query"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StorageConfig {
    pub fn prices_path(&self) -> PathBuf {
        self.data_dir.join("prices.parquet")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.csv")
    }

    pub fn signals_path(&self) -> PathBuf {
        self.data_dir.join("signals.csv")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub default_suffix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub interval: Interval,
    pub watchlist: Vec<WatchlistEntry>,
}

/// One symbol to collect. `symbol` wins over `query` when both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl WatchlistEntry {
    pub fn symbol(symbol: &str) -> Self {
        Self {
            query: None,
            symbol: Some(symbol.to_string()),
            interval: None,
            active: true,
        }
    }

    pub fn query(query: &str) -> Self {
        Self {
            query: Some(query.to_string()),
            symbol: None,
            interval: None,
            active: true,
        }
    }

    /// Text handed to the resolver.
    pub fn target(&self) -> Option<&str> {
        [self.symbol.as_deref(), self.query.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub model: String,
    pub lookback: usize,
    /// Tag written to the `type` column of the signal log.
    pub signal_type: String,
    /// Environment variable holding the model API key.
    pub api_key_env: String,
    /// History range fetched when an untracked symbol is analyzed.
    pub recent_range: RangeHint,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            lookback: DEFAULT_LOOKBACK,
            signal_type: DEFAULT_SIGNAL_TYPE.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            recent_range: RangeHint::ThreeMonths,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.analyzer.model, "models/gemini-2.5-flash");
        assert_eq!(config.analyzer.lookback, 60);
        assert_eq!(config.resolver.default_suffix, "US");
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn parses_watchlist() {
        let config = AppConfig::from_toml(
            r#"
            [storage]
            data_dir = "/var/lib/quotelab"

            [collector]
            interval = "d"

            [[collector.watchlist]]
            query = "삼성전자"

            [[collector.watchlist]]
            symbol = "tsla.us"
            query = "tesla"
            interval = "weekly"

            [[collector.watchlist]]
            symbol = "NFLX.US"
            active = false
            "#,
        )
        .unwrap();

        let list = &config.collector.watchlist;
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].target(), Some("삼성전자"));
        assert!(list[0].active);
        assert_eq!(list[1].target(), Some("tsla.us"));
        assert_eq!(list[1].interval, Some(Interval::Weekly));
        assert!(!list[2].active);
        assert_eq!(
            config.storage.signals_path(),
            PathBuf::from("/var/lib/quotelab/signals.csv")
        );
    }

    #[test]
    fn rejects_zero_lookback() {
        let err = AppConfig::from_toml("[analyzer]\nlookback = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_signal_type() {
        let err = AppConfig::from_toml("[analyzer]\nsignal_type = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_entry_without_target() {
        let err = AppConfig::from_toml("[[collector.watchlist]]\nactive = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_interval() {
        let err = AppConfig::from_toml("[collector]\ninterval = \"hourly\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = AppConfig::default();
        config.collector.watchlist = vec![WatchlistEntry::query("카카오"), WatchlistEntry::symbol("AAPL.US")];
        config.analyzer.recent_range = RangeHint::SixMonths;
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn example_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../quotelab.example.toml");
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.collector.watchlist.len(), 4);
        assert_eq!(config.analyzer, AnalyzerConfig::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(matches!(
            AppConfig::from_file(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
