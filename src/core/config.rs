use crate::providers::binance::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BinanceProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for BinanceProviderConfig {
    fn default() -> Self {
        BinanceProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BinanceProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub binance: Option<BinanceProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            binance: Some(BinanceProviderConfig::default()),
        }
    }
}

/// Price cache sizing. Prices are kept for `ttl_secs` after insertion.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 60,
            capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Upper bound on concurrent lookups within one report. Unbounded when unset.
    /// Reports running at the same time each get their own allowance.
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Symbols valued by `bulk` when none are given on the command line.
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "zenon", "tradeflow")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be greater than zero");
        }
        if self.report.max_concurrency == Some(0) {
            anyhow::bail!("report.max_concurrency must be greater than zero");
        }
        if self.symbols.iter().any(|s| s.is_empty()) {
            anyhow::bail!("symbols must not contain empty entries");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  binance:
    base_url: "http://example.com/binance"
cache:
  ttl_secs: 30
  capacity: 50
report:
  max_concurrency: 8
symbols:
  - BTCUSDT
  - ETHUSDT
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let binance = config.providers.binance.unwrap();
        assert_eq!(binance.base_url, "http://example.com/binance");
        assert_eq!(binance.timeout_secs, 10);
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.report.max_concurrency, Some(8));
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = serde_yaml::from_str("symbols: [BNBUSDT]").unwrap();
        assert_eq!(
            config.providers.binance.unwrap().base_url,
            "https://api.binance.com/api/v3"
        );
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.capacity, 1000);
        assert!(config.report.max_concurrency.is_none());

        let partial: AppConfig = serde_yaml::from_str("cache:\n  ttl_secs: 5\n").unwrap();
        assert_eq!(partial.cache.ttl_secs, 5);
        assert_eq!(partial.cache.capacity, 1000);
    }

    #[test]
    fn test_load_rejects_zero_capacity() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "cache:\n  capacity: 0\n").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("cache.capacity must be greater than zero"));
    }
}
