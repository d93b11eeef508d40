//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use restonks::MatchMode;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioConfig {
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_weights_file")]
    pub weights_file: PathBuf,
    #[serde(default = "default_ticker_match")]
    pub ticker_match: TickerMatch,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            weights_file: default_weights_file(),
            ticker_match: default_ticker_match(),
        }
    }
}

fn default_base_currency() -> String {
    "USD".into()
}
fn default_weights_file() -> PathBuf {
    PathBuf::from("weights.toml")
}
fn default_ticker_match() -> TickerMatch {
    TickerMatch::Exact
}

/// How target names are matched against held tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerMatch {
    Exact,
    Contains,
}

impl From<TickerMatch> for MatchMode {
    fn from(m: TickerMatch) -> Self {
        match m {
            TickerMatch::Exact => MatchMode::Exact,
            TickerMatch::Contains => MatchMode::Contains,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
        }
    }
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("snapshot.json")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Decimals for money columns
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

fn default_precision() -> usize {
    2
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse from a TOML string (useful for testing).
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).map_err(Error::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let currency = &self.portfolio.base_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::Config(format!(
                "base_currency must be a three-letter uppercase code, got {currency:?}"
            )));
        }
        if self.portfolio.weights_file.as_os_str().is_empty() {
            return Err(Error::Config("weights_file must not be empty".into()));
        }
        if self.market.snapshot.as_os_str().is_empty() {
            return Err(Error::Config("market snapshot path must not be empty".into()));
        }
        if self.output.precision > 8 {
            return Err(Error::Config("output precision must be <= 8".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[portfolio]
base_currency = "EUR"
weights_file = "my_weights.toml"
ticker_match = "contains"

[market]
snapshot = "data/snapshot.json"

[output]
precision = 3
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.portfolio.base_currency, "EUR");
        assert_eq!(config.portfolio.weights_file, PathBuf::from("my_weights.toml"));
        assert_eq!(config.portfolio.ticker_match, TickerMatch::Contains);
        assert_eq!(config.market.snapshot, PathBuf::from("data/snapshot.json"));
        assert_eq!(config.output.precision, 3);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.portfolio.base_currency, "USD");
        assert_eq!(config.portfolio.weights_file, PathBuf::from("weights.toml"));
        assert_eq!(config.portfolio.ticker_match, TickerMatch::Exact);
        assert_eq!(config.market.snapshot, PathBuf::from("snapshot.json"));
        assert_eq!(config.output.precision, 2);
    }

    #[test]
    fn validate_catches_bad_currency() {
        let toml = example_toml().replace("\"EUR\"", "\"euro\"");
        assert!(matches!(Config::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_bad_precision() {
        let toml = example_toml().replace("precision = 3", "precision = 12");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml = "[portfolio]\ninvestment = 100.0\n";
        assert!(matches!(Config::from_toml(toml), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn match_mode_conversion() {
        assert_eq!(MatchMode::from(TickerMatch::Exact), MatchMode::Exact);
        assert_eq!(MatchMode::from(TickerMatch::Contains), MatchMode::Contains);
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn load_or_default_without_file() {
        let config = Config::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.portfolio.base_currency, "USD");
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, example_toml()).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.output.precision, 3);
    }
}
