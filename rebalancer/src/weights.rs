//! Target weights file (weights.toml) loading.
//!
//! ```toml
//! [[tickers]]
//! name = "VWCE"
//! target_weight = 0.8
//!
//! [[tickers]]
//! name = "AGGH"
//! target_weight = 0.2
//! ```

use std::path::Path;

use restonks::{TargetWeight, TargetWeights};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightsFile {
    #[serde(default)]
    tickers: Vec<TickerWeight>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TickerWeight {
    name: String,
    target_weight: f64,
}

/// Load and validate a weights file.
pub fn load(path: &Path) -> Result<TargetWeights> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::WeightsRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    from_toml(&contents)
}

/// Parse from a TOML string (useful for testing).
pub fn from_toml(contents: &str) -> Result<TargetWeights> {
    let file: WeightsFile = toml::from_str(contents).map_err(Error::WeightsParse)?;
    let targets = file
        .tickers
        .into_iter()
        .map(|t| TargetWeight::new(t.name.trim(), t.target_weight))
        .collect();
    Ok(TargetWeights::new(targets)?)
}
