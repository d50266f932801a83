//! Target weight sources: a fixed table from the config, or a JSON file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use pvdot::WeightMap;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::{Config, WeightSourceKind};
use crate::error::{Error, Result};

/// Supplies target weights once per tick.
pub trait WeightSource {
    fn target_weights(&mut self) -> Result<WeightMap>;
}

/// Check a weight table against the configured currencies.
///
/// Weights must be non-negative, not all zero, and keyed by `allowed`
/// currencies only.
pub fn check_weights(
    weights: &WeightMap,
    allowed: &[String],
) -> std::result::Result<(), String> {
    if weights.is_empty() {
        return Err("no weights given".into());
    }
    for (currency, weight) in weights {
        if !allowed.contains(currency) {
            return Err(format!("{currency} is not a configured currency"));
        }
        if *weight < Decimal::ZERO {
            return Err(format!("weight for {currency} ({weight}) is negative"));
        }
    }
    if weights.values().all(|w| w.is_zero()) {
        return Err("all weights are zero".into());
    }
    Ok(())
}

/// Weights fixed at startup.
#[derive(Debug, Clone)]
pub struct FixedWeights {
    weights: WeightMap,
}

impl FixedWeights {
    pub fn new(weights: WeightMap) -> Self {
        Self { weights }
    }
}

impl WeightSource for FixedWeights {
    fn target_weights(&mut self) -> Result<WeightMap> {
        Ok(self.weights.clone())
    }
}

/// Contents of a target weight file.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    pub timestamp: DateTime<Utc>,
    pub weights: WeightMap,
}

impl TargetSpec {
    /// Load and validate a target JSON file.
    pub fn load(path: &Path, allowed: &[String]) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::TargetRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents, allowed)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str, allowed: &[String]) -> Result<Self> {
        let spec: TargetSpec = serde_json::from_str(json)?;
        check_weights(&spec.weights, allowed).map_err(Error::Target)?;
        Ok(spec)
    }
}

/// Weights read from a JSON file on every tick, so an external model can
/// update them between ticks.
#[derive(Debug, Clone)]
pub struct TargetFile {
    path: PathBuf,
    allowed: Vec<String>,
}

impl TargetFile {
    pub fn new(path: impl Into<PathBuf>, allowed: Vec<String>) -> Self {
        Self {
            path: path.into(),
            allowed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WeightSource for TargetFile {
    fn target_weights(&mut self) -> Result<WeightMap> {
        let spec = TargetSpec::load(&self.path, &self.allowed)?;
        debug!(
            "loaded target weights from {} (timestamp {})",
            self.path.display(),
            spec.timestamp
        );
        Ok(spec.weights)
    }
}

/// Build the weight source named by the config.
pub fn from_config(config: &Config) -> Result<Box<dyn WeightSource>> {
    match config.weights.source {
        WeightSourceKind::Fixed => Ok(Box::new(FixedWeights::new(config.fixed_weights()))),
        WeightSourceKind::File => {
            let path = config
                .weights
                .path
                .clone()
                .ok_or_else(|| Error::Config("weights.path is not set".into()))?;
            Ok(Box::new(TargetFile::new(path, config.currencies())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn allowed() -> Vec<String> {
        vec!["USDT".into(), "BTC".into(), "ETH".into()]
    }

    fn valid_json() -> &'static str {
        r#"{
            "timestamp": "2026-02-08T15:30:00Z",
            "weights": { "BTC": "0.5", "ETH": "0.3", "USDT": "0.2" }
        }"#
    }

    #[test]
    fn parse_valid_target() {
        let spec = TargetSpec::from_json(valid_json(), &allowed()).unwrap();
        assert_eq!(spec.weights.len(), 3);
        assert_eq!(spec.weights["BTC"], dec!(0.5));
        assert_eq!(spec.timestamp.to_rfc3339(), "2026-02-08T15:30:00+00:00");
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","weights":{"BTC":"2","ETH":"2"}}"#;
        assert!(TargetSpec::from_json(json, &allowed()).is_ok());
    }

    #[test]
    fn reject_empty_weights() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","weights":{}}"#;
        assert!(matches!(
            TargetSpec::from_json(json, &allowed()),
            Err(Error::Target(_))
        ));
    }

    #[test]
    fn reject_negative_weight() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","weights":{"BTC":"-0.1","USDT":"1"}}"#;
        assert!(TargetSpec::from_json(json, &allowed()).is_err());
    }

    #[test]
    fn reject_all_zero() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","weights":{"BTC":"0","USDT":"0"}}"#;
        assert!(TargetSpec::from_json(json, &allowed()).is_err());
    }

    #[test]
    fn reject_unknown_currency() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","weights":{"DOGE":"1"}}"#;
        let err = TargetSpec::from_json(json, &allowed()).unwrap_err();
        assert!(err.to_string().contains("DOGE"));
    }

    #[test]
    fn reject_malformed_json() {
        assert!(matches!(
            TargetSpec::from_json("{", &allowed()),
            Err(Error::TargetParse(_))
        ));
    }

    #[test]
    fn fixed_weights_repeat() {
        let mut source = FixedWeights::new(WeightMap::from([("BTC".into(), dec!(1))]));
        assert_eq!(source.target_weights().unwrap(), source.target_weights().unwrap());
    }

    #[test]
    fn target_file_rereads_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.json");
        std::fs::write(&path, valid_json()).unwrap();

        let mut source = TargetFile::new(&path, allowed());
        assert_eq!(source.target_weights().unwrap()["BTC"], dec!(0.5));

        std::fs::write(
            &path,
            r#"{"timestamp":"2026-02-09T00:00:00Z","weights":{"BTC":"0.1","USDT":"0.9"}}"#,
        )
        .unwrap();
        let weights = source.target_weights().unwrap();
        assert_eq!(weights["BTC"], dec!(0.1));
        assert!(!weights.contains_key("ETH"));
    }

    #[test]
    fn missing_target_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = TargetFile::new(dir.path().join("absent.json"), allowed());
        let err = source.target_weights().unwrap_err();
        assert!(matches!(err, Error::TargetRead { .. }));
        assert!(err.is_tick_fatal());
    }
}
