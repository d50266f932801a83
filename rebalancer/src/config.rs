//! TOML configuration loading and validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pvdot::{EngineConfig, WeightMap};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::target::check_weights;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    pub strategy: StrategyConfig,
    pub weights: WeightsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_true")]
    pub testnet: bool,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            testnet: true,
            api_key_env: default_api_key_env(),
            secret_key_env: default_secret_key_env(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_api_key_env() -> String {
    "BINANCE_API_KEY".into()
}
fn default_secret_key_env() -> String {
    "BINANCE_SECRET_KEY".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub interval: Interval,
    #[serde(default = "default_window")]
    pub window: usize,
    pub base_currency: String,
    pub quote_currencies: Vec<String>,
    #[serde(default)]
    pub threshold: Decimal,
    #[serde(default)]
    pub ignore_locked: bool,
    /// Max notional per order in base currency; zero means unbounded.
    #[serde(default)]
    pub max_amount: Decimal,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub verbose: bool,
}

fn default_window() -> usize {
    7
}

/// Where target weights come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSourceKind {
    /// The `[weights.fixed]` table.
    #[default]
    Fixed,
    /// A JSON target file, re-read on every tick.
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default)]
    pub source: WeightSourceKind,
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub fixed: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
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

    /// Parse and validate from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let s = &self.strategy;
        if s.threshold < Decimal::ZERO {
            return Err(Error::Config("threshold should not be less than 0".into()));
        }
        if s.max_amount < Decimal::ZERO {
            return Err(Error::Config("max_amount should not be less than 0".into()));
        }
        if s.window == 0 {
            return Err(Error::Config("window must be > 0".into()));
        }
        if s.base_currency.is_empty() {
            return Err(Error::Config("base_currency must not be empty".into()));
        }
        if s.quote_currencies.is_empty() {
            return Err(Error::Config("quote_currencies must not be empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for c in &s.quote_currencies {
            if c.is_empty() {
                return Err(Error::Config("empty quote currency".into()));
            }
            if *c == s.base_currency {
                return Err(Error::Config(format!(
                    "quote currency {c} is the base currency"
                )));
            }
            if !seen.insert(c) {
                return Err(Error::Config(format!("duplicate quote currency: {c}")));
            }
        }

        match self.weights.source {
            WeightSourceKind::Fixed => {
                check_weights(&self.weights.fixed, &self.currencies())
                    .map_err(|e| Error::Config(format!("[weights.fixed]: {e}")))?;
            }
            WeightSourceKind::File => {
                if self.weights.path.is_none() {
                    return Err(Error::Config(
                        "weights.path is required when source = \"file\"".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Decision parameters for the engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.strategy.base_currency)
            .with_threshold(self.strategy.threshold)
            .with_ignore_locked(self.strategy.ignore_locked)
            .with_max_amount(self.strategy.max_amount)
    }

    /// Base currency followed by every quote currency.
    pub fn currencies(&self) -> Vec<String> {
        let mut currencies = vec![self.strategy.base_currency.clone()];
        currencies.extend(self.strategy.quote_currencies.iter().cloned());
        currencies
    }

    /// Trading pair of every quote currency against the base, e.g. `BTCUSDT`.
    pub fn symbols(&self) -> Vec<String> {
        self.strategy
            .quote_currencies
            .iter()
            .map(|c| pvdot::pair_symbol(c, &self.strategy.base_currency))
            .collect()
    }

    /// Fixed target weights, as a weight map.
    pub fn fixed_weights(&self) -> WeightMap {
        self.weights.fixed.clone()
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn example_toml() -> &'static str {
        r#"
[exchange]
testnet = true

[strategy]
interval = "1h"
window = 7
base_currency = "USDT"
quote_currencies = ["BTC", "ETH"]
threshold = "0.05"
ignore_locked = false
max_amount = "1000"
dry_run = false

[weights]
source = "fixed"

[weights.fixed]
BTC = "0.4"
ETH = "0.3"
USDT = "0.3"

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.strategy.interval, Interval::H1);
        assert_eq!(config.strategy.window, 7);
        assert_eq!(config.strategy.threshold, dec!(0.05));
        assert_eq!(config.strategy.max_amount, dec!(1000));
        assert_eq!(config.weights.source, WeightSourceKind::Fixed);
        assert_eq!(config.fixed_weights()["BTC"], dec!(0.4));
        assert_eq!(config.exchange.api_key_env, "BINANCE_API_KEY");
    }

    #[test]
    fn defaults_for_optional_sections() {
        let toml = r#"
[strategy]
interval = "15m"
base_currency = "USDT"
quote_currencies = ["BTC"]

[weights]
fixed = { BTC = "1" }
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.strategy.threshold, Decimal::ZERO);
        assert_eq!(config.strategy.max_amount, Decimal::ZERO);
        assert!(!config.strategy.dry_run);
        assert!(config.exchange.testnet);
        assert_eq!(config.logging.audit_file, "audit.jsonl");
    }

    #[test]
    fn validate_catches_negative_threshold() {
        let mut config = parse(example_toml());
        config.strategy.threshold = dec!(-0.01);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_negative_max_amount() {
        let mut config = parse(example_toml());
        config.strategy.max_amount = dec!(-5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_base_in_quotes() {
        let mut config = parse(example_toml());
        config.strategy.quote_currencies.push("USDT".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_duplicate_quote() {
        let mut config = parse(example_toml());
        config.strategy.quote_currencies.push("BTC".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_unknown_fixed_weight() {
        let mut config = parse(example_toml());
        config.weights.fixed.insert("DOGE".into(), dec!(0.1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_path_for_file_source() {
        let mut config = parse(example_toml());
        config.weights.source = WeightSourceKind::File;
        assert!(config.validate().is_err());
        config.weights.path = Some("target.json".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn engine_config_mirrors_strategy() {
        let config = parse(example_toml());
        let engine = config.engine_config();
        assert_eq!(engine.base_currency, "USDT");
        assert_eq!(engine.threshold, dec!(0.05));
        assert_eq!(engine.max_amount, dec!(1000));
        assert!(!engine.ignore_locked);
    }

    #[test]
    fn symbols_are_quote_plus_base() {
        let config = parse(example_toml());
        assert_eq!(config.symbols(), vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.currencies(), vec!["USDT", "BTC", "ETH"]);
    }

    #[test]
    fn audit_path() {
        let config = parse(example_toml());
        assert_eq!(config.audit_path(), PathBuf::from("./logs/audit.jsonl"));
    }
}
