//! Error types for the rebalancer.

use std::path::PathBuf;

use pvdot_exchange::ExchangeError;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("target file error: {0}")]
    Target(String),

    #[error("failed to read target file {path}: {source}")]
    TargetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse target JSON: {0}")]
    TargetParse(#[from] serde_json::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Engine(#[from] pvdot::Error),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// True for errors that abort a single tick but leave the process usable.
    pub fn is_tick_fatal(&self) -> bool {
        matches!(
            self,
            Error::Engine(_)
                | Error::Exchange(_)
                | Error::Target(_)
                | Error::TargetRead { .. }
                | Error::TargetParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
