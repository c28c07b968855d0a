// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into an
//! immutable [`Config`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATABASE_URL` | Path to the embedded token database file | Required |
//! | `RPC_URL` | Chain RPC endpoint | Required |
//! | `PRIVATE_KEY` | Hex-encoded signing key | Required |
//! | `CONTRACT_ADDRESS` | Deployed soulbound token contract | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CONFIRMATION_TIMEOUT_SECS` | Per-request confirmation wait | `120` |
//! | `RECONCILE_INTERVAL_SECS` | Reconciler sweep interval | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "CONFIRMATION_TIMEOUT_SECS";
pub const RECONCILE_INTERVAL_ENV: &str = "RECONCILE_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid {
        var: &'static str,
        message: String,
    },
}

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the embedded token database file
    pub database_path: PathBuf,
    /// Chain RPC endpoint URL
    pub rpc_url: String,
    /// Hex-encoded signing key
    pub private_key: String,
    /// Deployed contract address
    pub contract_address: String,
    /// Server bind address
    pub host: String,
    /// Server bind port
    pub port: u16,
    /// How long an issue/transfer request waits for chain confirmation
    pub confirmation_timeout: Duration,
    /// Interval between reconciliation sweeps
    pub reconcile_interval: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through a lookup function (testable seam).
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: PORT_ENV,
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let secs = |var: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match lookup(var) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::Invalid {
                        var,
                        message: e.to_string(),
                    }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        Ok(Self {
            database_path: PathBuf::from(required(DATABASE_URL_ENV)?),
            rpc_url: required(RPC_URL_ENV)?,
            private_key: required(PRIVATE_KEY_ENV)?,
            contract_address: required(CONTRACT_ADDRESS_ENV)?,
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            confirmation_timeout: secs(
                CONFIRMATION_TIMEOUT_ENV,
                DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            )?,
            reconcile_interval: secs(RECONCILE_INTERVAL_ENV, DEFAULT_RECONCILE_INTERVAL_SECS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            (DATABASE_URL_ENV, "/data/tokens.redb"),
            (RPC_URL_ENV, "http://localhost:8545"),
            (PRIVATE_KEY_ENV, "deadbeef"),
            (CONTRACT_ADDRESS_ENV, "0x5425890298aed601595a70AB815c96711a31Bc65"),
        ])
    }

    #[test]
    fn loads_with_defaults() {
        let vars = base_env();
        let config = Config::from_lookup(|var| vars.get(var).cloned()).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.reconcile_interval, Duration::from_secs(30));
    }

    #[test]
    fn missing_required_variable_errors() {
        let mut vars = base_env();
        vars.remove(RPC_URL_ENV);

        let err = Config::from_lookup(|var| vars.get(var).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(RPC_URL_ENV)));
    }

    #[test]
    fn invalid_port_errors() {
        let mut vars = base_env();
        vars.insert(PORT_ENV.to_string(), "not-a-port".to_string());

        let err = Config::from_lookup(|var| vars.get(var).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: PORT_ENV, .. }));
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = base_env();
        vars.insert(CONFIRMATION_TIMEOUT_ENV.to_string(), "5".to_string());
        vars.insert(PORT_ENV.to_string(), "9090".to_string());

        let config = Config::from_lookup(|var| vars.get(var).cloned()).unwrap();
        assert_eq!(config.confirmation_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 9090);
    }
}
