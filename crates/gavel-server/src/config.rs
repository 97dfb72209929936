// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Gateway configuration: compiled-in defaults, overridden by an optional
//! TOML file, overridden in turn by environment variables.
//!
//! Unlike this codebase's other daemon binary, which namespaces every
//! setting under a single `PALM_` prefix via `config::Environment`, the
//! gateway's environment variable names are part of its external contract
//! (`DATABASE_URL`, `HUMAN_API_KEY`, ...) and carry no common prefix. A
//! generic prefixed source can't produce that mapping, so each variable is
//! read and applied explicitly after the `config` crate has assembled the
//! defaults/file layers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gavel_sandbox::SandboxConfig;

/// Top-level settings for the `gavel-server` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub human_api_key: String,
    pub approval_ttl_seconds: i64,
    pub identities_path: String,
    /// Address the dashboard/UI (out of scope for this crate) would proxy
    /// requests through. Carried for contract completeness only.
    pub gateway_url: Option<String>,
    pub blast_box: SandboxConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".into(),
            database_url: "sqlite://gavel.db".into(),
            human_api_key: String::new(),
            approval_ttl_seconds: 3600,
            identities_path: "identities.json".into(),
            gateway_url: None,
            blast_box: SandboxConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as TOML: {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    ParseField { field: String, reason: String },

    #[error("{field} out of range: {reason}")]
    InvalidRange { field: String, reason: String },
}

impl GatewayConfig {
    /// Load configuration: defaults, then an optional TOML file at `path`
    /// (silently skipped if it doesn't exist), then environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = path {
            if Path::new(path).exists() {
                config = Self::from_toml_file(path)?;
            }
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::TomlParse {
            path: path.to_string(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("GAVEL_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Ok(v) = std::env::var("HUMAN_API_KEY") {
            self.human_api_key = v;
        }
        if let Ok(v) = std::env::var("APPROVAL_TTL_SECONDS") {
            self.approval_ttl_seconds = parse_field("APPROVAL_TTL_SECONDS", &v)?;
        }
        if let Ok(v) = std::env::var("IDENTITIES_PATH") {
            self.identities_path = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_URL") {
            self.gateway_url = Some(v);
        }
        if let Ok(v) = std::env::var("BLAST_BOX_IMAGE") {
            self.blast_box.image = v;
        }
        if let Ok(v) = std::env::var("BLAST_BOX_MEMORY") {
            self.blast_box.memory_limit = v;
        }
        if let Ok(v) = std::env::var("BLAST_BOX_CPUS") {
            self.blast_box.cpu_limit = v;
        }
        if let Ok(v) = std::env::var("BLAST_BOX_TIMEOUT_SECONDS") {
            self.blast_box.timeout_seconds = parse_field("BLAST_BOX_TIMEOUT_SECONDS", &v)?;
        }
        if let Ok(v) = std::env::var("BLAST_BOX_WORKSPACE") {
            self.blast_box.workspace = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.approval_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidRange {
                field: "approval_ttl_seconds".into(),
                reason: "must be positive".into(),
            });
        }
        if self.blast_box.timeout_seconds == 0 {
            return Err(ConfigError::InvalidRange {
                field: "blast_box.timeout_seconds".into(),
                reason: "must be positive".into(),
            });
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::ParseField {
                field: "listen_addr".into(),
                reason: format!("{:?} is not a valid socket address", self.listen_addr),
            });
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::ParseField {
        field: field.to_string(),
        reason: format!("{value:?} could not be parsed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = GatewayConfig::default();
        assert_eq!(config.approval_ttl_seconds, 3600);
        assert_eq!(config.blast_box.timeout_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let mut config = GatewayConfig::default();
        config.approval_ttl_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn rejects_unparseable_listen_addr() {
        let mut config = GatewayConfig::default();
        config.listen_addr = "not-an-address".into();
        assert!(matches!(config.validate(), Err(ConfigError::ParseField { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = GatewayConfig::load(Some("/nonexistent/gavel.toml")).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }
}
