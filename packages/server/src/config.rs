//! Externally-owned gateway configuration.
//!
//! Every field has a default so the server can run without a config file;
//! an optional JSON file (via `--config`) replaces the defaults wholesale.
//! The message-type role mapping seeded here can later be replaced at
//! runtime through the administrative API.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{DomainError, LimiterMode, PolicyTables, RateLimitQuota, Role};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid role in config: {0}")]
    InvalidRole(#[from] DomainError),
}

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Global admission bound
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Channel-name prefix -> required role (e.g. {"admin_": "admin"})
    #[serde(default = "default_channel_role_prefixes")]
    pub channel_role_prefixes: HashMap<String, String>,

    /// Message type -> required role; runtime-overridable via the admin API
    #[serde(default = "default_message_type_required_roles")]
    pub message_type_required_roles: HashMap<String, String>,

    /// Quota applied to gateway (WebSocket) traffic
    #[serde(default = "default_gateway_rate_limit")]
    pub gateway_rate_limit: RateLimitQuota,

    /// Quota applied to general API traffic; never shares counters with
    /// gateway traffic
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: RateLimitQuota,

    /// Process-wide limiter mode
    #[serde(default = "default_rate_limit_mode")]
    pub rate_limit_mode: LimiterMode,

    /// Bypass flag; ignored in production mode
    #[serde(default)]
    pub rate_limit_bypass: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            channel_role_prefixes: default_channel_role_prefixes(),
            message_type_required_roles: default_message_type_required_roles(),
            gateway_rate_limit: default_gateway_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            rate_limit_mode: default_rate_limit_mode(),
            rate_limit_bypass: false,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Convert the configured role mappings into policy tables.
    pub fn policy_tables(&self) -> Result<PolicyTables, ConfigError> {
        let mut message_types = HashMap::with_capacity(self.message_type_required_roles.len());
        for (message_type, role) in &self.message_type_required_roles {
            message_types.insert(message_type.clone(), Role::new(role.clone())?);
        }

        let mut prefixes = HashMap::with_capacity(self.channel_role_prefixes.len());
        for (prefix, role) in &self.channel_role_prefixes {
            prefixes.insert(prefix.clone(), Role::new(role.clone())?);
        }

        Ok(PolicyTables::new(message_types, prefixes))
    }
}

fn default_max_connections() -> usize {
    1000
}

fn default_channel_role_prefixes() -> HashMap<String, String> {
    let mut prefixes = HashMap::new();
    prefixes.insert("admin_".to_string(), "admin".to_string());
    prefixes.insert("teacher_".to_string(), "teacher".to_string());
    prefixes
}

fn default_message_type_required_roles() -> HashMap<String, String> {
    let mut roles = HashMap::new();
    roles.insert("broadcast".to_string(), "teacher".to_string());
    roles
}

fn default_gateway_rate_limit() -> RateLimitQuota {
    RateLimitQuota {
        max_requests: 30,
        window_seconds: 60,
    }
}

fn default_api_rate_limit() -> RateLimitQuota {
    RateLimitQuota {
        max_requests: 100,
        window_seconds: 60,
    }
}

fn default_rate_limit_mode() -> LimiterMode {
    LimiterMode::Production
}
