// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const ENV_VAR_JWT_SECRET: &str = "LECTERN_JWT_SECRET";
pub const ENV_VAR_DATABASE_URL: &str = "LECTERN_DATABASE_URL";
pub const ENV_VAR_REDIS_URL: &str = "LECTERN_REDIS_URL";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Root of the YAML configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub cache: CacheBackendConfig,
    pub auth: AuthConfig,
    pub audit: AuditLogConfig,
}

impl ServerConfig {
    pub fn load(maybe_path: Option<&Path>) -> Result<Self, LoadConfigError> {
        let Some(path) = maybe_path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| LoadConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, LoadConfigError> {
        // An empty file is a valid config with all defaults
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(contents)?)
    }

    /// Secrets and connection strings may come from the environment. They win
    /// over the file.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(jwt_secret) = non_empty(ENV_VAR_JWT_SECRET) {
            self.auth.jwt_secret = Some(jwt_secret);
        }
        if let Some(database_url) = non_empty(ENV_VAR_DATABASE_URL) {
            self.database.url = Some(database_url);
        }
        if let Some(redis_url) = non_empty(ENV_VAR_REDIS_URL) {
            self.cache.redis_url = Some(redis_url);
            self.cache.backend = CacheBackendKind::Redis;
        }

        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Http
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct HttpConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Quota shared by every route of the server, per source address
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            rate_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub limit: u64,
    pub window: DurationString,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Database
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    /// Postgres connection string. In-memory repositories are used without it.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: DurationString,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout: DurationString::from(Duration::from_secs(5)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Cache
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheBackendKind {
    None,
    #[default]
    InMemory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct CacheBackendConfig {
    pub backend: CacheBackendKind,
    pub redis_url: Option<String>,
    /// Bound of a single cache round-trip
    pub operation_timeout: DurationString,
    pub connection_timeout: DurationString,
}

impl Default for CacheBackendConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            redis_url: None,
            operation_timeout: DurationString::from(
                lectern_cache::DEFAULT_CACHE_OPERATION_TIMEOUT,
            ),
            connection_timeout: DurationString::from(Duration::from_secs(5)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Auth
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// Random per process when not set
    pub jwt_secret: Option<String>,
    pub access_token_lifetime: DurationString,
    pub nonce_ttl: DurationString,
    pub nonce_sweep_interval: DurationString,
    pub expected_domain: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_lifetime: DurationString::from(Duration::from_secs(
                7 * 24 * 60 * 60,
            )),
            nonce_ttl: DurationString::from(Duration::from_secs(10 * 60)),
            nonce_sweep_interval: DurationString::from(Duration::from_secs(5 * 60)),
            expected_domain: None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("nonce_ttl", &self.nonce_ttl)
            .field("nonce_sweep_interval", &self.nonce_sweep_interval)
            .field("expected_domain", &self.expected_domain)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Audit
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct AuditLogConfig {
    pub queue_capacity: usize,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            queue_capacity: lectern_audit::DEFAULT_AUDIT_QUEUE_CAPACITY,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum LoadConfigError {
    #[error("Unable to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
