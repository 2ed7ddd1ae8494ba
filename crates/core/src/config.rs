use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_SCHEMA: &str = "reports";
pub const DEFAULT_REMOVAL_BATCH_SIZE: usize = 500;
pub const DEFAULT_UPDATE_BATCH_SIZE: usize = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_required(profile: &str, key: &str) -> Result<String, ConfigError> {
    profiled_env_opt(profile, key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DprConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub redshift: RedshiftConfig,
    pub expiry: ExpiryConfig,
}

impl DprConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DPR_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_opt("DPR_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let config = Self {
            profile: p.to_string(),
            redshift: RedshiftConfig::from_env_profiled(p)?,
            expiry: ExpiryConfig::from_env_profiled(p)?,
        };
        config.expiry.validate()?;
        Ok(config)
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  redshift:  region={}, cluster={}, database={}, poll_interval_ms={}",
            self.redshift.region,
            self.redshift.cluster_id,
            self.redshift.database,
            self.redshift.poll_interval_ms
        );
        tracing::info!(
            "  expiry:    schema={}, expiry_seconds={}, removal_batch={}, update_batch={}",
            self.expiry.schema,
            self.expiry.expiry_seconds,
            self.expiry.removal_batch_size,
            self.expiry.update_batch_size
        );
    }
}

// ── Redshift ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedshiftConfig {
    pub region: String,
    pub cluster_id: String,
    pub database: String,
    /// Secrets Manager ARN holding the database credentials.
    pub secret_arn: String,
    pub poll_interval_ms: u64,
}

impl RedshiftConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            region: profiled_env_or(p, "AWS_REGION", DEFAULT_REGION),
            cluster_id: profiled_env_required(p, "CLUSTER_ID")?,
            database: profiled_env_required(p, "DB_NAME")?,
            secret_arn: profiled_env_required(p, "CREDENTIAL_SECRET_ARN")?,
            poll_interval_ms: profiled_env_u64(p, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
        })
    }
}

// ── Expiry ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryConfig {
    /// External schema whose tables are reconciled.
    pub schema: String,
    /// Age in seconds after which a table definition is removed.
    pub expiry_seconds: u64,
    pub removal_batch_size: usize,
    pub update_batch_size: usize,
}

impl ExpiryConfig {
    /// Config with the default schema and batch sizes.
    pub fn with_expiry(expiry_seconds: u64) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            expiry_seconds,
            removal_batch_size: DEFAULT_REMOVAL_BATCH_SIZE,
            update_batch_size: DEFAULT_UPDATE_BATCH_SIZE,
        }
    }

    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        let raw_expiry = profiled_env_required(p, "EXPIRY_SECONDS")?;
        let expiry_seconds = raw_expiry.parse().map_err(|_| ConfigError::Invalid {
            key: "EXPIRY_SECONDS".to_string(),
            value: raw_expiry.clone(),
        })?;

        Ok(Self {
            schema: profiled_env_or(p, "EXTERNAL_SCHEMA", DEFAULT_SCHEMA),
            expiry_seconds,
            removal_batch_size: profiled_env_usize(
                p,
                "REMOVAL_BATCH_SIZE",
                DEFAULT_REMOVAL_BATCH_SIZE,
            ),
            update_batch_size: profiled_env_usize(
                p,
                "UPDATE_BATCH_SIZE",
                DEFAULT_UPDATE_BATCH_SIZE,
            ),
        })
    }

    /// Reject settings that would produce empty batches or unqualified SQL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.is_empty() {
            return Err(ConfigError::Invalid {
                key: "EXTERNAL_SCHEMA".to_string(),
                value: self.schema.clone(),
            });
        }
        if self.removal_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "REMOVAL_BATCH_SIZE".to_string(),
                value: "0".to_string(),
            });
        }
        if self.update_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "UPDATE_BATCH_SIZE".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
