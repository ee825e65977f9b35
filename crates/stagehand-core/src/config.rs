//! Configuration module
//!
//! Settings for the ledger connection, the object storage backend, presigned URL
//! lifetimes and the expired-session reaper. Values come from the process
//! environment (after loading `.env`), parsed through a lookup function so tests
//! can feed their own values.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PRESIGN_PUT_TTL_SECS: u64 = 15 * 60;
const PRESIGN_GET_TTL_SECS: u64 = 15 * 60;
const SESSION_REAP_INTERVAL_SECS: u64 = 3600;
const SESSION_REAP_BATCH_SIZE: i64 = 100;
/// Longest lifetime S3 accepts for a SigV4 presigned URL (7 days)
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Presigned URL lifetimes
    pub presign_put_ttl_secs: u64,
    pub presign_get_ttl_secs: u64,
    /// Interval in seconds between expired-session sweeps. 0 = disabled.
    pub session_reap_interval_secs: u64,
    pub session_reap_batch_size: i64,
}

/// Parse `key` when present, fall back to `default` when unset.
/// A value that is set but malformed is an error.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let database_url = non_empty(lookup("DATABASE_URL"))
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::S3,
        };

        let config = Config {
            environment,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            local_storage_path: non_empty(lookup("LOCAL_STORAGE_PATH")),
            local_storage_base_url: non_empty(lookup("LOCAL_STORAGE_BASE_URL")),
            presign_put_ttl_secs: parse_or(&lookup, "PRESIGN_PUT_TTL_SECS", PRESIGN_PUT_TTL_SECS)?,
            presign_get_ttl_secs: parse_or(&lookup, "PRESIGN_GET_TTL_SECS", PRESIGN_GET_TTL_SECS)?,
            session_reap_interval_secs: parse_or(
                &lookup,
                "SESSION_REAP_INTERVAL_SECS",
                SESSION_REAP_INTERVAL_SECS,
            )?,
            session_reap_batch_size: parse_or(
                &lookup,
                "SESSION_REAP_BATCH_SIZE",
                SESSION_REAP_BATCH_SIZE,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND is s3"
                    ));
                }
                if self.s3_region().is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND is s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND is local"
                    ));
                }
            }
        }

        if self.presign_put_ttl_secs == 0 || self.presign_get_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGN_PUT_TTL_SECS and PRESIGN_GET_TTL_SECS must be greater than 0"
            ));
        }
        if self.presign_put_ttl_secs > MAX_PRESIGN_TTL_SECS
            || self.presign_get_ttl_secs > MAX_PRESIGN_TTL_SECS
        {
            return Err(anyhow::anyhow!(
                "PRESIGN_PUT_TTL_SECS and PRESIGN_GET_TTL_SECS must be at most {} (7 days)",
                MAX_PRESIGN_TTL_SECS
            ));
        }
        if self.session_reap_batch_size <= 0 {
            return Err(anyhow::anyhow!("SESSION_REAP_BATCH_SIZE must be greater than 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Region for the S3 backend; `S3_REGION` wins over `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn presign_put_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_put_ttl_secs)
    }

    pub fn presign_get_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_get_ttl_secs)
    }

    pub fn session_reap_interval(&self) -> Option<Duration> {
        (self.session_reap_interval_secs > 0)
            .then(|| Duration::from_secs(self.session_reap_interval_secs))
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_seconds)
    }
}
