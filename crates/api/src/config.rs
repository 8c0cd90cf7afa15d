use std::str::FromStr;
use std::time::Duration;

use vidfeed_core::ingestion::DEFAULT_POLL_INTERVAL_MS;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT validation configuration.
    pub jwt: JwtConfig,
    /// Ingestion and image-host collaborators.
    pub ingest: IngestConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            ingest: IngestConfig::from_env(),
        }
    }
}

/// Default ingestion service base URL.
pub const DEFAULT_INGEST_API_URL: &str = "https://api.aurahub.fun";

/// Default image-host upload endpoint.
pub const DEFAULT_IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";

/// Settings for the ingestion collaborator, remote job supervision and
/// thumbnail hosting.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_url: String,
    pub poll_interval_ms: u64,
    /// Overall deadline for one remote job, from submission to terminal state.
    pub job_timeout_secs: u64,
    /// Consecutive failed polls after which a job is abandoned.
    pub max_poll_failures: u32,
    pub image_host_url: String,
    /// `None` disables thumbnail uploads.
    pub image_host_api_key: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_INGEST_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            job_timeout_secs: 3600,
            max_poll_failures: 5,
            image_host_url: DEFAULT_IMAGE_HOST_URL.to_string(),
            image_host_api_key: None,
        }
    }
}

impl IngestConfig {
    /// Load from the environment.
    ///
    /// | Env Var                        | Default                          |
    /// |--------------------------------|----------------------------------|
    /// | `INGEST_API_URL`               | `https://api.aurahub.fun`        |
    /// | `INGEST_POLL_INTERVAL_MS`      | `5000`                           |
    /// | `REMOTE_JOB_TIMEOUT_SECS`      | `3600`                           |
    /// | `REMOTE_JOB_MAX_POLL_FAILURES` | `5`                              |
    /// | `IMAGE_HOST_URL`               | `https://api.imgbb.com/1/upload` |
    /// | `IMAGE_HOST_API_KEY`           | unset (thumbnails disabled)      |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("INGEST_API_URL").unwrap_or(defaults.api_url),
            poll_interval_ms: env_or("INGEST_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            job_timeout_secs: env_or("REMOTE_JOB_TIMEOUT_SECS", defaults.job_timeout_secs),
            max_poll_failures: env_or("REMOTE_JOB_MAX_POLL_FAILURES", defaults.max_poll_failures),
            image_host_url: std::env::var("IMAGE_HOST_URL").unwrap_or(defaults.image_host_url),
            image_host_api_key: std::env::var("IMAGE_HOST_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

/// Read and parse `key`, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse; misconfiguration
/// fails fast at startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.api_url, DEFAULT_INGEST_API_URL);
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
        assert_eq!(config.job_timeout(), Duration::from_secs(3600));
        assert_eq!(config.max_poll_failures, 5);
        assert!(config.image_host_api_key.is_none());
    }

    #[test]
    fn zero_poll_interval_is_raised() {
        let config = IngestConfig {
            poll_interval_ms: 0,
            ..IngestConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn env_or_uses_default_when_unset() {
        let value: u64 = env_or("VIDFEED_TEST_SURELY_UNSET_VARIABLE", 17);
        assert_eq!(value, 17);
    }
}
