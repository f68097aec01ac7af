use lectern_core::lifecycle::engine::DEFAULT_MAX_VERSION_RETRIES;
use lectern_core::lifecycle::LifecycleConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background services get to drain after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Transition engine tuning.
    pub lifecycle: LifecycleConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `LIFECYCLE_VERSION_RETRIES` | `3`                     |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let max_version_retries: u32 = std::env::var("LIFECYCLE_VERSION_RETRIES")
            .unwrap_or_else(|_| DEFAULT_MAX_VERSION_RETRIES.to_string())
            .parse()
            .expect("LIFECYCLE_VERSION_RETRIES must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            lifecycle: LifecycleConfig {
                max_version_retries,
            },
        }
    }
}
