//! Configuration loading for quotegated.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.quotegate/config.toml` (user)
//! 3. `/etc/quotegate/config.toml` (system)
//! 4. Built-in defaults
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.quotegate/secrets.toml` (user, must be 0600)
//! 2. `/etc/quotegate/secrets.toml` (system, must be 0600)
//!
//! Each secret falls back to its environment variable. All three are
//! required; [`Secrets::credentials`] fails otherwise and the daemon refuses
//! to start. Environment variables may also come from a `.env` file in the
//! working directory (see [`load_dotenv`]).

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Credentials;
use crate::{QuotegateError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000).
    #[serde(default = "default_address")]
    pub address: String,
    /// Origins allowed by CORS (default: localhost and localhost:3000).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    super::DEFAULT_CORS_ORIGINS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// Timeout for `health` and `quotes` in seconds; 0 disables it (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Timeout for metrics requests in seconds; 0 disables it (default: 30).
    #[serde(default = "default_timeout")]
    pub metrics_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            timeout_secs: default_timeout(),
            metrics_timeout_secs: default_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }

    pub fn metrics_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.metrics_timeout_secs)
    }
}

fn default_upstream_url() -> String {
    crate::upstream::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Identity provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Identity Toolkit base URL (default: the public Google endpoint).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sign-in timeout in seconds; 0 disables it (default: 5).
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_identity_timeout(),
        }
    }
}

impl IdentityConfig {
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }
}

fn default_identity_timeout() -> u64 {
    crate::auth::DEFAULT_LOGIN_TIMEOUT.as_secs()
}

/// Cache lifetimes.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// TTL for `health` and `quotes` responses (default: 60).
    #[serde(default = "default_response_ttl")]
    pub response_ttl_secs: u64,
    /// TTL for metrics responses (default: 60).
    #[serde(default = "default_response_ttl")]
    pub metrics_ttl_secs: u64,
    /// TTL for the bearer token (default: 3000).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            response_ttl_secs: default_response_ttl(),
            metrics_ttl_secs: default_response_ttl(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_response_ttl() -> u64 {
    60
}

fn default_token_ttl() -> u64 {
    3000
}

/// Identity provider secrets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Environment variable fallbacks for each secret.
pub const API_KEY_ENV: &str = "FIREBASE_API_KEY";
pub const EMAIL_ENV: &str = "FIREBASE_USER_EMAIL";
pub const PASSWORD_ENV: &str = "FIREBASE_USER_PASSWORD";

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.quotegate/config.toml`
    /// 3. `/etc/quotegate/config.toml`
    /// 4. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            QuotegateError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            QuotegateError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `None` means use defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(QuotegateError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".quotegate").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/quotegate/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.quotegate/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/quotegate/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (env vars are used instead).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".quotegate").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/quotegate/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load secrets from a specific file, enforcing permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            QuotegateError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        // The parse error is not included: it may echo secret values.
        toml::from_str(&content).map_err(|_| {
            QuotegateError::Configuration(format!("Failed to parse secrets file {path:?}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            QuotegateError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(QuotegateError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Resolve the identity provider credentials, falling back to the
    /// `FIREBASE_*` environment variables.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    fn credentials_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let resolve = |from_file: &Option<String>, env_var: &str| {
            from_file
                .clone()
                .or_else(|| env(env_var))
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    QuotegateError::Configuration(format!(
                        "missing identity provider secret: set {env_var} or add it to secrets.toml"
                    ))
                })
        };

        Ok(Credentials::new(
            resolve(&self.api_key, API_KEY_ENV)?,
            resolve(&self.email, EMAIL_ENV)?,
            resolve(&self.password, PASSWORD_ENV)?,
        ))
    }
}

/// Load `.env` from the working directory, if present.
///
/// Variables already set in the process environment win. Returns the path
/// that was loaded.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(QuotegateError::Configuration(format!(
            "Failed to load .env file: {e}"
        ))),
    }
}

/// Load a specific env file. A missing file is not an error.
pub fn load_dotenv_from(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        // The parse error is not included: it may echo secret values.
        Err(_) => Err(QuotegateError::Configuration(format!(
            "Failed to parse env file {path:?}"
        ))),
    }
}
