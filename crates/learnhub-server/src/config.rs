use learnhub_auth::AuthConfig;
use learnhub_catalog::CacheConfig;
use learnhub_kv::RedisConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Credential secrets, lifetimes, rotation policy and cookies
    #[serde(default)]
    pub auth: AuthConfig,
    /// Shared key-value store (sessions and catalog cache)
    #[serde(default)]
    pub redis: RedisConfig,
    /// Catalog cache and invalidation settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Scheduled cleanup of old records
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Initial admin account
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.auth.validate().map_err(|e| e.to_string())?;
        if self.cache.invalidation.max_attempts == 0 {
            return Err("cache.invalidation.max_attempts must be > 0".into());
        }
        if self.cache.reconciliation.enabled {
            if self.cache.reconciliation.interval.is_zero() {
                return Err("cache.reconciliation.interval must be > 0".into());
            }
            if self.cache.reconciliation.batch_size == 0 {
                return Err("cache.reconciliation.batch_size must be > 0".into());
            }
        }
        if self.cleanup.enabled && self.cleanup.interval.is_zero() {
            return Err("cleanup.interval must be > 0".into());
        }
        if let Some(admin) = &self.bootstrap.admin_user
            && (admin.email.trim().is_empty() || admin.password.is_empty())
        {
            return Err("bootstrap.admin_user requires email and password".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Scheduled cleanup settings.
///
/// ```toml
/// [cleanup]
/// interval = "24h"
/// retention = "30d"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    /// Time between runs.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Read notifications older than this are deleted.
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(24 * 3600),
            retention: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

/// Bootstrap configuration.
///
/// Prefer environment variables for the password:
/// - LEARNHUB__BOOTSTRAP__ADMIN_USER__EMAIL
/// - LEARNHUB__BOOTSTRAP__ADMIN_USER__PASSWORD
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    /// Creates an admin account on startup if no account uses this email.
    #[serde(default)]
    pub admin_user: Option<AdminUserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
    /// Plain text, hashed before it is stored.
    pub password: String,
}

fn default_admin_name() -> String {
    "Administrator".into()
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default file name looked up in the working directory.
    pub const DEFAULT_CONFIG_PATH: &str = "learnhub.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., LEARNHUB__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("LEARNHUB")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.access_token_secret = "access-secret".into();
        cfg.auth.refresh_token_secret = "refresh-secret".into();
        cfg
    }

    #[test]
    fn test_defaults_need_secrets() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("access_token_secret"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_rejects_port_zero() {
        let mut cfg = valid();
        cfg.server.port = 0;
        assert!(cfg.validate().unwrap_err().contains("server.port"));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut cfg = valid();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_rejects_zero_retry_attempts() {
        let mut cfg = valid();
        cfg.cache.invalidation.max_attempts = 0;
        assert!(cfg.validate().unwrap_err().contains("max_attempts"));
    }

    #[test]
    fn test_rejects_access_lifetime_not_shorter() {
        let mut cfg = valid();
        cfg.auth.access_token_lifetime = cfg.auth.refresh_token_lifetime;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_addr_falls_back_to_unspecified() {
        let mut cfg = valid();
        cfg.server.host = "not-an-ip".into();
        cfg.server.port = 9090;
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:9090");
    }

    #[test]
    fn test_cleanup_defaults() {
        let cleanup = CleanupConfig::default();
        assert!(cleanup.enabled);
        assert_eq!(cleanup.retention, Duration::from_secs(30 * 24 * 3600));
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "cleanup": { "interval": "1h", "retention": "7d" },
            "auth": { "access_token_lifetime": "10m", "rotation": "strict" }
        }))
        .unwrap();
        assert_eq!(cfg.cleanup.interval, Duration::from_secs(3600));
        assert_eq!(cfg.cleanup.retention, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(cfg.auth.access_token_lifetime, Duration::from_secs(600));
        assert_eq!(cfg.auth.rotation, learnhub_auth::RotationPolicy::Strict);
    }
}
