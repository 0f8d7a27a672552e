//! Authentication configuration.
//!
//! Secrets, credential lifetimes, the refresh rotation policy and cookie
//! transport settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// access_token_secret = "change-me"
/// refresh_token_secret = "change-me-too"
/// access_token_lifetime = "5m"
/// refresh_token_lifetime = "3d"
/// session_ttl = "7d"
/// rotation = "strict"
///
/// [auth.cookies]
/// secure = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access credentials.
    /// Empty means access credentials cannot be issued.
    pub access_token_secret: String,

    /// HMAC secret for refresh credentials.
    pub refresh_token_secret: String,

    /// Access credential lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh credential lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Lifetime of a session entry in the key-value store.
    /// Every login and refresh restarts it.
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,

    /// Whether refresh revokes older credentials.
    pub rotation: RotationPolicy,

    /// Cookie transport settings.
    pub cookies: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_lifetime: Duration::from_secs(5 * 60),
            refresh_token_lifetime: Duration::from_secs(3 * 24 * 3600),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            rotation: RotationPolicy::default(),
            cookies: CookieConfig::default(),
        }
    }
}

/// Refresh rotation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// Refresh never revokes anything. Older access and refresh credentials
    /// stay valid until they expire.
    #[default]
    Permissive,

    /// Each refresh bumps the session generation. Credentials minted for an
    /// older generation are rejected by the gate and by refresh.
    Strict,
}

/// Cookie transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Set the `Secure` attribute. Enable behind HTTPS.
    pub secure: bool,

    /// `SameSite` attribute: "lax", "strict" or "none".
    pub same_site: String,

    /// Cookie path.
    pub path: String,

    /// Optional cookie domain.
    pub domain: Option<String>,

    /// Name of the access credential cookie.
    pub access_cookie_name: String,

    /// Name of the refresh credential cookie.
    pub refresh_cookie_name: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            domain: None,
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if a secret is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - Both secrets are identical
    /// - The access lifetime is not shorter than the refresh lifetime
    /// - The session TTL is zero
    /// - `same_site` is not one of lax, strict, none
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() {
            return Err(ConfigError::Missing("auth.access_token_secret".to_string()));
        }
        if self.refresh_token_secret.is_empty() {
            return Err(ConfigError::Missing(
                "auth.refresh_token_secret".to_string(),
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::InvalidValue(
                "access and refresh secrets must differ".to_string(),
            ));
        }
        if self.access_token_lifetime >= self.refresh_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be shorter than refresh_token_lifetime".to_string(),
            ));
        }
        if self.session_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session_ttl must be > 0".to_string(),
            ));
        }
        match self.cookies.same_site.to_ascii_lowercase().as_str() {
            "lax" | "strict" | "none" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid same_site value: '{}'. Must be lax, strict, or none",
                    other
                )));
            }
        }
        Ok(())
    }
}
