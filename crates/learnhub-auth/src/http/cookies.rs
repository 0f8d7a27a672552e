use std::time::Duration;

use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

use crate::config::CookieConfig;
use crate::token::CredentialPair;

fn same_site(config: &CookieConfig) -> SameSite {
    match config.same_site.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Builds an `HttpOnly` credential cookie living for `max_age`.
#[must_use]
pub fn credential_cookie(
    config: &CookieConfig,
    name: &str,
    value: &str,
    max_age: Duration,
) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site(config))
        .path(config.path.clone())
        .max_age(max_age);
    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Adds the access and refresh cookies for `credentials`.
#[must_use]
pub fn set_credential_cookies(
    jar: CookieJar,
    config: &CookieConfig,
    credentials: &CredentialPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> CookieJar {
    jar.add(credential_cookie(
        config,
        &config.access_cookie_name,
        credentials.access.token(),
        access_ttl,
    ))
    .add(credential_cookie(
        config,
        &config.refresh_cookie_name,
        credentials.refresh.token(),
        refresh_ttl,
    ))
}

/// Overwrites both credential cookies with empty values that expire
/// immediately.
#[must_use]
pub fn clear_credential_cookies(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    jar.add(credential_cookie(
        config,
        &config.access_cookie_name,
        "",
        Duration::ZERO,
    ))
    .add(credential_cookie(
        config,
        &config.refresh_cookie_name,
        "",
        Duration::ZERO,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_cookie_attributes() {
        let config = CookieConfig {
            secure: true,
            ..CookieConfig::default()
        };
        let cookie = credential_cookie(&config, "access_token", "abc", Duration::from_secs(300));
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("access_token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Max-Age=300"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn test_clear_sets_zero_max_age() {
        let config = CookieConfig::default();
        let jar = clear_credential_cookies(CookieJar::new(), &config);

        let access = jar.get("access_token").unwrap();
        assert_eq!(access.value(), "");
        assert_eq!(access.max_age(), Some(time::Duration::ZERO));
        assert!(jar.get("refresh_token").is_some());
    }

    #[test]
    fn test_same_site_strict() {
        let config = CookieConfig {
            same_site: "Strict".to_string(),
            ..CookieConfig::default()
        };
        let cookie = credential_cookie(&config, "x", "y", Duration::from_secs(1));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }
}
