use std::time::Duration;

use url::Url;

use crate::error::AuthError;

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Root of the CAS server, e.g. `https://login.dartmouth.edu/cas`.
    pub cas_url: String,
    /// Public URL of this app, used to build the CAS `service` parameter.
    pub base_url: Url,
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CAS_URL`: CAS server root (default: `https://login.dartmouth.edu/cas`)
    /// - `BASE_URL`: Base URL for the CAS callback (default: `http://localhost:3000`)
    /// - `SESSION_TTL_HOURS`: Session TTL in hours (default: 24)
    /// - `SESSION_COOKIE`: Session cookie name (default: `doctrips_session`)
    /// - `COOKIE_SECURE`: Whether to set the secure flag on cookies (default: false)
    ///
    /// # Errors
    ///
    /// Returns an error if `BASE_URL` is not a valid absolute URL.
    pub fn from_env() -> Result<Self, AuthError> {
        let cas_url = std::env::var("CAS_URL")
            .unwrap_or_else(|_| "https://login.dartmouth.edu/cas".to_string());

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let base_url: Url = base_url
            .parse()
            .map_err(|e| AuthError::Config(format!("BASE_URL {base_url}: {e}")))?;

        let session_ttl = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|hours| Duration::from_secs(hours * 60 * 60))
            .unwrap_or(Duration::from_secs(24 * 60 * 60));

        let cookie_name =
            std::env::var("SESSION_COOKIE").unwrap_or_else(|_| "doctrips_session".to_string());

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            cas_url,
            base_url,
            session_ttl,
            cookie_name,
            cookie_secure,
        })
    }

    /// Defaults suitable for tests and local development.
    pub fn local(base_url: Url) -> Self {
        Self {
            cas_url: "https://login.dartmouth.edu/cas".to_string(),
            base_url,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            cookie_name: "doctrips_session".to_string(),
            cookie_secure: false,
        }
    }

    /// The CAS `service` URL: our callback, carrying the post-login target.
    pub fn service_url(&self, next: Option<&str>) -> Result<Url, AuthError> {
        let mut url = self
            .base_url
            .join("/auth/callback")
            .map_err(|e| AuthError::Config(e.to_string()))?;
        if let Some(next) = next {
            url.query_pairs_mut().append_pair("next", next);
        }
        Ok(url)
    }
}
