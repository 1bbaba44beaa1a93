use std::{env, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "doctrips.db")
    #[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
    pub sqlite_path: String,
    /// Seconds before a request is answered with 408 (default: 10)
    pub request_timeout_seconds: u64,
    /// DartDm netid lookup endpoint
    pub dartdm_url: String,
    /// Directory profile endpoint used to resolve emails
    pub dndprofiles_url: String,
    /// Directions API endpoint
    pub maps_api_url: String,
    pub maps_api_key: String,
    /// Timeout for directions requests in seconds (default: 10)
    pub maps_timeout_seconds: u64,
    /// Netids promoted to superuser at startup
    pub superuser_netids: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "doctrips.db")
    /// - `REQUEST_TIMEOUT_SECS` - Request timeout (default: 10)
    /// - `DARTDM_URL` - Netid lookup endpoint
    /// - `DNDPROFILES_URL` - Email lookup endpoint
    /// - `MAPS_API_URL` - Directions endpoint
    /// - `MAPS_API_KEY` - Directions API key (default: empty)
    /// - `MAPS_TIMEOUT_SECS` - Directions timeout (default: 10)
    /// - `SUPERUSER_NETIDS` - Comma separated netids (default: none)
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "doctrips.db".to_string()),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            dartdm_url: env::var("DARTDM_URL").unwrap_or_else(|_| {
                "http://dartdm.dartmouth.edu/NetIdLookup/Lookup".to_string()
            }),
            dndprofiles_url: env::var("DNDPROFILES_URL")
                .unwrap_or_else(|_| "http://dndprofiles.dartmouth.edu/profile".to_string()),
            maps_api_url: env::var("MAPS_API_URL").unwrap_or_else(|_| {
                "https://maps.googleapis.com/maps/api/directions/json".to_string()
            }),
            maps_api_key: env::var("MAPS_API_KEY").unwrap_or_default(),
            maps_timeout_seconds: env::var("MAPS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            superuser_netids: env::var("SUPERUSER_NETIDS")
                .map(|v| parse_netids(&v))
                .unwrap_or_default(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn maps_timeout(&self) -> Duration {
        Duration::from_secs(self.maps_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_netids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
