//! API server configuration.

use std::net::IpAddr;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Login/reset attempts allowed per client within one window.
    pub login_attempts_per_window: u32,
    /// Rate-limit window length in seconds.
    pub login_window_secs: u64,
    /// Reverse proxies whose `X-Forwarded-For` is believed. Empty means the
    /// peer address is always the client.
    pub trusted_proxies: Vec<IpAddr>,
}

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/aci_dashboard";
pub const DEFAULT_LOGIN_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOGIN_WINDOW_SECS: u64 = 60;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            login_attempts_per_window: DEFAULT_LOGIN_ATTEMPTS,
            login_window_secs: DEFAULT_LOGIN_WINDOW_SECS,
            trusted_proxies: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                                      |
    /// |------------------------|----------------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:8000`                             |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/aci_dashboard`    |
    /// | `LOGIN_RATE_LIMIT`     | `5`                                          |
    /// | `LOGIN_RATE_WINDOW_SECS` | `60`                                       |
    /// | `TRUSTED_PROXIES`      | empty (comma-separated IPs)                  |
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
            login_attempts_per_window: std::env::var("LOGIN_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOGIN_ATTEMPTS),
            login_window_secs: std::env::var("LOGIN_RATE_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOGIN_WINDOW_SECS),
            trusted_proxies: std::env::var("TRUSTED_PROXIES")
                .map(|v| parse_proxy_list(&v))
                .unwrap_or_default(),
        }
    }
}

/// Parse a comma-separated list of IP addresses, skipping blank and
/// unparseable entries.
pub fn parse_proxy_list(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|entry| entry.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_list_skips_junk() {
        let parsed = parse_proxy_list(" 10.0.0.1, ,not-an-ip,::1 ");
        assert_eq!(
            parsed,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[test]
    fn no_proxy_is_trusted_by_default() {
        assert!(ApiConfig::default().trusted_proxies.is_empty());
    }
}
