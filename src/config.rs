//! Gate configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing goes through a lookup function so tests can feed a map instead of
//! mutating the process environment. `from_env` is the production entry point
//! and simply forwards `std::env::var`.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_VALIDATION_TIMEOUT_MS: u64 = 8000;

pub const DEFAULT_PROTECTED_ROUTES: &[&str] =
    &["/dashboard", "/transactions", "/categories", "/budgets", "/reports", "/settings"];
pub const DEFAULT_PUBLIC_ONLY_ROUTES: &[&str] = &["/login", "/register"];
pub const DEFAULT_ALWAYS_PUBLIC_ROUTES: &[&str] = &["/share", "/card"];
pub const DEFAULT_EXCLUDED_ROUTES: &[&str] =
    &["/api", "/_next/static", "/_next/image", "/static", "/assets", "/favicon.ico"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid route {route:?} in {var}: routes must start with '/'")]
    InvalidRoute { var: &'static str, route: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// The four route lists consumed by the access layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLists {
    pub protected: Vec<String>,
    pub public_only: Vec<String>,
    pub always_public: Vec<String>,
    pub excluded: Vec<String>,
}

impl Default for RouteLists {
    fn default() -> Self {
        Self {
            protected: to_owned_list(DEFAULT_PROTECTED_ROUTES),
            public_only: to_owned_list(DEFAULT_PUBLIC_ONLY_ROUTES),
            always_public: to_owned_list(DEFAULT_ALWAYS_PUBLIC_ROUTES),
            excluded: to_owned_list(DEFAULT_EXCLUDED_ROUTES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub backend_url: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub cookie_secure: bool,
    pub session_max_age_secs: i64,
    pub backend_timeouts: BackendTimeouts,
    pub validation_timeout: Duration,
    pub routes: RouteLists,
}

impl GateConfig {
    /// Build typed gate config from environment variables.
    ///
    /// Required:
    /// - `BACKEND_URL`: WordPress base URL
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PUBLIC_DIR`: default `public`
    /// - `COOKIE_SECURE`: inferred from an `https://` backend when absent
    /// - `SESSION_MAX_AGE_SECS`: default one week
    /// - `BACKEND_REQUEST_TIMEOUT_SECS` / `BACKEND_CONNECT_TIMEOUT_SECS`: default 10 / 5
    /// - `VALIDATION_TIMEOUT_MS`: default 8000
    /// - `PROTECTED_ROUTES`, `PUBLIC_ONLY_ROUTES`, `ALWAYS_PUBLIC_ROUTES`,
    ///   `EXCLUDED_ROUTES`: comma-separated lists
    ///
    /// # Errors
    ///
    /// Returns an error if `BACKEND_URL` is missing or a route entry is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GateConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("BACKEND_URL")
            .map(|raw| raw.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("BACKEND_URL"))?;

        let cookie_secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or_else(|| backend_url.starts_with("https://"));

        let defaults = RouteLists::default();
        let routes = RouteLists {
            protected: route_list(&lookup, "PROTECTED_ROUTES", defaults.protected)?,
            public_only: route_list(&lookup, "PUBLIC_ONLY_ROUTES", defaults.public_only)?,
            always_public: route_list(&lookup, "ALWAYS_PUBLIC_ROUTES", defaults.always_public)?,
            excluded: route_list(&lookup, "EXCLUDED_ROUTES", defaults.excluded)?,
        };

        Ok(Self {
            backend_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            public_dir: lookup("PUBLIC_DIR").map_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR), PathBuf::from),
            cookie_secure,
            session_max_age_secs: parse_or(&lookup, "SESSION_MAX_AGE_SECS", DEFAULT_SESSION_MAX_AGE_SECS),
            backend_timeouts: BackendTimeouts {
                request_secs: parse_or(&lookup, "BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS),
                connect_secs: parse_or(&lookup, "BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS),
            },
            validation_timeout: Duration::from_millis(parse_or(
                &lookup,
                "VALIDATION_TIMEOUT_MS",
                DEFAULT_VALIDATION_TIMEOUT_MS,
            )),
            routes,
        })
    }
}

/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitive.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn route_list<F>(lookup: &F, var: &'static str, default: Vec<String>) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.starts_with('/') {
                Ok(entry.to_owned())
            } else {
                Err(ConfigError::InvalidRoute { var, route: entry.to_owned() })
            }
        })
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
