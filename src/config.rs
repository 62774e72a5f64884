use std::{env, time::Duration};

use crate::indicator::{CookieSettings, DEFAULT_MAX_AGE_DAYS, MAX_AGE_CAP_DAYS};

const LOCAL_IDENTITY_PROVIDER_URL: &str = "http://localhost:8080";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOGOUT_TIMEOUT_SECS: u64 = 5;

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls defaults and log format.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the remote identity provider (logout endpoints live under it).
    pub identity_provider_url: String,
    // Whether the indicator cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    // Upper bound on the indicator cookie lifetime.
    pub indicator_max_age_days: i64,
    // Bound on a single remote logout call.
    pub logout_timeout_secs: u64,
}

/// Env
///
/// Local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            identity_provider_url: LOCAL_IDENTITY_PROVIDER_URL.to_string(),
            cookie_secure: false,
            indicator_max_age_days: DEFAULT_MAX_AGE_DAYS,
            logout_timeout_secs: DEFAULT_LOGOUT_TIMEOUT_SECS,
        }
    }
}

/// env_bool
///
/// Lenient boolean parsing for flags such as `COOKIE_SECURE`. Unrecognized values are `None`.
pub fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in Production when `IDENTITY_PROVIDER_URL` is missing, so the edge never
    /// starts pointing logout calls at a development default.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let identity_provider_url = match env {
            Env::Production => env::var("IDENTITY_PROVIDER_URL")
                .expect("FATAL: IDENTITY_PROVIDER_URL must be set in production."),
            Env::Local => env::var("IDENTITY_PROVIDER_URL")
                .unwrap_or_else(|_| LOCAL_IDENTITY_PROVIDER_URL.to_string()),
        };

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(env == Env::Production);

        let indicator_max_age_days = env_parse::<i64>("INDICATOR_MAX_AGE_DAYS")
            .filter(|days| *days > 0)
            .map_or(DEFAULT_MAX_AGE_DAYS, |days| days.min(MAX_AGE_CAP_DAYS));

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            identity_provider_url,
            cookie_secure,
            indicator_max_age_days,
            logout_timeout_secs: env_parse("LOGOUT_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_LOGOUT_TIMEOUT_SECS),
        }
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            max_age_days: self.indicator_max_age_days,
            secure: self.cookie_secure,
        }
    }

    pub fn logout_timeout(&self) -> Duration {
        Duration::from_secs(self.logout_timeout_secs)
    }
}
