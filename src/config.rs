use std::env;
use std::path::PathBuf;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
/// Where the bearer token is persisted between runs.
pub const DEFAULT_TOKEN_PATH: &str = ".college-events/session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// AppConfig
///
/// Holds the client's entire configuration. Immutable once loaded and
/// shared by every service built from it (transport, token store).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Backend REST root, including the `/api` prefix.
    pub api_url: String,
    // JSON file holding the persisted bearer token.
    pub token_path: PathBuf,
    // Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,
    // Runtime environment marker. Selects the log format.
    pub env: Env,
}

/// Env
///
/// Runtime context: pretty logs and a localhost backend for development,
/// JSON logs and an explicitly configured backend in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for tests, no environment variables needed.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment at startup, failing fast.
    ///
    /// # Panics
    /// Panics in production when `EVENTS_API_URL` is missing, and whenever
    /// `EVENTS_HTTP_TIMEOUT_SECS` is set to something that is not a positive
    /// number of seconds.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // The production backend must be named explicitly.
        let api_url = match env {
            Env::Production => env::var("EVENTS_API_URL")
                .expect("FATAL: EVENTS_API_URL must be set in production."),
            Env::Local => {
                env::var("EVENTS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
            }
        };

        let token_path = env::var("EVENTS_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH));

        let request_timeout_secs = match env::var("EVENTS_HTTP_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => panic!("FATAL: EVENTS_HTTP_TIMEOUT_SECS must be a positive integer, got '{}'", raw),
            },
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            api_url,
            token_path,
            request_timeout_secs,
            env,
        }
    }
}
