//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MEALDB_API_BASE: &str = "https://www.themealdb.com/api/json/v1/1";
const DEFAULT_AUTH_API_BASE: &str = "https://dummyjson.com";
const DEFAULT_STORAGE_PATH: &str = "data/easycook.json";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:4200";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PAGE_SIZE: usize = 12;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_PAGINATION_RADIUS: usize = 2;
const DEFAULT_AUTH_SESSION_MINUTES: u32 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// TheMealDB API base URL (no trailing slash)
    pub mealdb_api_base: String,
    /// Mock auth API base URL
    pub auth_api_base: String,
    /// Local key-value storage file
    pub storage_path: PathBuf,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Listing view tuning ---
    /// Meals per listing page
    pub page_size: usize,
    /// Quiescence window for the free-text search filter
    pub search_debounce: Duration,
    /// Window radius for the abbreviated page-number sequence
    pub pagination_radius: usize,

    /// `expiresInMins` requested at login
    pub auth_session_minutes: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            mealdb_api_base: "http://127.0.0.1:9/api/json/v1/1".to_string(),
            auth_api_base: "http://127.0.0.1:9".to_string(),
            storage_path: PathBuf::from("target/test-storage.json"),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: DEFAULT_PORT,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            pagination_radius: DEFAULT_PAGINATION_RADIUS,
            auth_session_minutes: DEFAULT_AUTH_SESSION_MINUTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let page_size = parse_or("PAGE_SIZE", DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::Invalid("PAGE_SIZE", "must be at least 1"));
        }

        Ok(Self {
            mealdb_api_base: env::var("MEALDB_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_MEALDB_API_BASE.to_string()),
            auth_api_base: env::var("AUTH_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_AUTH_API_BASE.to_string()),
            storage_path: env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH)),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            port: parse_or("PORT", DEFAULT_PORT),
            page_size,
            search_debounce: Duration::from_millis(parse_or(
                "SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )),
            pagination_radius: parse_or("PAGINATION_RADIUS", DEFAULT_PAGINATION_RADIUS),
            auth_session_minutes: parse_or("AUTH_SESSION_MINUTES", DEFAULT_AUTH_SESSION_MINUTES),
        })
    }
}

/// Read and parse an env var, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, &'static str),
}
