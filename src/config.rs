//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; changes require a restart.

use std::env;

/// Origins always accepted by CORS, for local front-end development.
pub const DEV_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:5500",
    "http://localhost:3001",
];

/// Hosts accepted over https regardless of `ALLOWED_ORIGIN`.
const TRUSTED_HOST_SUFFIXES: [&str; 2] = [".azurewebsites.net", ".github.io"];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firestore project (the document store connection target)
    pub firestore_project_id: String,
    /// Firestore database name within the project
    pub firestore_database_id: String,
    /// Extra CORS origins from `ALLOWED_ORIGIN`
    pub allowed_origins: Vec<String>,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            firestore_project_id: "test-project".to_string(),
            firestore_database_id: "(default)".to_string(),
            allowed_origins: vec!["https://grimpe.example.org".to_string()],
            port: 3000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            firestore_project_id: env::var("FIRESTORE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIRESTORE_PROJECT_ID"))?,
            firestore_database_id: env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGIN").unwrap_or_default()),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
                Err(_) => 3000,
            },
            jwt_signing_key: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
        })
    }

    /// Whether a browser origin may call the API.
    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        if DEV_ORIGINS.contains(&origin) || self.allowed_origins.iter().any(|o| o == origin) {
            return true;
        }

        match origin.strip_prefix("https://") {
            Some(rest) => {
                let host = rest.split([':', '/']).next().unwrap_or("");
                TRUSTED_HOST_SUFFIXES
                    .iter()
                    .any(|suffix| host.ends_with(suffix))
            }
            None => false,
        }
    }
}

/// Split a comma-separated origin list, dropping blanks and duplicates.
fn parse_origins(raw: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
