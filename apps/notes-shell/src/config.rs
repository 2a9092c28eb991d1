//! Centralized configuration for the notes shell.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than halfway through a session.

use std::env;
use std::fmt;
use std::path::PathBuf;

use domain::store::PersistPolicy;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on exit)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Sqlite
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

fn parse_policy(s: &str) -> Result<PersistPolicy, ConfigError> {
    match s.to_lowercase().as_str() {
        "best-effort" | "best_effort" | "besteffort" => Ok(PersistPolicy::BestEffort),
        "strict" => Ok(PersistPolicy::Strict),
        other => Err(ConfigError {
            field: "PERSIST_POLICY",
            message: format!("expected 'best-effort' or 'strict', got '{}'", other),
        }),
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Shell configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: sqlite)
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/planets.db)
    pub db_path: PathBuf,
    /// Directory the image picker browses (default: ./images)
    pub image_dir: PathBuf,
    /// What to do when a save cannot be written
    pub persist_policy: PersistPolicy,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_provider = StorageProvider::from_str(
            &env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "sqlite".into()),
        );

        let db_path = env::var("DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/planets.db"));

        let image_dir = env::var("IMAGE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./images"));

        let persist_policy =
            parse_policy(&env::var("PERSIST_POLICY").unwrap_or_else(|_| "best-effort".into()))?;

        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        Ok(Self {
            storage_provider,
            db_path,
            image_dir,
            persist_policy,
            log_format,
        })
    }

    /// Log warnings about settings that lose data.
    pub fn warn_if_volatile(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!("STORAGE_PROVIDER=memory: planets will not survive this session.");
        }
    }
}
