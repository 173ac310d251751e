// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// BLOG_STORE             sqlite | json | memory   (default: sqlite)
// BLOG_DATA_DIR          directory for database files (default: data)
// BLOG_COMMIT_RETRIES    conflict retries per mutation (default: 5)
// BLOG_RETRY_BACKOFF_MS  jitter ceiling per retry step (default: 10)
// BLOG_LOG_LEVEL         tracing level for stderr logs (default: warn)

use crate::core::articles::EngagementConfig;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Json,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub data_dir: PathBuf,
    pub log_level: tracing::Level,
    pub engagement: EngagementConfig,
    /// Problems found while reading the environment, logged once tracing is up.
    pub warnings: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();
        let defaults = EngagementConfig::default();

        let store = parse_or(&lookup, "BLOG_STORE", StoreBackend::Sqlite, &mut warnings);
        let log_level = parse_or(&lookup, "BLOG_LOG_LEVEL", tracing::Level::WARN, &mut warnings);
        let max_retries = parse_or(
            &lookup,
            "BLOG_COMMIT_RETRIES",
            defaults.max_retries,
            &mut warnings,
        );
        let retry_backoff_ms = parse_or(
            &lookup,
            "BLOG_RETRY_BACKOFF_MS",
            defaults.retry_backoff_ms,
            &mut warnings,
        );
        let data_dir = lookup("BLOG_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Self {
            store,
            data_dir,
            log_level,
            engagement: EngagementConfig {
                max_retries,
                retry_backoff_ms,
            },
            warnings,
        }
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("articles.db")
    }

    pub fn json_path(&self) -> PathBuf {
        self.data_dir.join("articles.json")
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warnings.push(format!("Ignoring invalid {}={:?}, using default", key, raw));
                default
            }
        },
    }
}
