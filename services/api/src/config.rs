use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub bind_addr: String,

    pub username: String,
    pub password: String,

    pub max_upload_bytes: usize,
    pub cors_permissive: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/equipment.db?mode=rwc".to_string());
        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/datasets".to_string());
        let bind_addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let username = get("API_USERNAME")?;
        let password = get("API_PASSWORD")?;

        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(v) => v.parse().with_context(|| format!("MAX_UPLOAD_BYTES is not a number: {v}"))?,
            Err(_) => 10 * 1024 * 1024,
        };
        let cors_permissive = std::env::var("CORS_PERMISSIVE")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(true);

        // Tiny sanity checks (fail fast, fail loud)
        if !database_url.starts_with("sqlite:") {
            bail!("DATABASE_URL must be a sqlite: URL");
        }
        if username.trim().is_empty() || password.is_empty() {
            bail!("API_USERNAME and API_PASSWORD must not be empty");
        }
        if max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be positive");
        }

        Ok(Self {
            database_url,
            upload_dir: PathBuf::from(upload_dir),
            bind_addr,
            username,
            password,
            max_upload_bytes,
            cors_permissive,
        })
    }

    /// Directory that must exist before sqlite can create the database file.
    pub fn database_dir(&self) -> Option<&Path> {
        let path = self.database_url.strip_prefix("sqlite://")?;
        let path = path.split('?').next()?;
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}
