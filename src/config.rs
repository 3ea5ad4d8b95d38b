use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:8080", "http://localhost:3000"];

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub movies_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            movies_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(raw) = non_empty_var("PORT") {
            config.port = raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?;
        }
        if let Some(raw) = non_empty_var("CORS_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&raw);
        }
        config.movies_file = non_empty_var("MOVIES_FILE").map(PathBuf::from);

        info!(
            "Config: port={}, allowed_origins={:?}, movies_file={:?}",
            config.port, config.allowed_origins, config.movies_file
        );
        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
