use anyhow::{Context, Result};
use docqa_rag::{RetrievalMode, DEFAULT_TOP_N};
use std::env;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_FOLDER: &str = "uploads";
const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upload_folder: PathBuf,
    pub retrieval_mode: RetrievalMode,
    pub top_n: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            upload_folder: PathBuf::from(DEFAULT_UPLOAD_FOLDER),
            retrieval_mode: RetrievalMode::default(),
            top_n: DEFAULT_TOP_N,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `UPLOAD_FOLDER`, `RETRIEVAL_MODE`, `TOP_N` and
    /// `MAX_UPLOAD_MB`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let retrieval_mode = match env::var("RETRIEVAL_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => defaults.retrieval_mode,
        };

        let top_n = match env::var("TOP_N") {
            Ok(n) => n.parse().with_context(|| format!("TOP_N must be a number, got '{}'", n))?,
            Err(_) => defaults.top_n,
        };

        let max_upload_bytes = match env::var("MAX_UPLOAD_MB") {
            Ok(mb) => {
                let mb: usize = mb
                    .parse()
                    .with_context(|| format!("MAX_UPLOAD_MB must be a number, got '{}'", mb))?;
                mb * 1024 * 1024
            }
            Err(_) => defaults.max_upload_bytes,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            upload_folder: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_folder),
            retrieval_mode,
            top_n,
            max_upload_bytes,
        })
    }
}
