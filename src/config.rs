use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Application configuration driven by environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub error_log: PathBuf,
    pub dataset_url: Option<String>,
    pub eager_init: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env::var("MOVIE_API_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let index_dir = env::var("MOVIE_API_INDEX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("store"));

        let bind_addr: SocketAddr = env::var("MOVIE_API_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()
            .context("parsing MOVIE_API_BIND_ADDR")?;

        let error_log = env::var("MOVIE_API_ERROR_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("errorlog"));

        let dataset_url = env::var("MOVIE_API_DATASET_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let eager_init = match env::var("MOVIE_API_EAGER_INIT") {
            Ok(value) => parse_flag(&value)?,
            Err(_) => false,
        };

        Ok(Self {
            data_dir,
            index_dir,
            bind_addr,
            error_log,
            dataset_url,
            eager_init,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("MOVIE_API_EAGER_INIT must be a boolean, got {other:?}"),
    }
}
