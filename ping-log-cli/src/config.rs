//! Configuration loading and parsing

use anyhow::{anyhow, Context, Result};
use ping_log_decoder::{DecoderConfig, Destinations, SortConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    pub sort: Option<SortConfig>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .decoder
        .validate()
        .with_context(|| format!("Invalid [decoder] section in {:?}", path))?;

    Ok(config)
}

/// Combine `sort` arguments with the `[sort]` table; arguments win
pub fn resolve_sort(
    configured: Option<&SortConfig>,
    input_dir: Option<PathBuf>,
    ping1d_dir: Option<PathBuf>,
    ping360_dir: Option<PathBuf>,
) -> Result<SortConfig> {
    let input_dir = input_dir
        .or_else(|| configured.map(|c| c.input_dir.clone()))
        .ok_or_else(|| anyhow!("No input directory: pass one or set [sort].input_dir"))?;
    let ping1d = ping1d_dir
        .or_else(|| configured.map(|c| c.destinations.ping1d.clone()))
        .ok_or_else(|| anyhow!("No Ping1D destination: pass --ping1d-dir or set [sort.destinations].ping1d"))?;
    let ping360 = ping360_dir
        .or_else(|| configured.map(|c| c.destinations.ping360.clone()))
        .ok_or_else(|| anyhow!("No Ping360 destination: pass --ping360-dir or set [sort.destinations].ping360"))?;

    Ok(SortConfig {
        input_dir,
        destinations: Destinations { ping1d, ping360 },
    })
}
