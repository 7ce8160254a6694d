use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default chunk size for body writes (256 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Transfer tuning (optional `[transfer]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Size of each body chunk handed to the partial-file writer, in bytes.
    pub chunk_size: usize,
    /// Seconds to wait for the TCP/TLS connection before the request fails.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
        }
    }
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Global configuration loaded from `~/.config/plexdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexdlConfig {
    /// Plex account token. Prompted for and saved by the CLI when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Value sent as `X-Plex-Client-Identifier` on account requests.
    pub client_identifier: String,
    /// Suggested destination folder when creating a new job.
    pub download_dir: PathBuf,
    /// Job ledger location; defaults to the XDG state dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_file: Option<PathBuf>,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for PlexdlConfig {
    fn default() -> Self {
        Self {
            token: None,
            client_identifier: default_client_identifier(),
            download_dir: PathBuf::from("./downloads"),
            job_file: None,
            transfer: TransferConfig::default(),
        }
    }
}

impl PlexdlConfig {
    /// Token with surrounding whitespace removed; `None` when missing or blank.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Ledger path: explicit `job_file`, else `~/.local/state/plexdl/download_job.json`.
    pub fn job_file_path(&self) -> Result<PathBuf> {
        match &self.job_file {
            Some(p) => Ok(p.clone()),
            None => default_job_file(),
        }
    }
}

/// Identifier derived from the host name so repeated runs present as the same device.
fn default_client_identifier() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("plexdl-{}", host.trim())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plexdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_job_file() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plexdl")?;
    Ok(xdg_dirs.get_state_home().join("download_job.json"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PlexdlConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<PlexdlConfig> {
    if !path.exists() {
        let default_cfg = PlexdlConfig::default();
        save_at(&default_cfg, path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PlexdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

/// Write the configuration (e.g. after the user entered a token).
pub fn save_at(cfg: &PlexdlConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
    Ok(())
}
