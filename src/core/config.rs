//! # Configuration
//!
//! Centralizes settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.parley/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover the options.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Full completion URL, e.g. `http://127.0.0.1:5000/gpt4`.
    pub endpoint: Option<String>,
}

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/gpt4";

/// Concrete values after resolution, no Options.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.parley/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".parley").join("config.toml"))
}

/// Load config from `~/.parley/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ParleyConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ParleyConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ParleyConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ParleyConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: ParleyConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Parley Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# endpoint = "http://127.0.0.1:5000/gpt4"   # Or set PARLEY_ENDPOINT env var
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config: defaults → config file → env → CLI.
///
/// `cli_endpoint` comes from the `--endpoint` flag (None = not specified).
pub fn resolve(config: &ParleyConfig, cli_endpoint: Option<&str>) -> ResolvedConfig {
    resolve_from(config, cli_endpoint, std::env::var("PARLEY_ENDPOINT").ok())
}

fn resolve_from(
    config: &ParleyConfig,
    cli_endpoint: Option<&str>,
    env_endpoint: Option<String>,
) -> ResolvedConfig {
    let endpoint = cli_endpoint
        .map(|s| s.to_string())
        .or(env_endpoint)
        .or_else(|| config.server.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    ResolvedConfig { endpoint }
}
