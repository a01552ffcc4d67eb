//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars.
//!
//! Config lives at `<config dir>/tunet/config.toml`. If missing on first run,
//! a commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::ConnectionMode;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TunetConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    pub workers: Option<i64>,
    pub tick_interval_secs: Option<u64>,
    pub mode: Option<ConnectionMode>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub workers: usize,
    /// `None` disables automatic refresh.
    pub tick_interval: Option<Duration>,
    pub mode: ConnectionMode,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    pub level: LevelFilter,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            tick_interval: Some(Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS)),
            mode: ConnectionMode::Auto,
            log: LogSettings {
                file: None,
                level: DEFAULT_LOG_LEVEL,
            },
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `<config dir>/tunet/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunet").join("config.toml"))
}

/// Load config from the default location.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TunetConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TunetConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default config");
        return Ok(TunetConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<TunetConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(TunetConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: TunetConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Tunet Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars.

# [engine]
# workers = 4                 # Or set TUNET_WORKERS
# tick_interval_secs = 60     # 0 disables automatic refresh (TUNET_TICK_INTERVAL)
# mode = "auto"               # "auto", "net", "auth4", "auth6" (TUNET_MODE)

# [log]
# file = "tunet.log"          # Or set TUNET_LOG_FILE
# level = "info"              # "off", "error", "warn", "info", "debug", "trace"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars.
pub fn resolve(config: &TunetConfig) -> Result<ResolvedConfig, ConfigError> {
    resolve_with(config, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading overrides through `env`.
pub fn resolve_with(
    config: &TunetConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    // Workers: env → config → default. Zero or negative fails here rather
    // than when the pool is built.
    let workers = match env("TUNET_WORKERS") {
        Some(raw) => parse_env("TUNET_WORKERS", &raw)?,
        None => config.engine.workers.unwrap_or(DEFAULT_WORKERS as i64),
    };
    let workers = usize::try_from(workers)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key: "workers",
            value: workers.to_string(),
        })?;

    // Tick interval: env → config → default; zero disables the ticker
    let tick_secs = match env("TUNET_TICK_INTERVAL") {
        Some(raw) => parse_env("TUNET_TICK_INTERVAL", &raw)?,
        None => config
            .engine
            .tick_interval_secs
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS),
    };
    let tick_interval = (tick_secs > 0).then(|| Duration::from_secs(tick_secs));

    let mode = match env("TUNET_MODE") {
        Some(raw) => parse_env("TUNET_MODE", &raw)?,
        None => config.engine.mode.unwrap_or_default(),
    };

    let file = env("TUNET_LOG_FILE")
        .map(PathBuf::from)
        .or_else(|| config.log.file.clone());

    let level = match env("TUNET_LOG_LEVEL").or_else(|| config.log.level.clone()) {
        Some(raw) => parse_env("log level", &raw)?,
        None => DEFAULT_LOG_LEVEL,
    };

    Ok(ResolvedConfig {
        workers,
        tick_interval,
        mode,
        log: LogSettings { file, level },
    })
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
