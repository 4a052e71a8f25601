//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.courier/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{IdFieldNames, MergePolicy};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    pub merge_policy: Option<MergePolicy>,
    pub vector_store_field: Option<String>,
    pub thread_field: Option<String>,
    pub track_thread: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:7071/api";
pub const DEFAULT_VECTOR_STORE_FIELD: &str = "vs_id";
pub const DEFAULT_THREAD_FIELD: &str = "thread_id";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub user_id: Option<String>,
    pub merge_policy: MergePolicy,
    pub fields: IdFieldNames,
}

/// Values passed on the command line. `None` = flag not given.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub merge_policy: Option<MergePolicy>,
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

/// Returns the path to `~/.courier/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".courier").join("config.toml"))
}

/// Load config from `~/.courier/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `CourierConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<CourierConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(CourierConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(CourierConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<CourierConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CourierConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Courier Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# base_url = "http://localhost:7071/api"   # Or set COURIER_BASE_URL
# user_id = "alice"                        # Sent as X-User-Id; or set COURIER_USER_ID

# [session]
# merge_policy = "present-only"     # "present-only" or "overwrite"; or set COURIER_MERGE_POLICY
# vector_store_field = "vs_id"
# thread_field = "thread_id"
# track_thread = true               # false for backends without conversation threads
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

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &CourierConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("COURIER_BASE_URL").ok())
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // User id: CLI → env → config
    let user_id = cli
        .user_id
        .clone()
        .or_else(|| std::env::var("COURIER_USER_ID").ok())
        .or_else(|| config.backend.user_id.clone())
        .filter(|u| !u.trim().is_empty());

    // Merge policy: CLI → env → config → default
    let merge_policy = cli
        .merge_policy
        .or_else(env_merge_policy)
        .or(config.session.merge_policy)
        .unwrap_or_default();

    ResolvedConfig {
        base_url,
        user_id,
        merge_policy,
        fields: resolve_fields(&config.session),
    }
}

fn env_merge_policy() -> Option<MergePolicy> {
    let raw = std::env::var("COURIER_MERGE_POLICY").ok()?;
    match raw.trim() {
        "present-only" => Some(MergePolicy::PresentOnly),
        "overwrite" => Some(MergePolicy::Overwrite),
        other => {
            warn!("Ignoring unknown COURIER_MERGE_POLICY '{}'", other);
            None
        }
    }
}

/// Field names: `track_thread = false` drops the thread field entirely.
fn resolve_fields(session: &SessionConfig) -> IdFieldNames {
    let thread = if session.track_thread.unwrap_or(true) {
        Some(
            session
                .thread_field
                .clone()
                .unwrap_or_else(|| DEFAULT_THREAD_FIELD.to_string()),
        )
    } else {
        None
    };

    IdFieldNames {
        vector_store: session
            .vector_store_field
            .clone()
            .unwrap_or_else(|| DEFAULT_VECTOR_STORE_FIELD.to_string()),
        thread,
    }
}
