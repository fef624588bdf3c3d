//! Configuration loader
//!
//! Loads pipeline configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `AEROINTAKE_CRM_API_DOMAIN`: CRM API origin
//! - `AEROINTAKE_CRM_API_VERSION`: CRM API version path segment
//! - `AEROINTAKE_CRM_MODULE`: CRM module holding safety reports
//! - `AEROINTAKE_CRM_ID_FIELD`: field carrying the occurrence identifier
//! - `AEROINTAKE_CRM_TOKEN_URL` / `_CLIENT_ID` / `_CLIENT_SECRET` /
//!   `_REFRESH_TOKEN`: CRM OAuth credentials
//! - `AEROINTAKE_DOCS_API_DOMAIN`: document store API origin
//! - `AEROINTAKE_DOCS_ROOT_FOLDER`: root folder for submissions
//! - `AEROINTAKE_DOCS_TOKEN_URL` / `_CLIENT_ID` / `_CLIENT_SECRET` /
//!   `_REFRESH_TOKEN`: document store OAuth credentials
//! - `AEROINTAKE_RESOLVER_MAX_ATTEMPTS`: occurrence-id poll attempts
//!   (optional)
//! - `AEROINTAKE_RESOLVER_INTERVAL_MS`: delay between polls (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./aerointake.json` or `./aerointake.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use aerointake_domain::{
    CrmConfig, DocumentStoreConfig, IntakeConfig, IntakeError, ResolverConfig, Result,
    ServiceCredentials, DEFAULT_RESOLVER_INTERVAL_MS, DEFAULT_RESOLVER_MAX_ATTEMPTS,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `IntakeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<IntakeConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `IntakeError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<IntakeConfig> {
    let crm = CrmConfig {
        api_domain: env_var("AEROINTAKE_CRM_API_DOMAIN")?,
        api_version: env_var("AEROINTAKE_CRM_API_VERSION")?,
        module: env_var("AEROINTAKE_CRM_MODULE")?,
        occurrence_id_field: env_var("AEROINTAKE_CRM_ID_FIELD")?,
        credentials: ServiceCredentials {
            token_url: env_var("AEROINTAKE_CRM_TOKEN_URL")?,
            client_id: env_var("AEROINTAKE_CRM_CLIENT_ID")?,
            client_secret: env_var("AEROINTAKE_CRM_CLIENT_SECRET")?,
            refresh_token: env_var("AEROINTAKE_CRM_REFRESH_TOKEN")?,
        },
    };

    let document_store = DocumentStoreConfig {
        api_domain: env_var("AEROINTAKE_DOCS_API_DOMAIN")?,
        root_folder_id: env_var("AEROINTAKE_DOCS_ROOT_FOLDER")?,
        credentials: ServiceCredentials {
            token_url: env_var("AEROINTAKE_DOCS_TOKEN_URL")?,
            client_id: env_var("AEROINTAKE_DOCS_CLIENT_ID")?,
            client_secret: env_var("AEROINTAKE_DOCS_CLIENT_SECRET")?,
            refresh_token: env_var("AEROINTAKE_DOCS_REFRESH_TOKEN")?,
        },
    };

    let resolver = ResolverConfig {
        max_attempts: env_parsed("AEROINTAKE_RESOLVER_MAX_ATTEMPTS", DEFAULT_RESOLVER_MAX_ATTEMPTS)?,
        interval_ms: env_parsed("AEROINTAKE_RESOLVER_INTERVAL_MS", DEFAULT_RESOLVER_INTERVAL_MS)?,
    };

    Ok(IntakeConfig { crm, document_store, resolver })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `IntakeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<IntakeConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(IntakeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            IntakeError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| IntakeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<IntakeConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| IntakeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| IntakeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(IntakeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./aerointake.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("aerointake.json"),
            cwd.join("aerointake.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("aerointake.json"),
                exe_dir.join("aerointake.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `IntakeError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| IntakeError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional numeric environment variable, defaulting when unset.
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| IntakeError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
