//! Client configuration from the environment or a config file
//!
//! Environment variables win when they carry a complete session:
//! `LEDGERLINK_CONSUMER_KEY`, `LEDGERLINK_CONSUMER_SECRET`,
//! `LEDGERLINK_ACCESS_TOKEN`, `LEDGERLINK_ACCESS_TOKEN_SECRET` and
//! `LEDGERLINK_REALM_ID`. Optional overrides are `LEDGERLINK_CALLBACK_URL`,
//! `LEDGERLINK_VERBOSITY`, `LEDGERLINK_BASE_URL` and
//! `LEDGERLINK_LEGACY_BASE_URL`.
//!
//! Otherwise the first of `ledgerlink.{json,toml}` or `config.{json,toml}`
//! found in the working directory, then next to the executable, is read.
//! The format follows the file extension. With no file at all, a consumer
//! key and secret from the environment are enough for the handshake.

use std::path::{Path, PathBuf};

use ledgerlink_domain::{ClientConfig, Credentials, LedgerError, Result};

const FILE_STEMS: &[&str] = &["ledgerlink", "config"];
const EXTENSIONS: &[&str] = &["json", "toml"];

/// Complete environment first, then the probed config file, then a
/// consumer-only environment.
pub fn load() -> Result<ClientConfig> {
    let from_env = load_from_env();
    if let Ok(config) = &from_env {
        if config.credentials.validate().is_ok() {
            tracing::info!("configuration read from environment");
            return from_env;
        }
    }

    match (probe_config_paths(), from_env) {
        (Some(path), _) => load_from_file(Some(path)),
        (None, Ok(consumer_only)) => {
            tracing::info!("no config file, using consumer credentials from environment");
            Ok(consumer_only)
        }
        (None, Err(e)) => {
            tracing::debug!(error = %e, "environment incomplete and no config file");
            load_from_file(None)
        }
    }
}

/// Build the configuration from `LEDGERLINK_*` variables alone.
///
/// Only the consumer pair is required. Missing access material surfaces as
/// a configuration error when the first session is established.
pub fn load_from_env() -> Result<ClientConfig> {
    let credentials = Credentials {
        consumer_key: env_var("LEDGERLINK_CONSUMER_KEY")?,
        consumer_secret: env_var("LEDGERLINK_CONSUMER_SECRET")?,
        access_token: optional_env("LEDGERLINK_ACCESS_TOKEN").unwrap_or_default(),
        access_token_secret: optional_env("LEDGERLINK_ACCESS_TOKEN_SECRET").unwrap_or_default(),
        realm_id: optional_env("LEDGERLINK_REALM_ID").unwrap_or_default(),
    };

    let mut config = ClientConfig::new(credentials);
    config.callback_url = optional_env("LEDGERLINK_CALLBACK_URL");
    if let Some(base_url) = optional_env("LEDGERLINK_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(legacy_base_url) = optional_env("LEDGERLINK_LEGACY_BASE_URL") {
        config.legacy_base_url = legacy_base_url;
    }
    if let Some(verbosity) = optional_env("LEDGERLINK_VERBOSITY") {
        config.verbosity = verbosity
            .parse::<u8>()
            .map_err(|e| LedgerError::Config(format!("LEDGERLINK_VERBOSITY must be 0-255: {e}")))?;
    }
    Ok(config)
}

/// Read `path`, or the first probed config file when `path` is `None`.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) if p.exists() => p,
        Some(p) => {
            return Err(LedgerError::Config(format!("config file {} does not exist", p.display())))
        }
        None => probe_config_paths().ok_or_else(|| {
            LedgerError::Config(
                "no credentials in the environment and no ledgerlink/config file found".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "reading configuration file");
    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        LedgerError::Config(format!("cannot read {}: {e}", config_path.display()))
    })?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display()))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display()))),
        other => Err(LedgerError::Config(format!("unsupported config extension .{other}"))),
    }
}

/// First existing candidate in the working directory, then the
/// executable's directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter().flat_map(|dir| candidates_in(dir)).find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    FILE_STEMS
        .iter()
        .flat_map(|stem| EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}"))))
        .collect()
}

fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| LedgerError::Config(format!("{key} is not set")))
}

/// Unset and blank both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
