use dirs::config_dir;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveEndpointError {
    #[error("config directory not found")]
    ConfigDirNotFound,

    #[error("invalid config file {path}: {message}")]
    InvalidConfig { path: String, message: String },

    #[error("no endpoint configured (pass --endpoint, set SESSQ_ENDPOINT, or write {path})")]
    NotConfigured { path: String },
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    endpoint: String,
}

pub fn resolve_endpoint(flag: Option<&str>) -> Result<String, ResolveEndpointError> {
    if let Some(endpoint) = flag {
        return Ok(normalize_endpoint(endpoint));
    }

    if let Some(value) = std::env::var_os("SESSQ_ENDPOINT") {
        let value = value.to_string_lossy().trim().to_string();
        if !value.is_empty() {
            return Ok(normalize_endpoint(&value));
        }
    }

    let path = default_config_path().ok_or(ResolveEndpointError::ConfigDirNotFound)?;
    match load_endpoint_from_config(&path)? {
        Some(endpoint) => Ok(endpoint),
        None => Err(ResolveEndpointError::NotConfigured {
            path: path.display().to_string(),
        }),
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("sessq").join("config.json"))
}

pub fn load_endpoint_from_config(path: &Path) -> Result<Option<String>, ResolveEndpointError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(ResolveEndpointError::InvalidConfig {
                path: path.display().to_string(),
                message: error.to_string(),
            });
        }
    };

    let parsed: ConfigFile =
        serde_json::from_str(&raw).map_err(|error| ResolveEndpointError::InvalidConfig {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;

    let endpoint = parsed.endpoint.trim();
    if endpoint.is_empty() {
        return Ok(None);
    }
    Ok(Some(normalize_endpoint(endpoint)))
}

fn normalize_endpoint(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
