use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::NetaError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_FALLBACK_BASE: &str = "data";
pub const CONFIG_FILE_NAME: &str = "neta.json";
pub const API_URL_ENV: &str = "NETA_API_URL";

/// On-disk shape of `neta.json`. Every field is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub fallback_base: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Process-wide client configuration, resolved once and injected into the
/// transport and client constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base_url: String,
    fallback_base_url: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_base_url: &str, fallback_base: &str) -> Result<Self, NetaError> {
        Ok(Self {
            api_base_url: normalize_api_base(api_base_url)?,
            fallback_base_url: normalize_fallback_base(fallback_base)?,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn fallback_base_url(&self) -> &str {
        &self.fallback_base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn fallback_url(&self, file: &str) -> String {
        format!("{}/{}", self.fallback_base_url, file.trim_start_matches('/'))
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves the configuration from an explicit path, `./neta.json`, the
    /// user config directory, or built-in defaults, in that order.
    pub fn resolve(path: Option<&str>) -> Result<ClientConfig, NetaError> {
        let config = match path {
            Some(path) => Self::read(PathBuf::from(path))?,
            None => match Self::discover() {
                Some(found) => Self::read(found.into_std_path_buf())?,
                None => Config::default(),
            },
        };
        let env_override = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve_config(config, env_override)
    }

    pub fn resolve_config(
        config: Config,
        api_url_override: Option<String>,
    ) -> Result<ClientConfig, NetaError> {
        let api_base_url = api_url_override
            .or(config.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let fallback_base = config
            .fallback_base
            .unwrap_or_else(|| DEFAULT_FALLBACK_BASE.to_string());
        let timeout = match config.timeout_secs {
            Some(0) => {
                return Err(NetaError::InvalidConfig(
                    "timeout_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };
        Ok(ClientConfig::new(&api_base_url, &fallback_base)?.with_timeout(timeout))
    }

    fn read(path: PathBuf) -> Result<Config, NetaError> {
        let content = fs::read_to_string(&path).map_err(|_| NetaError::ConfigRead(path.clone()))?;
        serde_json::from_str(&content).map_err(|err| NetaError::ConfigParse(err.to_string()))
    }

    fn discover() -> Option<Utf8PathBuf> {
        let local = Utf8PathBuf::from(CONFIG_FILE_NAME);
        if local.as_std_path().exists() {
            return Some(local);
        }
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.config_dir().join("neta").join(CONFIG_FILE_NAME))
                    .ok()
            })
            .filter(|path| path.as_std_path().exists())
    }
}

fn normalize_api_base(value: &str) -> Result<String, NetaError> {
    let trimmed = value.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| NetaError::InvalidConfig(format!("api_base_url {trimmed}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(NetaError::InvalidConfig(format!(
            "api_base_url must be http or https: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_fallback_base(value: &str) -> Result<String, NetaError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(NetaError::InvalidConfig(
            "fallback_base must not be empty".to_string(),
        ));
    }
    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            return Ok(trimmed.to_string());
        }
    }

    let mut dir = Utf8PathBuf::from(trimmed);
    if dir.is_relative() {
        let cwd = std::env::current_dir()
            .map_err(|err| NetaError::InvalidConfig(err.to_string()))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| NetaError::InvalidConfig("non-utf8 working directory".to_string()))?;
        dir = cwd.join(dir);
    }
    let url = Url::from_file_path(dir.as_std_path())
        .map_err(|_| NetaError::InvalidConfig(format!("invalid fallback directory: {dir}")))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_config_is_empty() {
        let resolved = ConfigLoader::resolve_config(Config::default(), None).unwrap();
        assert_eq!(resolved.api_base_url(), DEFAULT_API_BASE_URL);
        assert!(resolved.fallback_base_url().starts_with("file://"));
        assert!(resolved.fallback_base_url().ends_with("/data"));
        assert_eq!(resolved.timeout(), None);
    }

    #[test]
    fn env_override_wins_over_file() {
        let config = Config {
            api_base_url: Some("http://file.example/api".to_string()),
            ..Config::default()
        };
        let resolved =
            ConfigLoader::resolve_config(config, Some("https://env.example/api/".to_string()))
                .unwrap();
        assert_eq!(resolved.api_url("datasets"), "https://env.example/api/datasets");
    }
}
