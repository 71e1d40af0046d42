use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{WsClient, DEFAULT_API_ENDPOINT, DEFAULT_API_VERSION};
use crate::error::{Error, Result};
use crate::identity::{
    FileTokenStore, FirebaseRetriever, IdentityConfig, IdentityManager,
    DEFAULT_IDENTITY_ENDPOINT, DEFAULT_TOKEN_ENDPOINT,
};
use crate::output::OutputFormat;

/// One layer of configuration: the YAML file, or the flags and `WS_*`
/// environment variables given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub web_api_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_version: Option<String>,
    pub identity_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub output: Option<OutputFormat>,
}

impl Config {
    /// Fill every unset value from `lower`.
    pub fn or(self, lower: Config) -> Config {
        Config {
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            web_api_key: self.web_api_key.or(lower.web_api_key),
            api_endpoint: self.api_endpoint.or(lower.api_endpoint),
            api_version: self.api_version.or(lower.api_version),
            identity_endpoint: self.identity_endpoint.or(lower.identity_endpoint),
            token_endpoint: self.token_endpoint.or(lower.token_endpoint),
            output: self.output.or(lower.output),
        }
    }
}

/// Get the path to the configuration file (~/.ws/config)
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Failed to determine home directory".to_string()))?;
    Ok(home.join(".ws").join("config"))
}

/// Load the YAML configuration file.
///
/// Without an explicit path, a missing `~/.ws/config` yields an empty
/// configuration. An explicitly requested file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        debug!("No configuration file at {}", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(&content)?;
    debug!("Using config file: {}", path.display());
    Ok(config)
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub web_api_key: Option<String>,
    pub api_endpoint: String,
    pub api_version: String,
    pub identity_endpoint: String,
    pub token_endpoint: String,
    pub output: OutputFormat,
}

impl Settings {
    /// Apply built-in defaults to whatever the layers left unset.
    pub fn resolve(config: Config) -> Self {
        Self {
            username: config.username,
            password: config.password,
            web_api_key: config.web_api_key,
            api_endpoint: config
                .api_endpoint
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            api_version: config
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            identity_endpoint: config
                .identity_endpoint
                .unwrap_or_else(|| DEFAULT_IDENTITY_ENDPOINT.to_string()),
            token_endpoint: config
                .token_endpoint
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string()),
            output: config.output.unwrap_or_default(),
        }
    }

    pub fn identity_config(&self) -> Result<IdentityConfig> {
        IdentityConfig::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
            self.web_api_key.clone().unwrap_or_default(),
        )
    }

    /// Identity manager persisting to `~/.ws/identity`.
    pub fn identity_manager(&self, client: &reqwest::Client) -> Result<IdentityManager> {
        let retriever = FirebaseRetriever::new_with_endpoints(
            client.clone(),
            self.identity_config()?,
            self.identity_endpoint.clone(),
            self.token_endpoint.clone(),
        );
        Ok(IdentityManager::new(
            Box::new(FileTokenStore::new()?),
            Box::new(retriever),
        ))
    }

    pub fn api_client(&self, client: &reqwest::Client) -> Result<WsClient> {
        Ok(WsClient::new_with_endpoint(
            client.clone(),
            self.identity_manager(client)?,
            self.api_endpoint.clone(),
            self.api_version.clone(),
        ))
    }
}
