//! Configuration file
//!
//! A single TOML file holds the API connection settings and every desired
//! resource:
//!
//! ```toml
//! [api]
//! url = "https://zabbix.example.com/api_jsonrpc.php"
//! token = "..."
//! # Zabbix 5.4 to 6.2 only accept the token inside the request body
//! legacy_auth = false
//!
//! [item_http.web_health]
//! hostid = "10084"
//! key = "web.health"
//! name = "Web health"
//! valuetype = "unsigned"
//! url = "https://example.com/health"
//! ```

use crate::paths;
use crate::resource::{self, HttpItemCodec, HttpItemConfig, item_http};
use anyhow::{Context, Result, bail};
use declarative::ResourceCodec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zabbix::TokenPlacement;

/// Environment variable that overrides `[api] token`
pub const ENV_API_TOKEN: &str = "ITEMCTL_API_TOKEN";

// ============================================================================
// Config Structures
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP agent items by name
    #[serde(default)]
    pub item_http: BTreeMap<String, HttpItemConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// URL of `api_jsonrpc.php`
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// Total attempts for transient network failures
    pub max_attempts: u32,
    /// Send the token in the JSON-RPC `auth` member instead of a Bearer header
    pub legacy_auth: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: None,
            username: None,
            password: None,
            timeout_secs: 30,
            max_attempts: 3,
            legacy_auth: false,
        }
    }
}

/// How to authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Login { username: String, password: String },
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn token_placement(&self) -> TokenPlacement {
        if self.legacy_auth {
            TokenPlacement::Body
        } else {
            TokenPlacement::Header
        }
    }

    /// Resolve credentials, preferring the environment token
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(std::env::var(ENV_API_TOKEN).ok())
    }

    fn credentials_with(&self, env_token: Option<String>) -> Result<Credentials> {
        if let Some(token) = env_token.filter(|t| !t.is_empty()) {
            log::debug!("Using API token from {ENV_API_TOKEN}");
            return Ok(Credentials::Token(token));
        }
        if let Some(token) = self.token.clone().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Token(token));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::Login {
                username: username.clone(),
                password: password.clone(),
            }),
            (Some(_), None) => bail!("[api] username is set but password is missing"),
            _ => bail!(
                "No API credentials: set {ENV_API_TOKEN}, [api] token, or [api] username/password"
            ),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resource names become the second half of an address
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('.')
}

impl Config {
    /// Resolve the config file path: explicit flag, else the default location
    pub fn path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(p) => Ok(p.to_path_buf()),
            None => paths::config_file(),
        }
    }

    /// Load and parse the config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        if let Some(name) = config.item_http.keys().find(|name| !is_valid_name(name)) {
            bail!(
                "Invalid config file: {}: item_http name {name:?} must be non-empty and must not contain '.'",
                path.display()
            );
        }
        log::debug!(
            "Loaded {} item_http resources from {}",
            config.item_http.len(),
            path.display()
        );
        Ok(config)
    }

    /// Desired HTTP agent items keyed by address
    pub fn http_items(&self) -> BTreeMap<String, HttpItemConfig> {
        self.item_http
            .iter()
            .map(|(name, item)| (resource::address(item_http::RESOURCE_TYPE, name), item.clone()))
            .collect()
    }

    /// Check the API section and encode every resource, collecting all errors
    pub fn validate(&self, codec: &HttpItemCodec) -> Vec<String> {
        let mut errors = Vec::new();
        if self.api.url.trim().is_empty() {
            errors.push("[api] url is not set".to_string());
        }
        for (name, item) in &self.item_http {
            if let Err(e) = codec.encode(item) {
                errors.push(format!("item_http.{name}: {e}"));
            }
        }
        errors
    }
}
