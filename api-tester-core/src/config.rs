use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{ConsoleError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "api-tester.toml";
pub const DEFAULT_BASE_URL: &str = "https://api.regulon.io/public_api/v1";
pub const TOKEN_ENV: &str = "REGULON_API_TOKEN";
pub const BASE_URL_ENV: &str = "REGULON_BASE_URL";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Pre-issued bearer credential. Never validated locally.
    pub token: Option<String>,
    pub user_agent: String,
}

// Redacts the credential.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_agent: format!("api-tester/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Bearer credential as sent on the wire; empty when none is configured
    pub fn bearer_token(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }

    /// Base URL without trailing slashes, ready for path concatenation
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl ConsoleConfig {
    /// Load `api-tester.toml` from the working directory (defaults if it
    /// is absent), then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::warn!("{} not found, using defaults", DEFAULT_CONFIG_FILE);
            ConsoleConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicitly named config file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConsoleError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| ConsoleError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides keyed by the environment variable names
    /// (`REGULON_API_TOKEN`, `REGULON_BASE_URL`) from any lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.api.token = Some(token);
        }
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.api.base_url = base_url.trim().to_string();
            }
        }
    }
}
