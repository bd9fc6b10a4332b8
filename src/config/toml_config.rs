use crate::core::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::core::ConfigProvider;
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Advisor settings, usually read from a TOML file. Every section is
/// optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Usually `"${HF_TOKEN}"`.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

fn default_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            model: default_model(),
            timeout_seconds: default_timeout(),
            token: None,
        }
    }
}

impl AdvisorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content, |name| std::env::var(name).ok())?;

        toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with `lookup(VAR)`; unknown variables stay as written.
    pub fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdvisorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Token from the file, ignoring blanks and unresolved placeholders.
    pub fn token(&self) -> Option<&str> {
        self.endpoint
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains("${"))
    }

    pub fn catalog_path(&self) -> Option<&str> {
        self.catalog.as_ref().map(|c| c.path.as_str())
    }
}

impl Validate for AdvisorConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint.url", &self.endpoint.url)?;
        validation::validate_non_empty_string("endpoint.model", &self.endpoint.model)?;
        validation::validate_range(
            "endpoint.timeout_seconds",
            self.endpoint.timeout_seconds,
            1,
            600,
        )?;

        if let Some(path) = self.catalog_path() {
            validation::validate_path("catalog.path", path)?;
        }

        Ok(())
    }
}

impl ConfigProvider for AdvisorConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint.url
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_seconds)
    }
}
