//! # Configuration Module
//!
//! Explicit configuration for the dispatch layer. A [`RestConfig`] is built once at
//! startup and handed to [`Dispatcher`](crate::dispatcher::Dispatcher) and
//! [`ResponseFormatter`](crate::format::ResponseFormatter) at construction; nothing
//! reads ambient global state during a request.
//!
//! ## Sources
//!
//! - [`RestConfig::default()`] - `json` default format, `none` authenticator
//! - [`RestConfig::from_env()`] - environment overrides
//! - [`RestConfig::from_yaml_file()`] - YAML file, missing keys fall back to defaults
//!
//! ## Environment Variables
//!
//! ### `REST_DEFAULT_EXTENSION`
//!
//! Extension of the format used when a request carries no extension, `Accept`
//! or `Content-Type` hint. Default: `json`.
//!
//! ### `REST_AUTHENTICATOR`
//!
//! Identifier of the authenticator resolved through the
//! [`AuthenticatorRegistry`](crate::security::AuthenticatorRegistry).
//! Default: `none`.
//!
//! ## Example Configuration
//!
//! ```yaml
//! default_extension: json
//! authenticator: header-token
//! tokens:
//!   s3cr3t: editor
//! ```

use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Extension used when nothing else selects a format
pub const DEFAULT_EXTENSION: &str = "json";

/// Authenticator used when none is configured
pub const DEFAULT_AUTHENTICATOR: &str = "none";

/// Dispatch-layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Extension of the fallback format (default: `json`)
    pub default_extension: String,
    /// Authenticator identifier (default: `none`)
    pub authenticator: String,
    /// Static token → principal id map used by the `header-token` authenticator
    pub tokens: HashMap<String, String>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            default_extension: DEFAULT_EXTENSION.to_string(),
            authenticator: DEFAULT_AUTHENTICATOR.to_string(),
            tokens: HashMap::new(),
        }
    }
}

impl RestConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(ext) = env::var("REST_DEFAULT_EXTENSION") {
            let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() {
                config.default_extension = ext;
            }
        }
        if let Ok(auth) = env::var("REST_AUTHENTICATOR") {
            let auth = auth.trim();
            if !auth.is_empty() {
                config.authenticator = auth.to_string();
            }
        }
        config
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`validate`](Self::validate).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: RestConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.default_extension = config
            .default_extension
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase();
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that must hold before the config is used.
    ///
    /// # Errors
    ///
    /// Fails when the default extension or authenticator id is empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_extension.is_empty() {
            bail!("default_extension must not be empty");
        }
        if self.authenticator.trim().is_empty() {
            bail!("authenticator must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RestConfig::default();
        assert_eq!(config.default_extension, "json");
        assert_eq!(config.authenticator, "none");
        assert!(config.tokens.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_extension: .YAML").unwrap();
        let config = RestConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.default_extension, "yaml");
        assert_eq!(config.authenticator, "none");
    }

    #[test]
    fn test_yaml_tokens() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "authenticator: header-token\ntokens:\n  abc123: editor\n"
        )
        .unwrap();
        let config = RestConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.authenticator, "header-token");
        assert_eq!(config.tokens.get("abc123").map(String::as_str), Some("editor"));
    }

    #[test]
    fn test_empty_extension_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_extension: \"\"").unwrap();
        assert!(RestConfig::from_yaml_file(file.path()).is_err());
    }
}
