//! Tunnel configuration

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{TunnelError, TunnelResult};

/// Main tunnel configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TunnelConfig {
    /// HTTP bind address
    pub bind_address: String,

    /// Serve the diagnostic page when required parameters are missing.
    /// When off, such requests get an error frame instead.
    pub allow_test_menu: bool,

    /// Database host used when the request sends an empty `host`
    pub default_host: String,

    /// Database port used when the request sends an empty `port`
    pub default_port: u16,

    /// Leading keywords that mark a statement as a result-set read
    pub read_keywords: Vec<String>,

    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            allow_test_menu: true,
            default_host: "localhost".to_string(),
            default_port: 3306,
            read_keywords: vec!["SELECT".to_string()],
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl TunnelConfig {
    /// Create a new configuration builder
    pub fn builder() -> TunnelConfigBuilder {
        TunnelConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> TunnelResult<Self> {
        toml::from_str(content).map_err(|e| TunnelError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> TunnelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TunnelError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Default config file location: `<config dir>/ntunnel/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ntunnel").join("config.toml"))
    }

    /// Load the default config file if it exists, otherwise use defaults.
    pub fn discover() -> TunnelResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Builder for TunnelConfig
#[derive(Debug, Default)]
pub struct TunnelConfigBuilder {
    config: TunnelConfig,
}

impl TunnelConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: TunnelConfig) -> Self {
        Self { config }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_address = addr.into();
        self
    }

    /// Enable or disable the diagnostic page
    pub fn test_menu(mut self, enabled: bool) -> Self {
        self.config.allow_test_menu = enabled;
        self
    }

    /// Set the fallback database host
    pub fn default_host(mut self, host: impl Into<String>) -> Self {
        self.config.default_host = host.into();
        self
    }

    /// Set the fallback database port
    pub fn default_port(mut self, port: u16) -> Self {
        self.config.default_port = port;
        self
    }

    /// Add a keyword that marks a statement as a read
    pub fn read_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.read_keywords.push(keyword.into());
        self
    }

    /// Set the request body limit
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TunnelConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TunnelConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert!(config.allow_test_menu);
        assert_eq!(config.default_port, 3306);
        assert_eq!(config.read_keywords, vec!["SELECT".to_string()]);
        assert_eq!(config.max_body_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TunnelConfig::from_toml(
            r#"
            allow_test_menu = false
            read_keywords = ["SELECT", "SHOW"]
            max_body_bytes = 67108864
            "#,
        )
        .unwrap();

        assert!(!config.allow_test_menu);
        assert_eq!(config.read_keywords, vec!["SELECT".to_string(), "SHOW".to_string()]);
        assert_eq!(config.max_body_bytes, 64 * 1024 * 1024);
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.default_host, "localhost");
    }

    #[test]
    fn test_invalid_toml() {
        let err = TunnelConfig::from_toml("default_port = \"nope\"").unwrap_err();
        assert!(matches!(err, TunnelError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = TunnelConfig::builder()
            .bind("127.0.0.1:9000")
            .test_menu(false)
            .default_port(3307)
            .read_keyword("SHOW")
            .build();

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert!(!config.allow_test_menu);
        assert_eq!(config.default_port, 3307);
        assert_eq!(config.read_keywords.len(), 2);
    }
}
