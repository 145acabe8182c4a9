//! Server configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use verinews_classifiers::prediction::DEFAULT_PREVIEW_CHARS;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the model artifact
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Content characters echoed back in prediction responses
    #[serde(default = "default_preview_chars")]
    pub content_preview_chars: usize,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors_allow_any_origin: bool,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model_dir) = &cli.model_dir {
            config.model_dir = PathBuf::from(model_dir);
        }

        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.listen, self.port).parse()?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            listen: default_listen(),
            port: default_port(),
            content_preview_chars: default_preview_chars(),
            cors_allow_any_origin: false,
        }
    }
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = ServerConfig::load("does-not-exist.yaml", &Cli::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
        assert_eq!(config.content_preview_chars, 200);
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(&path, "model_dir: /srv/model\nport: 9000\ncontent_preview_chars: 50\n")
            .unwrap();
        let path = path.to_str().unwrap();

        let config = ServerConfig::load(path, &Cli::default()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/srv/model"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.content_preview_chars, 50);
        assert_eq!(config.listen, "127.0.0.1");

        let cli = Cli {
            model_dir: Some("other".to_string()),
            listen: Some("0.0.0.0".to_string()),
            port: Some(8080),
            ..Cli::default()
        };
        let config = ServerConfig::load(path, &cli).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("other"));
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.content_preview_chars, 50);
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = ServerConfig {
            listen: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
