//! Persistent configuration
//!
//! Loaded from TOML at `~/.config/awlights/config.toml` unless another path
//! is given. Every field has a default, so partial files are fine.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::daemon::codec::Encoding;

/// Default daemon port
pub const DEFAULT_PORT: u16 = 6587;

/// Log message shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Level, target and message
    #[default]
    Simple,
    /// Adds timestamps, thread names, file and line
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub encoding: Encoding,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            encoding: Encoding::Utf8,
        }
    }
}

impl DaemonConfig {
    /// Resolve `host:port` into a socket address
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        use std::net::ToSocketAddrs;
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .with_context(|| format!("Cannot resolve {}:{}", self.host, self.port))
    }
}

/// Defaults applied to `send` when no flag overrides them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub override_groups: bool,
    pub speed: u32,
    pub save: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub daemon: DaemonConfig,
    pub lights: LightsConfig,
}

impl AppConfig {
    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("awlights")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("port = 6587"));
        assert!(toml_str.contains("encoding = \"utf-8\""));
        assert!(toml_str.contains("format = \"simple\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [daemon]
            encoding = "latin-1"

            [lights]
            override_groups = true
            "#,
        )
        .unwrap();
        assert_eq!(config.daemon.encoding, Encoding::Latin1);
        assert_eq!(config.daemon.port, DEFAULT_PORT);
        assert_eq!(config.daemon.host, "127.0.0.1");
        assert!(config.lights.override_groups);
        assert_eq!(config.lights.speed, 0);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = AppConfig::default();
        config.log.format = LogFormat::Verbose;
        config.lights.speed = 0xC000;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(toml::from_str::<AppConfig>("[log]\nformat = \"fancy\"").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("awlights-does-not-exist.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_daemon_addr() {
        let addr = DaemonConfig::default().addr().unwrap();
        assert_eq!(addr.port(), 6587);
        assert!(addr.ip().is_loopback());
    }
}
