#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

use crate::utils::error::{AlertError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub use file::ConfigFile;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUIRED_PACKAGES: &[&str] = &["flask", "twilio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(AlertError::InvalidConfigValueError {
                field: "log_format".to_string(),
                value: other.to_string(),
                reason: "Supported formats: compact, json".to_string(),
            }),
        }
    }
}

/// Values given explicitly on the command line. They win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
    pub verbose: bool,
    pub required_packages: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub verbose: bool,
    pub required_packages: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::default(),
            verbose: false,
            required_packages: DEFAULT_REQUIRED_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration from the process environment.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// 依序套用: 預設值 -> 設定檔 -> 環境變數 -> CLI
    pub fn resolve<F>(overrides: &ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = &overrides.config_path {
            let file = ConfigFile::from_file(path)?;
            file.apply_to(&mut config);
            tracing::debug!("Loaded config file {}", path.display());
        }

        if let Some(host) = env("HOST") {
            config.host = host;
        }
        if let Some(raw_port) = env("PORT") {
            config.port = validation::parse_port("port", &raw_port)?;
        }
        if let Some(raw_format) = env("LOG_FORMAT") {
            config.log_format = raw_format.parse()?;
        }

        if let Some(host) = &overrides.host {
            config.host = host.clone();
        }
        if let Some(port) = overrides.port {
            config.port = port;
        }
        if let Some(format) = overrides.log_format {
            config.log_format = format;
        }
        if let Some(packages) = &overrides.required_packages {
            config.required_packages = packages.clone();
        }
        config.verbose = config.verbose || overrides.verbose;

        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_host("host", &self.host)?;
        validation::validate_package_names("required_packages", &self.required_packages)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_container_contract() {
        let config = ServerConfig::resolve(&ConfigOverrides::default(), env_from(&[])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.required_packages, vec!["flask", "twilio"]);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_port_from_env() {
        let config =
            ServerConfig::resolve(&ConfigOverrides::default(), env_from(&[("PORT", "5000")]))
                .unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_non_numeric_port_fails() {
        let err = ServerConfig::resolve(&ConfigOverrides::default(), env_from(&[("PORT", "http")]))
            .unwrap_err();

        match err {
            AlertError::InvalidConfigValueError { field, value, .. } => {
                assert_eq!(field, "port");
                assert_eq!(value, "http");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cli_wins_over_env() {
        let overrides = ConfigOverrides {
            port: Some(9090),
            host: Some("127.0.0.1".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(
            &overrides,
            env_from(&[("PORT", "5000"), ("HOST", "10.0.0.1")]),
        )
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[server]
host = "127.0.0.1"
port = 7000
log_format = "json"

[recipe]
required_packages = ["flask"]
"#,
            )
            .unwrap();

        let overrides = ConfigOverrides {
            config_path: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&overrides, env_from(&[("PORT", "7100")])).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7100);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.required_packages, vec!["flask"]);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_ipv6_bind_address() {
        let config = ServerConfig {
            host: "::".to_string(),
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "[::]:8080");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let overrides = ConfigOverrides {
            host: Some("not a host".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(&overrides, env_from(&[])).is_err());
    }
}
