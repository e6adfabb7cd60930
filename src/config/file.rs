use crate::config::{LogFormat, ServerConfig};
use crate::utils::error::{AlertError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerSection>,
    pub recipe: Option<RecipeSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeSection {
    pub required_packages: Option<Vec<String>>,
}

impl ConfigFile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AlertError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    pub fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(server) = &self.server {
            if let Some(host) = &server.host {
                config.host = host.clone();
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(format) = server.log_format {
                config.log_format = format;
            }
            if let Some(verbose) = server.verbose {
                config.verbose = verbose;
            }
        }

        if let Some(packages) = self
            .recipe
            .as_ref()
            .and_then(|r| r.required_packages.as_ref())
        {
            config.required_packages = packages.clone();
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

/// 替換環境變數 (例如 ${PORT})
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
