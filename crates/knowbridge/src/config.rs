//! Layered configuration.
//!
//! Defaults, then an optional TOML file, then `KNOWBRIDGE__*` environment
//! variables (double underscore separates sections, e.g.
//! `KNOWBRIDGE__SERVER__PORT=9000`).

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "knowbridge";

/// Default knowledge service API root.
pub const DEFAULT_BASE_URL: &str = "https://knowledge.mongodb.com/api/v1";

/// Model name reported to chat clients.
pub const DEFAULT_MODEL: &str = "mongodb-1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8800,
        }
    }
}

/// Knowledge service connection settings.
///
/// The header fields make requests look like they come from the documentation
/// site's embedded chat widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Model name echoed in every chat-completion chunk
    pub model: String,
    pub user_agent: String,
    pub accept_language: String,
    pub referer: String,
    pub origin: String,
    /// Value of the `x-request-origin` header
    pub request_origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            user_agent:
                "Mozilla/5.0 (X11; Linux x86_64; rv:130.0) Gecko/20100101 Firefox/130.0"
                    .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            referer: "https://www.mongodb.com/".to_string(),
            origin: "https://www.mongodb.com".to_string(),
            request_origin:
                "https://www.mongodb.com/docs/manual/reference/method/db.collection.findAndModify/"
                    .to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Base URL with any trailing slashes removed.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Resolved on-disk locations.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_file: PathBuf,
}

impl AppPaths {
    pub fn discover(override_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join("config.toml")
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join("config.toml"),
        };

        if config_file.parent().is_none() {
            return Err(anyhow!("invalid config file path: {config_file:?}"));
        }

        Ok(Self { config_file })
    }
}

/// Load configuration from defaults, `path` (if it exists) and the process
/// environment.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    load_config_with_env(path, None)
}

/// Like [`load_config`], but reads overrides from `env` instead of the process
/// environment when given.
pub fn load_config_with_env(
    path: &Path,
    env: Option<HashMap<String, String>>,
) -> Result<AppConfig> {
    let env_prefix = env_prefix();
    let built = Config::builder()
        .set_default("logging.level", "info")?
        .add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix(env_prefix.as_str())
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .with_context(|| format!("reading configuration from {}", path.display()))?;

    let config: AppConfig = built
        .try_deserialize()
        .context("deserializing configuration")?;
    Ok(config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = default_config_header(path);
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn default_config_header(path: &Path) -> String {
    let mut buffer = String::new();
    buffer.push_str("# Configuration for ");
    buffer.push_str(APP_NAME);
    buffer.push('\n');
    buffer.push_str("# File: ");
    buffer.push_str(&path.display().to_string());
    buffer.push('\n');
    buffer.push('\n');
    buffer
}

fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(dir);
        path.push(APP_NAME);
        return Ok(path);
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
