use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "hotels-xml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Document and schema references: filesystem paths or http(s) URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_document")]
    pub document: String,
    #[serde(default = "default_error_document")]
    pub error_document: String,
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            error_document: default_error_document(),
            schema: default_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_document() -> String {
    "Hotels.xml".to_string()
}

fn default_error_document() -> String {
    "HotelsErrors.xml".to_string()
}

fn default_schema() -> String {
    "Hotels.xsd".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Location of the persisted configuration file.
pub fn path() -> Result<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).context("Failed to locate app config")
}
