// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::constants::{DEFAULT_HEIGHT_PARAM, DEFAULT_SOURCE_PARAM, DEFAULT_WIDTH_PARAM};
use crate::image_optimizer::ImageConfig;

pub mod server;

pub use server::ServerConfig;

/// Immutable proxy configuration, built once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub params: ParamNames,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Query-string keys the proxy reads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamNames {
    #[serde(default = "default_source_param")]
    pub source: String,
    #[serde(default = "default_width_param")]
    pub width: String,
    #[serde(default = "default_height_param")]
    pub height: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            source: default_source_param(),
            width: default_width_param(),
            height: default_height_param(),
        }
    }
}

fn default_source_param() -> String {
    DEFAULT_SOURCE_PARAM.to_string()
}

fn default_width_param() -> String {
    DEFAULT_WIDTH_PARAM.to_string()
}

fn default_height_param() -> String {
    DEFAULT_HEIGHT_PARAM.to_string()
}

/// Log output format
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.listen.trim().is_empty() {
            return Err("server.listen cannot be empty".to_string());
        }

        let names = [
            ("params.source", &self.params.source),
            ("params.width", &self.params.width),
            ("params.height", &self.params.height),
        ];
        let mut seen = HashSet::new();
        for (field, name) in names {
            if name.is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
            if !seen.insert(name.as_str()) {
                return Err(format!(
                    "Duplicate query parameter name '{}' in {}",
                    name, field
                ));
            }
        }

        self.image.validate()
    }
}
