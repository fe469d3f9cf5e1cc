use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{Instance, ItemKind};

const REDACTED: &str = "********";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub library: LibraryConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// Connection details for the media-library server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_trash_directory")]
    pub trash_directory: PathBuf,
    #[serde(default = "default_report_directory")]
    pub report_directory: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trash_directory: default_trash_directory(),
            report_directory: default_report_directory(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    pub kind: ItemKind,
    pub url: String,
    pub api_key: String,
    pub library_section: String,
}

fn default_trash_directory() -> PathBuf {
    PathBuf::from("./trash")
}

fn default_report_directory() -> PathBuf {
    PathBuf::from(".")
}

/// Load configuration from `path` (or an optional `Config.toml` in the working
/// directory), layered with `RECONCILER__*` environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, Error> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("RECONCILER").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.url.trim().is_empty() {
            return Err(ConfigError::Message("library.url must not be empty".into()));
        }
        if self.instances.is_empty() {
            return Err(ConfigError::Message(
                "at least one [[instances]] entry is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            if instance.url.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "instance '{}' has an empty url",
                    instance.name
                )));
            }
            if !seen.insert(instance.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate instance name '{}'",
                    instance.name
                )));
            }
        }
        Ok(())
    }

    /// Instances in configuration order.
    pub fn instances(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|i| Instance {
                name: i.name.clone(),
                base_url: i.url.trim_end_matches('/').to_string(),
                api_key: i.api_key.clone(),
                library_section: i.library_section.clone(),
                kind: i.kind,
            })
            .collect()
    }

    /// Copy with every credential masked, for printing.
    pub fn redacted(&self) -> AppConfig {
        let mut copy = self.clone();
        copy.library.token = REDACTED.to_string();
        for instance in &mut copy.instances {
            instance.api_key = REDACTED.to_string();
        }
        copy
    }
}
