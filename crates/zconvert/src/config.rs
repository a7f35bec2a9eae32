use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

use crate::device::DeviceDefinition;
use crate::device::Registry;
use crate::router::DefinitionError;
use crate::router::Router;
use crate::router::SensorKind;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,
}

/// A device model declared in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub model: String,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub description: String,

    /// Logical channel name to endpoint id
    pub endpoints: BTreeMap<String, u8>,

    #[serde(default)]
    pub binary_endpoints: BTreeMap<String, SensorKind>,

    /// Defaults to every channel
    #[serde(default)]
    pub exposed_channels: Option<Vec<String>>,

    /// Defaults to none
    #[serde(default)]
    pub config_channels: Option<Vec<String>>,
}

impl DeviceConfig {
    /// Validate and build the definition. Channels are ordered by endpoint id.
    pub fn to_definition(&self) -> Result<DeviceDefinition, DefinitionError> {
        let mut endpoints: Vec<(&String, u8)> =
            self.endpoints.iter().map(|(name, &ep)| (name, ep)).collect();
        endpoints.sort_by_key(|&(_, ep)| ep);

        let router = Router::new(
            endpoints.iter().map(|&(name, ep)| (name.clone(), ep)),
            self.binary_endpoints
                .iter()
                .map(|(name, &kind)| (name.clone(), kind)),
        )?;

        let exposed = match &self.exposed_channels {
            Some(channels) => channels.clone(),
            None => router.channels().iter().map(|c| c.name.clone()).collect(),
        };

        DeviceDefinition::new(
            self.model.clone(),
            self.vendor.clone(),
            self.description.clone(),
            router,
            exposed,
            self.config_channels.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid device {model}: {source}")]
    Definition {
        model: String,
        #[source]
        source: DefinitionError,
    },
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Built-in definitions plus configured ones. A configured model id
    /// replaces the built-in definition of the same name.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::builtin().map_err(|source| ConfigError::Definition {
            model: "<builtin>".to_string(),
            source,
        })?;

        for device in &self.devices {
            let definition = device
                .to_definition()
                .map_err(|source| ConfigError::Definition {
                    model: device.model.clone(),
                    source,
                })?;
            registry.add(definition);
        }

        Ok(registry)
    }
}
