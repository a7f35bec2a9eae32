//! Device definitions and the registry they are looked up in.
//!
//! Built-in definitions register themselves into [`DEVICE_REGISTRY`] at link
//! time; configuration can add more (see `Config::registry`).

mod diyruz_ws;

use std::sync::Arc;

use linkme::distributed_slice;

use crate::router::DefinitionError;
use crate::router::Router;
use crate::to_zigbee::ReadRequest;
use crate::zcl::Attribute;
use crate::zcl::Cluster;

/// Endpoint the configure read is sent to.
pub const CONFIGURE_ENDPOINT: u8 = 1;

/// Result type for built-in definition factories
pub type DefinitionFactoryResult = Result<DeviceDefinition, DefinitionError>;

#[distributed_slice]
pub static DEVICE_REGISTRY: [fn() -> DefinitionFactoryResult];

/// Static description of one device model.
#[derive(Debug, Clone)]
pub struct DeviceDefinition {
    pub model: String,
    pub vendor: String,
    pub description: String,
    pub router: Router,

    /// Channels presented as switches or binary sensors
    pub exposed_channels: Vec<String>,

    /// Channels carrying `genOnOffSwitchCfg` settings
    pub config_channels: Vec<String>,
}

impl DeviceDefinition {
    pub fn new(
        model: impl Into<String>,
        vendor: impl Into<String>,
        description: impl Into<String>,
        router: Router,
        exposed_channels: Vec<String>,
        config_channels: Vec<String>,
    ) -> Result<Self, DefinitionError> {
        for name in exposed_channels.iter().chain(config_channels.iter()) {
            if router.channel(name).is_none() {
                return Err(DefinitionError::UnknownConfigChannel(name.clone()));
            }
        }

        Ok(Self {
            model: model.into(),
            vendor: vendor.into(),
            description: description.into(),
            router,
            exposed_channels,
            config_channels,
        })
    }

    /// Read issued once when the device joins.
    pub fn configure_request(&self) -> ReadRequest {
        ReadRequest {
            cluster: Cluster::Basic,
            attributes: vec![
                Attribute::ModelId,
                Attribute::SwBuildId,
                Attribute::PowerSource,
            ],
        }
    }
}

/// Lookup of device definitions by model id.
#[derive(Debug, Default)]
pub struct Registry {
    devices: Vec<Arc<DeviceDefinition>>,
}

impl Registry {
    /// Registry holding every built-in definition.
    ///
    /// Fails if any built-in table is malformed.
    pub fn builtin() -> Result<Self, DefinitionError> {
        let mut registry = Self::default();
        for factory in DEVICE_REGISTRY {
            registry.add(factory()?);
        }
        Ok(registry)
    }

    /// Add a definition, replacing any existing one with the same model id.
    pub fn add(&mut self, definition: DeviceDefinition) {
        self.devices.retain(|d| d.model != definition.model);
        self.devices.push(Arc::new(definition));
    }

    pub fn find(&self, model: &str) -> Option<Arc<DeviceDefinition>> {
        self.devices.iter().find(|d| d.model == model).cloned()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|d| d.model.as_str())
    }
}
