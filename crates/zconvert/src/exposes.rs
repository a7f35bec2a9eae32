//! Declarative feature list handed to the presentation side.

use serde::Serialize;

use crate::device::DeviceDefinition;
use crate::router::ChannelRole;
use crate::router::SensorKind;
use crate::to_zigbee::ConfigKey;

/// Feature access bits.
pub mod access {
    /// Published in state updates
    pub const STATE: u8 = 0b001;
    /// Can be set
    pub const SET: u8 = 0b010;
    /// Can be refreshed on demand
    pub const GET: u8 = 0b100;
    pub const ALL: u8 = STATE | SET | GET;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expose {
    Switch {
        endpoint: String,
        property: String,
        value_on: &'static str,
        value_off: &'static str,
        value_toggle: &'static str,
        access: u8,
    },
    Binary {
        name: SensorKind,
        endpoint: String,
        property: String,
        value_on: bool,
        value_off: bool,
        access: u8,
    },
    Enum {
        name: ConfigKey,
        endpoint: String,
        property: String,
        values: Vec<&'static str>,
        access: u8,
    },
}

impl Expose {
    pub fn property(&self) -> &str {
        match self {
            Self::Switch { property, .. }
            | Self::Binary { property, .. }
            | Self::Enum { property, .. } => property,
        }
    }
}

/// The four switch settings of one channel, each with its labels in code
/// order.
pub fn switch_config_features(channel: &str) -> Vec<Expose> {
    ConfigKey::ALL
        .iter()
        .map(|&key| Expose::Enum {
            name: key,
            endpoint: channel.to_string(),
            property: format!("{}_{}", key, channel),
            values: key.table().sorted_labels(),
            access: access::ALL,
        })
        .collect()
}

/// Every feature of a device: state features for exposed channels followed
/// by the switch settings of config channels.
pub fn exposes(definition: &DeviceDefinition) -> Vec<Expose> {
    let mut features = Vec::new();

    for name in &definition.exposed_channels {
        let Some(channel) = definition.router.channel(name) else {
            continue;
        };
        features.push(match channel.role {
            ChannelRole::Switch => Expose::Switch {
                endpoint: channel.name.clone(),
                property: channel.state_property(),
                value_on: "ON",
                value_off: "OFF",
                value_toggle: "TOGGLE",
                access: access::ALL,
            },
            ChannelRole::BinarySensor(kind) => Expose::Binary {
                name: kind,
                endpoint: channel.name.clone(),
                property: channel.state_property(),
                value_on: true,
                value_off: false,
                access: access::STATE,
            },
        });
    }

    for name in &definition.config_channels {
        features.extend(switch_config_features(name));
    }

    features
}
