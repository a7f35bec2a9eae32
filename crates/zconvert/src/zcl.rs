//! Zigbee Cluster Library identifiers used by the converters.
//!
//! Only the clusters, attributes and data types the PTVO switch firmware
//! exposes are modelled. Names follow the strings the zigbee transport uses on
//! the wire-facing side (`genOnOff`, `switchType`, ...), vendor attributes are
//! keyed by their decimal code.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

/// Vendor attribute on `genOnOffSwitchCfg`: whether the input drives its output.
pub const ATTR_LINK_TO_OUTPUT: u16 = 0x4001;

/// Vendor attribute on `genOnOffSwitchCfg`: command sent to bound devices.
pub const ATTR_BIND_COMMAND: u16 = 0x4002;

/// A ZCL cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cluster {
    /// 0x0000
    Basic,
    /// 0x0006
    OnOff,
    /// 0x0007
    OnOffSwitchConfig,
    /// A cluster the converters do not act on
    Unknown(String),
}

impl Cluster {
    pub fn name(&self) -> &str {
        match self {
            Self::Basic => "genBasic",
            Self::OnOff => "genOnOff",
            Self::OnOffSwitchConfig => "genOnOffSwitchCfg",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Cluster {
    fn from(s: String) -> Self {
        match s.as_str() {
            "genBasic" => Self::Basic,
            "genOnOff" => Self::OnOff,
            "genOnOffSwitchCfg" => Self::OnOffSwitchConfig,
            _ => Self::Unknown(s),
        }
    }
}

impl From<Cluster> for String {
    fn from(c: Cluster) -> Self {
        c.name().to_string()
    }
}

/// An attribute within a cluster.
///
/// Standard attributes are addressed by name; vendor-specific ones by their
/// numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    OnOff,
    SwitchType,
    SwitchActions,
    ModelId,
    SwBuildId,
    PowerSource,
    Vendor(u16),
}

impl Attribute {
    /// Key under which the attribute appears in an event's data map.
    pub fn key(&self) -> String {
        match self {
            Self::OnOff => "onOff".to_string(),
            Self::SwitchType => "switchType".to_string(),
            Self::SwitchActions => "switchActions".to_string(),
            Self::ModelId => "modelId".to_string(),
            Self::SwBuildId => "swBuildId".to_string(),
            Self::PowerSource => "powerSource".to_string(),
            Self::Vendor(code) => code.to_string(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Vendor(code) => serializer.serialize_u16(*code),
            other => serializer.serialize_str(&other.key()),
        }
    }
}

/// ZCL data type tag attached to vendor attribute writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    Uint8 = 0x20,
}

impl DataType {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

/// Kind of inbound message an attribute event was carried by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    #[default]
    AttributeReport,
    ReadResponse,
}

/// Commands of the `genOnOff` cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OnOffCommand {
    On,
    Off,
    Toggle,
}
