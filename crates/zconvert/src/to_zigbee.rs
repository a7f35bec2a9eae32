//! Outbound conversion: configuration commands into attribute writes, reads
//! and cluster commands.
//!
//! Nothing here targets an endpoint on its own. Property-addressed helpers
//! resolve the channel suffix to the endpoint the transport must address and
//! hand it back alongside the request.

use serde::ser::SerializeMap;
use serde::ser::SerializeStruct;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

use crate::enums::EnumTable;
use crate::enums::BIND_COMMANDS;
use crate::enums::INPUT_LINK;
use crate::enums::SWITCH_ACTIONS;
use crate::enums::SWITCH_TYPES;
use crate::router::Channel;
use crate::router::ChannelRole;
use crate::router::Router;
use crate::zcl::Attribute;
use crate::zcl::Cluster;
use crate::zcl::DataType;
use crate::zcl::OnOffCommand;
use crate::zcl::ATTR_BIND_COMMAND;
use crate::zcl::ATTR_LINK_TO_OUTPUT;

/// The closed set of configurable switch settings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigKey {
    SwitchType,
    SwitchActions,
    LinkToOutput,
    BindCommand,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::SwitchType,
        ConfigKey::SwitchActions,
        ConfigKey::LinkToOutput,
        ConfigKey::BindCommand,
    ];

    pub fn table(self) -> &'static EnumTable {
        match self {
            Self::SwitchType => &SWITCH_TYPES,
            Self::SwitchActions => &SWITCH_ACTIONS,
            Self::LinkToOutput => &INPUT_LINK,
            Self::BindCommand => &BIND_COMMANDS,
        }
    }

    pub fn attribute(self) -> Attribute {
        match self {
            Self::SwitchType => Attribute::SwitchType,
            Self::SwitchActions => Attribute::SwitchActions,
            Self::LinkToOutput => Attribute::Vendor(ATTR_LINK_TO_OUTPUT),
            Self::BindCommand => Attribute::Vendor(ATTR_BIND_COMMAND),
        }
    }

    /// Vendor attributes need an explicit type tag; standard ones do not.
    pub fn data_type(self) -> Option<DataType> {
        match self {
            Self::SwitchType | Self::SwitchActions => None,
            Self::LinkToOutput | Self::BindCommand => Some(DataType::Uint8),
        }
    }
}

/// Value side of a configuration command: a table label or a raw number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Label(String),
    Number(i64),
}

impl ConfigValue {
    /// Accepts JSON strings and numbers; fractional numbers are truncated.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Label(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(Self::Number),
            _ => None,
        }
    }

    /// Read a command-line value: JSON first (`3`, `2.5`, `"toggle"`), then
    /// the raw text as a label.
    pub fn from_arg(arg: &str) -> Self {
        serde_json::from_str::<Value>(arg)
            .ok()
            .and_then(|value| Self::from_json(&value))
            .unwrap_or_else(|| Self::Label(arg.to_string()))
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCommand {
    pub key: ConfigKey,
    pub value: ConfigValue,
}

/// One attribute of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeWrite {
    pub attribute: Attribute,
    pub value: i64,
    pub data_type: Option<DataType>,
}

/// Attribute write handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePayload {
    pub cluster: Cluster,
    pub attributes: Vec<AttributeWrite>,
}

struct AttributeMap<'a>(&'a [AttributeWrite]);

impl Serialize for AttributeMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for write in self.0 {
            match write.data_type {
                Some(data_type) => map.serialize_entry(
                    &write.attribute.key(),
                    &serde_json::json!({ "value": write.value, "type": data_type.tag() }),
                )?,
                None => map.serialize_entry(&write.attribute.key(), &write.value)?,
            }
        }
        map.end()
    }
}

impl Serialize for WritePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("WritePayload", 2)?;
        s.serialize_field("cluster", &self.cluster)?;
        s.serialize_field("payload", &AttributeMap(&self.attributes))?;
        s.end()
    }
}

/// Attribute read handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRequest {
    pub cluster: Cluster,
    pub attributes: Vec<Attribute>,
}

/// Cluster-specific command handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterCommand {
    pub cluster: Cluster,
    pub command: OnOffCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Write(WritePayload),
    Read(ReadRequest),
    Command(ClusterCommand),
}

/// A request together with the endpoint it must be delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedRequest {
    pub channel: String,
    pub endpoint: u8,
    pub request: Request,
}

/// What a property name addresses on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    State,
    Config(ConfigKey),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

/// Encode a configuration command into the attribute write the firmware
/// expects.
pub fn encode(command: &ConfigCommand) -> Result<WritePayload, EncodeError> {
    let key = command.key;
    let value = match &command.value {
        ConfigValue::Label(label) => key.table().encode(label),
        ConfigValue::Number(n) => Some(*n),
    }
    .ok_or_else(|| EncodeError::InvalidValue {
        key: key.to_string(),
        value: command.value.to_string(),
    })?;

    Ok(WritePayload {
        cluster: Cluster::OnOffSwitchConfig,
        attributes: vec![AttributeWrite {
            attribute: key.attribute(),
            value,
            data_type: key.data_type(),
        }],
    })
}

/// Refresh read for a configuration key.
///
/// Every key triggers the same combined read of all four switch settings, so
/// one round trip refreshes the whole channel.
pub fn encode_read(_key: ConfigKey) -> ReadRequest {
    ReadRequest {
        cluster: Cluster::OnOffSwitchConfig,
        attributes: ConfigKey::ALL.iter().map(|k| k.attribute()).collect(),
    }
}

/// Encode an `ON` / `OFF` / `TOGGLE` state command.
pub fn encode_state(value: &ConfigValue) -> Result<ClusterCommand, EncodeError> {
    let invalid = || EncodeError::InvalidValue {
        key: "state".to_string(),
        value: value.to_string(),
    };
    let command = match value {
        ConfigValue::Label(label) => label.parse::<OnOffCommand>().map_err(|_| invalid())?,
        ConfigValue::Number(_) => return Err(invalid()),
    };
    Ok(ClusterCommand {
        cluster: Cluster::OnOff,
        command,
    })
}

/// Split a property such as `switch_type_l3` into its target and channel.
///
/// Every channel whose name ends the property is tried, so channel names that
/// are suffixes of one another do not shadow each other.
pub fn parse_property<'r>(
    router: &'r Router,
    property: &str,
) -> Result<(Target, &'r Channel), EncodeError> {
    router
        .channels()
        .iter()
        .filter_map(|c| {
            property
                .strip_suffix(c.name.as_str())
                .and_then(|rest| rest.strip_suffix('_'))
                .map(|prefix| (prefix, c))
        })
        .find_map(|(prefix, channel)| {
            let target = match prefix {
                "state" if channel.role == ChannelRole::Switch => Target::State,
                "state" => return None,
                key => Target::Config(key.parse::<ConfigKey>().ok()?),
            };
            Some((target, channel))
        })
        .ok_or_else(|| EncodeError::UnknownProperty(property.to_string()))
}

/// Encode a property-addressed set, e.g. `bind_command_l3 = "recall scene 3"`.
pub fn encode_set(
    router: &Router,
    property: &str,
    value: &ConfigValue,
) -> Result<RoutedRequest, EncodeError> {
    let (target, channel) = parse_property(router, property)?;
    let request = match target {
        Target::State => Request::Command(encode_state(value)?),
        Target::Config(key) => Request::Write(encode(&ConfigCommand {
            key,
            value: value.clone(),
        })?),
    };
    Ok(RoutedRequest {
        channel: channel.name.clone(),
        endpoint: channel.endpoint,
        request,
    })
}

/// Encode a property-addressed refresh.
pub fn encode_get(router: &Router, property: &str) -> Result<RoutedRequest, EncodeError> {
    let (target, channel) = parse_property(router, property)?;
    let request = match target {
        Target::State => ReadRequest {
            cluster: Cluster::OnOff,
            attributes: vec![Attribute::OnOff],
        },
        Target::Config(key) => encode_read(key),
    };
    Ok(RoutedRequest {
        channel: channel.name.clone(),
        endpoint: channel.endpoint,
        request: Request::Read(request),
    })
}
