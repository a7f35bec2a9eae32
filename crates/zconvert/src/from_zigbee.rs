//! Inbound conversion: attribute reports and read responses into properties.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

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
use crate::zcl::MessageKind;
use crate::zcl::ATTR_BIND_COMMAND;
use crate::zcl::ATTR_LINK_TO_OUTPUT;

/// A single attribute report or read response delivered by the transport.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeEvent {
    pub cluster: Cluster,

    #[serde(default, rename = "type")]
    pub kind: MessageKind,

    /// Numeric endpoint the message arrived on
    pub endpoint: u8,

    /// Attribute key -> raw value, keyed as by [`Attribute::key`]
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
}

impl AttributeEvent {
    pub fn new(cluster: Cluster, kind: MessageKind, endpoint: u8) -> Self {
        Self {
            cluster,
            kind,
            endpoint,
            data: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, attribute: Attribute, value: impl Into<Value>) -> Self {
        self.data.insert(attribute.key(), value.into());
        self
    }

    /// Raw value of an attribute. Explicit nulls count as absent.
    pub fn get(&self, attribute: Attribute) -> Option<&Value> {
        self.data.get(&attribute.key()).filter(|v| !v.is_null())
    }
}

/// Flat property-name -> value map produced from one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyPatch(BTreeMap<String, Value>);

impl PropertyPatch {
    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.0.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.0.contains_key(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// On/off state of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffDecoded {
    pub channel: Channel,
    pub on: bool,
}

/// Switch configuration of one channel. Fields the event did not carry, or
/// carried with an unrecognised code, are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwitchConfigDecoded {
    pub channel: String,
    pub switch_type: Option<&'static str>,
    pub switch_actions: Option<&'static str>,
    pub link_to_output: Option<&'static str>,
    pub bind_command: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    OnOff(OnOffDecoded),
    SwitchConfig(SwitchConfigDecoded),
    /// Nothing to report for this event
    Ignored,
}

impl From<Decoded> for PropertyPatch {
    fn from(decoded: Decoded) -> Self {
        let mut patch = PropertyPatch::default();
        match decoded {
            Decoded::OnOff(OnOffDecoded { channel, on }) => {
                let property = channel.state_property();
                match channel.role {
                    ChannelRole::Switch => patch.insert(property, if on { "ON" } else { "OFF" }),
                    ChannelRole::BinarySensor(_) => patch.insert(property, on),
                }
            }
            Decoded::SwitchConfig(config) => {
                let fields = [
                    ("switch_type", config.switch_type),
                    ("switch_actions", config.switch_actions),
                    ("link_to_output", config.link_to_output),
                    ("bind_command", config.bind_command),
                ];
                for (name, label) in fields {
                    if let Some(label) = label {
                        patch.insert(format!("{}_{}", name, config.channel), label);
                    }
                }
            }
            Decoded::Ignored => {}
        }
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{cluster} message from endpoint {endpoint} which maps to no channel")]
    UnknownEndpoint { cluster: Cluster, endpoint: u8 },
}

/// Decode an event into its typed result.
pub fn decode(router: &Router, event: &AttributeEvent) -> Result<Decoded, DecodeError> {
    match event.cluster {
        Cluster::OnOff => decode_on_off(router, event),
        Cluster::OnOffSwitchConfig => decode_switch_config(router, event),
        _ => {
            debug!(
                "Ignoring {:?} on {} from endpoint {}",
                event.kind, event.cluster, event.endpoint
            );
            Ok(Decoded::Ignored)
        }
    }
}

/// Decode an event straight into a property patch.
pub fn convert(router: &Router, event: &AttributeEvent) -> Result<PropertyPatch, DecodeError> {
    decode(router, event).map(PropertyPatch::from)
}

fn resolve<'r>(router: &'r Router, event: &AttributeEvent) -> Result<&'r Channel, DecodeError> {
    router
        .channel_at(event.endpoint)
        .ok_or_else(|| DecodeError::UnknownEndpoint {
            cluster: event.cluster.clone(),
            endpoint: event.endpoint,
        })
}

fn decode_on_off(router: &Router, event: &AttributeEvent) -> Result<Decoded, DecodeError> {
    let Some(raw) = event.get(Attribute::OnOff) else {
        return Ok(Decoded::Ignored);
    };
    let channel = resolve(router, event)?;

    let on = match raw {
        Value::Bool(b) => *b,
        other => other.as_f64() == Some(1.0),
    };

    Ok(Decoded::OnOff(OnOffDecoded {
        channel: channel.clone(),
        on,
    }))
}

fn decode_switch_config(router: &Router, event: &AttributeEvent) -> Result<Decoded, DecodeError> {
    let channel = resolve(router, event)?;

    let lookup = |attribute: Attribute, table: &EnumTable| -> Option<&'static str> {
        let raw = event.get(attribute)?;
        let label = table.decode(raw);
        if label.is_none() {
            warn!(
                "Unrecognised {} value {} on channel {}",
                table.name, raw, channel.name
            );
        }
        label
    };

    Ok(Decoded::SwitchConfig(SwitchConfigDecoded {
        channel: channel.name.clone(),
        switch_type: lookup(Attribute::SwitchType, &SWITCH_TYPES),
        switch_actions: lookup(Attribute::SwitchActions, &SWITCH_ACTIONS),
        link_to_output: lookup(Attribute::Vendor(ATTR_LINK_TO_OUTPUT), &INPUT_LINK),
        bind_command: lookup(Attribute::Vendor(ATTR_BIND_COMMAND), &BIND_COMMANDS),
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::router::SensorKind;

    fn ws_router() -> Router {
        Router::new(
            (1..=8).map(|i| (format!("l{}", i), i)),
            [("l7", SensorKind::WaterLeak), ("l8", SensorKind::Contact)],
        )
        .unwrap()
    }

    fn on_off(endpoint: u8, value: u8) -> AttributeEvent {
        AttributeEvent::new(Cluster::OnOff, MessageKind::AttributeReport, endpoint)
            .with(Attribute::OnOff, value)
    }

    #[test]
    fn test_binary_endpoint_decodes_to_bool() {
        let patch = convert(&ws_router(), &on_off(7, 1)).unwrap();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.get("water_leak_l7"), Some(&json!(true)));
    }

    #[test]
    fn test_contact_endpoint_off() {
        let patch = convert(&ws_router(), &on_off(8, 0)).unwrap();
        assert_eq!(patch.get("contact_l8"), Some(&json!(false)));
    }

    #[test]
    fn test_switch_endpoint_decodes_to_on_off_string() {
        let router = ws_router();
        let patch = convert(&router, &on_off(2, 0)).unwrap();
        assert_eq!(patch.get("state_l2"), Some(&json!("OFF")));

        let patch = convert(&router, &on_off(2, 1)).unwrap();
        assert_eq!(patch.get("state_l2"), Some(&json!("ON")));
    }

    #[test]
    fn test_integral_float_on_off() {
        let router = ws_router();
        let event = AttributeEvent::new(Cluster::OnOff, MessageKind::AttributeReport, 2)
            .with(Attribute::OnOff, 1.0);
        let patch = convert(&router, &event).unwrap();
        assert_eq!(patch.get("state_l2"), Some(&json!("ON")));

        let event = AttributeEvent::new(Cluster::OnOff, MessageKind::AttributeReport, 7)
            .with(Attribute::OnOff, 0.0);
        let patch = convert(&router, &event).unwrap();
        assert_eq!(patch.get("water_leak_l7"), Some(&json!(false)));
    }

    #[test]
    fn test_missing_on_off_is_ignored() {
        let event = AttributeEvent::new(Cluster::OnOff, MessageKind::ReadResponse, 2);
        assert_eq!(decode(&ws_router(), &event).unwrap(), Decoded::Ignored);
    }

    #[test]
    fn test_null_on_off_is_ignored() {
        let event = AttributeEvent::new(Cluster::OnOff, MessageKind::ReadResponse, 2)
            .with(Attribute::OnOff, Value::Null);
        assert!(convert(&ws_router(), &event).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_endpoint_fails() {
        let err = convert(&ws_router(), &on_off(12, 1)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownEndpoint {
                cluster: Cluster::OnOff,
                endpoint: 12,
            }
        );
    }

    #[test]
    fn test_partial_switch_config() {
        let event = AttributeEvent::new(Cluster::OnOffSwitchConfig, MessageKind::ReadResponse, 3)
            .with(Attribute::SwitchType, 0x02)
            .with(Attribute::SwitchActions, 0x01);

        let patch = convert(&ws_router(), &event).unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get("switch_type_l3"), Some(&json!("multi-click")));
        assert_eq!(patch.get("switch_actions_l3"), Some(&json!("off")));
        assert!(!patch.contains("link_to_output_l3"));
        assert!(!patch.contains("bind_command_l3"));
    }

    #[test]
    fn test_full_switch_config() {
        let event = AttributeEvent::new(Cluster::OnOffSwitchConfig, MessageKind::AttributeReport, 5)
            .with(Attribute::SwitchType, 0)
            .with(Attribute::SwitchActions, 2)
            .with(Attribute::Vendor(ATTR_LINK_TO_OUTPUT), 1)
            .with(Attribute::Vendor(ATTR_BIND_COMMAND), 0x0b);

        let decoded = decode(&ws_router(), &event).unwrap();
        assert_eq!(
            decoded,
            Decoded::SwitchConfig(SwitchConfigDecoded {
                channel: "l5".to_string(),
                switch_type: Some("switch"),
                switch_actions: Some("toggle"),
                link_to_output: Some("yes"),
                bind_command: Some("recall scene 5"),
            })
        );
    }

    #[test]
    fn test_unrecognised_code_is_omitted() {
        let event = AttributeEvent::new(Cluster::OnOffSwitchConfig, MessageKind::ReadResponse, 4)
            .with(Attribute::SwitchType, 0x09)
            .with(Attribute::Vendor(ATTR_BIND_COMMAND), 0x01);

        let patch = convert(&ws_router(), &event).unwrap();
        assert!(!patch.contains("switch_type_l4"));
        assert_eq!(patch.get("bind_command_l4"), Some(&json!("toggle")));
    }

    #[test]
    fn test_switch_config_unknown_endpoint_fails() {
        let event = AttributeEvent::new(Cluster::OnOffSwitchConfig, MessageKind::ReadResponse, 0)
            .with(Attribute::SwitchType, 0);
        assert!(decode(&ws_router(), &event).is_err());
    }

    #[test]
    fn test_other_clusters_are_ignored() {
        let event = AttributeEvent::new(Cluster::Basic, MessageKind::AttributeReport, 1)
            .with(Attribute::ModelId, "DIYRuZ_WS_my");
        assert!(convert(&ws_router(), &event).unwrap().is_empty());
    }

    #[test]
    fn test_event_from_json() {
        let event: AttributeEvent = serde_json::from_str(
            r#"{"cluster": "genOnOffSwitchCfg", "type": "readResponse", "endpoint": 3,
                "data": {"switchType": 1, "16385": 0}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, MessageKind::ReadResponse);

        let patch = convert(&ws_router(), &event).unwrap();
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"link_to_output_l3":"no","switch_type_l3":"single click"}"#
        );
    }
}
