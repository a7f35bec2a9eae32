//! Logical channel ↔ physical endpoint routing.
//!
//! A multi-endpoint device names each of its endpoints with a logical channel
//! (`l1`..`l8`). Plain channels are on/off switches; channels listed as binary
//! endpoints report through a sensor kind instead.

use serde::Deserialize;
use serde::Serialize;

/// Sensor kinds a binary endpoint can report as.
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
pub enum SensorKind {
    WaterLeak,
    Contact,
    Occupancy,
    Smoke,
    Gas,
    Vibration,
    Tamper,
    Presence,
    CarbonMonoxide,
}

/// What a channel reports as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Switch,
    BinarySensor(SensorKind),
}

/// One physical sub-unit of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub endpoint: u8,
    pub role: ChannelRole,
}

impl Channel {
    /// Property name carrying this channel's on/off state.
    ///
    /// `state_l2` for switches, `<kind>_l7` for binary sensors.
    pub fn state_property(&self) -> String {
        match self.role {
            ChannelRole::Switch => format!("state_{}", self.name),
            ChannelRole::BinarySensor(kind) => format!("{}_{}", kind, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("channel name must not be empty")]
    EmptyChannelName,

    #[error("channel {0} is declared more than once")]
    DuplicateChannel(String),

    #[error("endpoint {endpoint} is mapped by both {first} and {second}")]
    DuplicateEndpoint {
        endpoint: u8,
        first: String,
        second: String,
    },

    #[error("binary endpoint {0} does not name a declared channel")]
    UnknownBinaryChannel(String),

    #[error("config channel {0} does not name a declared channel")]
    UnknownConfigChannel(String),
}

/// Fixed channel table of one device variant.
///
/// Names and endpoint ids are unique, checked once at construction, so the
/// inverse lookup is never ambiguous. Lookups are linear; tables hold at most
/// a handful of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    channels: Vec<Channel>,
}

impl Router {
    /// Build a router from `(name, endpoint)` pairs and `(name, kind)` binary
    /// endpoint declarations. Channel order follows `endpoints`.
    pub fn new<N, B>(
        endpoints: impl IntoIterator<Item = (N, u8)>,
        binary_endpoints: impl IntoIterator<Item = (B, SensorKind)>,
    ) -> Result<Self, DefinitionError>
    where
        N: Into<String>,
        B: Into<String>,
    {
        let mut channels: Vec<Channel> = Vec::new();
        for (name, endpoint) in endpoints {
            let name = name.into();
            if name.is_empty() {
                return Err(DefinitionError::EmptyChannelName);
            }
            if channels.iter().any(|c| c.name == name) {
                return Err(DefinitionError::DuplicateChannel(name));
            }
            if let Some(existing) = channels.iter().find(|c| c.endpoint == endpoint) {
                return Err(DefinitionError::DuplicateEndpoint {
                    endpoint,
                    first: existing.name.clone(),
                    second: name,
                });
            }
            channels.push(Channel {
                name,
                endpoint,
                role: ChannelRole::Switch,
            });
        }

        for (name, kind) in binary_endpoints {
            let name = name.into();
            let channel = channels
                .iter_mut()
                .find(|c| c.name == name)
                .ok_or(DefinitionError::UnknownBinaryChannel(name))?;
            channel.role = ChannelRole::BinarySensor(kind);
        }

        Ok(Self { channels })
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn endpoint_of(&self, name: &str) -> Option<u8> {
        self.channel(name).map(|c| c.endpoint)
    }

    /// Inverse lookup: the channel an endpoint id belongs to.
    pub fn channel_at(&self, endpoint: u8) -> Option<&Channel> {
        self.channels.iter().find(|c| c.endpoint == endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws_router() -> Router {
        Router::new(
            (1..=8).map(|i| (format!("l{}", i), i)),
            [("l7", SensorKind::WaterLeak), ("l8", SensorKind::Contact)],
        )
        .unwrap()
    }

    #[test]
    fn test_forward_and_inverse_lookup() {
        let router = ws_router();
        for i in 1..=8u8 {
            let name = format!("l{}", i);
            assert_eq!(router.endpoint_of(&name), Some(i));
            assert_eq!(router.channel_at(i).unwrap().name, name);
        }
        assert_eq!(router.endpoint_of("l9"), None);
        assert!(router.channel_at(9).is_none());
    }

    #[test]
    fn test_roles() {
        let router = ws_router();
        assert_eq!(router.channel("l2").unwrap().role, ChannelRole::Switch);
        assert_eq!(
            router.channel("l7").unwrap().role,
            ChannelRole::BinarySensor(SensorKind::WaterLeak)
        );
    }

    #[test]
    fn test_state_property_names() {
        let router = ws_router();
        assert_eq!(router.channel("l2").unwrap().state_property(), "state_l2");
        assert_eq!(router.channel("l7").unwrap().state_property(), "water_leak_l7");
        assert_eq!(router.channel("l8").unwrap().state_property(), "contact_l8");
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let err =
            Router::new([("l1", 1), ("l2", 1)], Vec::<(&str, SensorKind)>::new()).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateEndpoint {
                endpoint: 1,
                first: "l1".to_string(),
                second: "l2".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let err =
            Router::new([("l1", 1), ("l1", 2)], Vec::<(&str, SensorKind)>::new()).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateChannel("l1".to_string()));
    }

    #[test]
    fn test_unknown_binary_channel_rejected() {
        let err = Router::new([("l1", 1)], [("l7", SensorKind::Contact)]).unwrap_err();
        assert_eq!(err, DefinitionError::UnknownBinaryChannel("l7".to_string()));
    }

    #[test]
    fn test_sensor_kind_parse() {
        assert_eq!("water_leak".parse::<SensorKind>().unwrap(), SensorKind::WaterLeak);
        assert_eq!(SensorKind::CarbonMonoxide.to_string(), "carbon_monoxide");
    }
}
