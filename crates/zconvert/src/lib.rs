//! Translation kernel for configurable multi-endpoint zigbee switches.
//!
//! Inbound attribute events become flat property patches; outbound property
//! commands become cluster writes, reads and commands addressed to the right
//! endpoint.

pub mod config;
pub mod device;
pub mod enums;
pub mod exposes;
pub mod from_zigbee;
pub mod router;
pub mod to_zigbee;
pub mod transport;
pub mod zcl;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use device::DeviceDefinition;
pub use device::Registry;
pub use from_zigbee::AttributeEvent;
pub use from_zigbee::PropertyPatch;
pub use router::Router;
pub use to_zigbee::ConfigCommand;
pub use to_zigbee::ConfigKey;
pub use to_zigbee::ConfigValue;
pub use transport::CommandError;
pub use transport::DeviceHandle;
pub use transport::Transport;
pub use transport::TransportError;
