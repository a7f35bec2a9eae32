use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::device::DeviceDefinition;
use crate::device::CONFIGURE_ENDPOINT;
use crate::from_zigbee;
use crate::from_zigbee::AttributeEvent;
use crate::from_zigbee::DecodeError;
use crate::from_zigbee::PropertyPatch;
use crate::to_zigbee;
use crate::to_zigbee::ClusterCommand;
use crate::to_zigbee::ConfigCommand;
use crate::to_zigbee::ConfigValue;
use crate::to_zigbee::EncodeError;
use crate::to_zigbee::ReadRequest;
use crate::to_zigbee::Request;
use crate::to_zigbee::RoutedRequest;
use crate::to_zigbee::WritePayload;

pub type TransportError = Box<dyn Error + Send + Sync>;

/// Delivery side of the zigbee stack.
///
/// Implementations address a single device; the endpoint argument selects
/// the sub-unit. Retries and timeouts belong to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn read(&self, endpoint: u8, request: &ReadRequest) -> Result<(), TransportError>;

    async fn write(&self, endpoint: u8, payload: &WritePayload) -> Result<(), TransportError>;

    async fn command(&self, endpoint: u8, command: &ClusterCommand) -> Result<(), TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("transport failed on endpoint {endpoint}: {source}")]
    Transport {
        endpoint: u8,
        #[source]
        source: TransportError,
    },
}

/// A device definition bound to the transport that reaches it.
pub struct DeviceHandle<T> {
    definition: Arc<DeviceDefinition>,
    transport: T,
}

impl<T: Transport> DeviceHandle<T> {
    pub fn new(definition: Arc<DeviceDefinition>, transport: T) -> Self {
        Self {
            definition,
            transport,
        }
    }

    pub fn definition(&self) -> &DeviceDefinition {
        &self.definition
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Decode one inbound event against this device's channel table.
    pub fn handle_event(&self, event: &AttributeEvent) -> Result<PropertyPatch, DecodeError> {
        from_zigbee::convert(&self.definition.router, event)
    }

    /// Set a property, e.g. `switch_type_l3` or `state_l2`.
    pub async fn set(&self, property: &str, value: &ConfigValue) -> Result<(), CommandError> {
        let routed = to_zigbee::encode_set(&self.definition.router, property, value)?;
        info!(
            "{}: set {} = {} via endpoint {}",
            self.definition.model, property, value, routed.endpoint
        );
        self.dispatch(routed).await
    }

    /// Refresh a property. Switch settings are read back together.
    pub async fn get(&self, property: &str) -> Result<(), CommandError> {
        let routed = to_zigbee::encode_get(&self.definition.router, property)?;
        debug!(
            "{}: refresh {} via endpoint {}",
            self.definition.model, property, routed.endpoint
        );
        self.dispatch(routed).await
    }

    /// Apply a configuration command to an explicitly named channel.
    pub async fn configure_channel(
        &self,
        channel: &str,
        command: &ConfigCommand,
    ) -> Result<(), CommandError> {
        let endpoint = self
            .definition
            .router
            .endpoint_of(channel)
            .ok_or_else(|| EncodeError::UnknownChannel(channel.to_string()))?;
        let payload = to_zigbee::encode(command)?;
        info!(
            "{}: set {} on {} = {}",
            self.definition.model, command.key, channel, command.value
        );
        self.dispatch(RoutedRequest {
            channel: channel.to_string(),
            endpoint,
            request: Request::Write(payload),
        })
        .await
    }

    /// One-off read issued when the device joins.
    pub async fn configure(&self) -> Result<(), CommandError> {
        let request = self.definition.configure_request();
        self.transport
            .read(CONFIGURE_ENDPOINT, &request)
            .await
            .map_err(|source| CommandError::Transport {
                endpoint: CONFIGURE_ENDPOINT,
                source,
            })
    }

    async fn dispatch(&self, routed: RoutedRequest) -> Result<(), CommandError> {
        let endpoint = routed.endpoint;
        let result = match &routed.request {
            Request::Write(payload) => self.transport.write(endpoint, payload).await,
            Request::Read(request) => self.transport.read(endpoint, request).await,
            Request::Command(command) => self.transport.command(endpoint, command).await,
        };
        result.map_err(|source| CommandError::Transport { endpoint, source })
    }

    /// Decode events until the event channel closes or the patch receiver is
    /// dropped. A failing event is logged and skipped.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<AttributeEvent>,
        patches: mpsc::Sender<PropertyPatch>,
    ) {
        while let Some(event) = events.recv().await {
            let patch = match self.handle_event(&event) {
                Ok(patch) => patch,
                Err(e) => {
                    warn!("{}: dropping event: {}", self.definition.model, e);
                    continue;
                }
            };
            if patch.is_empty() {
                continue;
            }
            for (property, value) in patch.iter() {
                debug!("{}: {} = {}", self.definition.model, property, value);
            }
            if patches.send(patch).await.is_err() {
                break;
            }
        }
        debug!("{}: event loop exiting", self.definition.model);
    }
}

/// Transport that records every call, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockTransport {
    pub calls: std::sync::Mutex<Vec<(u8, Request)>>,
    pub fail: bool,
}

#[cfg(test)]
impl MockTransport {
    fn record(&self, endpoint: u8, request: Request) -> Result<(), TransportError> {
        if self.fail {
            return Err("device did not respond".into());
        }
        self.calls.lock().unwrap().push((endpoint, request));
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn read(&self, endpoint: u8, request: &ReadRequest) -> Result<(), TransportError> {
        self.record(endpoint, Request::Read(request.clone()))
    }

    async fn write(&self, endpoint: u8, payload: &WritePayload) -> Result<(), TransportError> {
        self.record(endpoint, Request::Write(payload.clone()))
    }

    async fn command(&self, endpoint: u8, command: &ClusterCommand) -> Result<(), TransportError> {
        self.record(endpoint, Request::Command(command.clone()))
    }
}
