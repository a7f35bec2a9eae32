use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use zconvert::exposes;
use zconvert::to_zigbee::ClusterCommand;
use zconvert::to_zigbee::ReadRequest;
use zconvert::to_zigbee::WritePayload;
use zconvert::AttributeEvent;
use zconvert::Config;
use zconvert::DeviceHandle;
use zconvert::Transport;
use zconvert::TransportError;

/// Serialises every request it is handed, tagged with the endpoint.
#[derive(Default, Clone)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl RecordingTransport {
    fn push(&self, endpoint: u8, kind: &str, body: serde_json::Value) {
        self.sent
            .lock()
            .unwrap()
            .push(json!({ "endpoint": endpoint, "kind": kind, "body": body }));
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn read(&self, endpoint: u8, request: &ReadRequest) -> Result<(), TransportError> {
        self.push(endpoint, "read", serde_json::to_value(request)?);
        Ok(())
    }

    async fn write(&self, endpoint: u8, payload: &WritePayload) -> Result<(), TransportError> {
        self.push(endpoint, "write", serde_json::to_value(payload)?);
        Ok(())
    }

    async fn command(&self, endpoint: u8, command: &ClusterCommand) -> Result<(), TransportError> {
        self.push(endpoint, "command", serde_json::to_value(command)?);
        Ok(())
    }
}

fn event(value: serde_json::Value) -> AttributeEvent {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_ws_device_round_trip() {
    let registry = Config::default().registry().unwrap();
    let transport = RecordingTransport::default();
    let handle = DeviceHandle::new(
        registry.find("DIYRuZ_WS_my").unwrap(),
        transport.clone(),
    );

    handle
        .set("bind_command_l3", &"recall scene 3".into())
        .await
        .unwrap();
    handle.set("switch_type_l3", &"multi-click".into()).await.unwrap();
    handle.set("state_l5", &"toggle".into()).await.unwrap();
    handle.get("switch_type_l3").await.unwrap();

    let sent = transport.sent.lock().unwrap().clone();
    assert_eq!(
        sent[0],
        json!({
            "endpoint": 3,
            "kind": "write",
            "body": {
                "cluster": "genOnOffSwitchCfg",
                "payload": { "16386": { "value": 9, "type": 32 } }
            }
        })
    );
    assert_eq!(
        sent[1]["body"]["payload"],
        json!({ "switchType": 2 })
    );
    assert_eq!(
        sent[2],
        json!({
            "endpoint": 5,
            "kind": "command",
            "body": { "cluster": "genOnOff", "command": "toggle" }
        })
    );
    assert_eq!(
        sent[3]["body"]["attributes"],
        json!(["switchType", "switchActions", 16385, 16386])
    );

    let patch = handle
        .handle_event(&event(json!({
            "cluster": "genOnOffSwitchCfg",
            "type": "readResponse",
            "endpoint": 3,
            "data": { "switchType": 2, "switchActions": 2, "16385": 1, "16386": 9 }
        })))
        .unwrap();
    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        json!({
            "switch_type_l3": "multi-click",
            "switch_actions_l3": "toggle",
            "link_to_output_l3": "yes",
            "bind_command_l3": "recall scene 3"
        })
    );
}

#[tokio::test]
async fn test_configured_device_event_loop() {
    let config = Config::parse(
        r#"
[[devices]]
model = "custom_ptvo"
vendor = "example"
endpoints = { l1 = 1, l2 = 2, l3 = 3 }
binary_endpoints = { l3 = "contact" }
config_channels = ["l2"]
"#,
    )
    .unwrap();
    let registry = config.registry().unwrap();
    let definition = registry.find("custom_ptvo").unwrap();

    let properties: Vec<String> = exposes::exposes(&definition)
        .iter()
        .map(|f| f.property().to_string())
        .collect();
    assert_eq!(
        properties,
        vec![
            "state_l1",
            "state_l2",
            "contact_l3",
            "switch_type_l2",
            "switch_actions_l2",
            "link_to_output_l2",
            "bind_command_l2",
        ]
    );

    let handle = Arc::new(DeviceHandle::new(definition, RecordingTransport::default()));
    let (event_tx, event_rx) = mpsc::channel(4);
    let (patch_tx, mut patch_rx) = mpsc::channel(4);

    let task = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.run(event_rx, patch_tx).await })
    };

    event_tx
        .send(event(json!({ "cluster": "genOnOff", "endpoint": 9, "data": { "onOff": 1 } })))
        .await
        .unwrap();
    event_tx
        .send(event(json!({ "cluster": "genOnOff", "endpoint": 3, "data": { "onOff": 0 } })))
        .await
        .unwrap();
    event_tx
        .send(event(json!({ "cluster": "genOnOff", "endpoint": 2, "data": { "onOff": 1 } })))
        .await
        .unwrap();
    drop(event_tx);

    let first = patch_rx.recv().await.unwrap();
    assert_eq!(first.get("contact_l3"), Some(&json!(false)));
    let second = patch_rx.recv().await.unwrap();
    assert_eq!(second.get("state_l2"), Some(&json!("ON")));
    assert!(patch_rx.recv().await.is_none());

    task.await.unwrap();
}
