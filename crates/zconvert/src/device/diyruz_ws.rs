use linkme::distributed_slice;

use super::DefinitionFactoryResult;
use super::DeviceDefinition;
use super::DEVICE_REGISTRY;
use crate::router::Router;
use crate::router::SensorKind;

/// modkam.ru DIYRuZ_WS_my: PTVO configurable firmware with five relay
/// channels, a water leak input and a contact input.
#[distributed_slice(DEVICE_REGISTRY)]
fn diyruz_ws_my() -> DefinitionFactoryResult {
    let router = Router::new(
        [
            ("l1", 1),
            ("l2", 2),
            ("l3", 3),
            ("l4", 4),
            ("l5", 5),
            ("l6", 6),
            ("l7", 7),
            ("l8", 8),
        ],
        [("l7", SensorKind::WaterLeak), ("l8", SensorKind::Contact)],
    )?;

    let channels: Vec<String> = (2..=8).map(|i| format!("l{}", i)).collect();

    DeviceDefinition::new(
        "DIYRuZ_WS_my",
        "modkam.ru",
        "Configurable firmware",
        router,
        channels.clone(),
        channels,
    )
}
