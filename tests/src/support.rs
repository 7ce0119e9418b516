use std::sync::Arc;
use std::time::Duration;

use camfleet_common::config::Config;
use camfleet_common::credentials::Credentials;
use camfleet_common::discovery::{DiscoveryRecord, Generation, keys};
use camfleet_core::mock::MockFactory;
use camfleet_core::replay::ReplayDiscoverer;
use camfleet_core::{FleetEvent, Manager};
use tokio::sync::broadcast;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn camera(endpoint: &str, ip: &str) -> DiscoveryRecord {
    DiscoveryRecord::from_pairs([
        (keys::ENDPOINT_ADDRESS, endpoint.to_string()),
        (keys::TYPES, "dn:NetworkVideoTransmitter".to_string()),
        (keys::DEVICE_IP, ip.to_string()),
        (keys::DEVICE_SERVICE_ADDRESS, format!("http://{ip}/onvif/device_service")),
        (keys::SCOPES, "onvif://www.onvif.org/type/video_encoder".to_string()),
        (keys::METADATA_VERSION, "1".to_string()),
    ])
}

pub fn fleet(records: Vec<DiscoveryRecord>, pace: Duration) -> (Manager, Arc<MockFactory>) {
    let factory = Arc::new(MockFactory::new());
    let discoverer = ReplayDiscoverer::new(records).with_pace(pace);
    let cfg = Config::default().with_credentials(Credentials::new("admin", "admin"));
    let manager = Manager::new(&cfg, Arc::new(discoverer), factory.clone());
    (manager, factory)
}

/// Collects events until the end of `generation` is announced.
pub async fn events_until_end(
    rx: &mut broadcast::Receiver<FleetEvent>,
    generation: Generation,
) -> anyhow::Result<Vec<FleetEvent>> {
    let mut events = Vec::new();
    loop {
        let event = timeout(WAIT, rx.recv()).await??;
        let done = matches!(event, FleetEvent::DiscoveryEnded { generation: g, .. } if g == generation);
        events.push(event);
        if done {
            return Ok(events);
        }
    }
}
