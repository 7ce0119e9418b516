//! Reconciles discovery events with the registry.

use std::sync::Arc;

use camfleet_common::discovery::{DiscoveryEvent, DiscoveryRecord, Generation, ProbeData};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::Shared;
use crate::events::FleetEvent;
use crate::registry::{Admission, DeviceHandle};

/// Drains the intake queue until every sender is gone.
pub(super) async fn run(shared: Arc<Shared>, mut rx: UnboundedReceiver<DiscoveryEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            DiscoveryEvent::Record { generation, record } => {
                shared.on_record(generation, &record).await;
            }
            DiscoveryEvent::SearchEnded { generation } => {
                shared.on_search_ended(generation).await;
            }
        }
    }
    debug!("discovery intake closed");
}

impl Shared {
    pub(super) async fn on_record(
        &self,
        generation: Generation,
        record: &DiscoveryRecord,
    ) -> Option<DeviceHandle> {
        let probe = match ProbeData::try_from(record) {
            Ok(probe) => probe,
            Err(e) => {
                debug!(%generation, "dropping discovery record: {e}");
                return None;
            }
        };

        let endpoint = probe.endpoint_address.clone();
        let metadata_version = probe.metadata_version.clone();
        let credentials = self.credentials.read().await.clone();
        let factory = &self.factory;

        let admission = self
            .registry
            .admit_tagged(generation, probe, |probe| factory.open(probe, credentials))
            .await;

        match admission {
            Admission::New(device) => {
                info!(%generation, endpoint = %endpoint, service = %device.probe_data().device_service_address, "new device found");
                // No subscribers is fine; the registry stays authoritative.
                let _ = self.events.send(FleetEvent::DeviceFound {
                    generation,
                    device: Arc::clone(&device),
                });
                Some(device)
            }
            Admission::Known(device) => {
                if device.probe_data().metadata_version != metadata_version {
                    debug!(
                        endpoint = %endpoint,
                        known = %device.probe_data().metadata_version,
                        announced = %metadata_version,
                        "metadata version changed on a known device"
                    );
                }
                None
            }
            Admission::Stale => {
                debug!(%generation, endpoint = %endpoint, "dropping record from a superseded or finished cycle");
                None
            }
        }
    }

    pub(super) async fn on_search_ended(&self, generation: Generation) -> bool {
        let Some(devices) = self.registry.finish(generation).await else {
            debug!(%generation, "ignoring end of a superseded or already finished cycle");
            return false;
        };

        info!(%generation, devices, "discovery cycle ended");
        let _ = self.events.send(FleetEvent::DiscoveryEnded {
            generation,
            devices,
        });
        true
    }
}
