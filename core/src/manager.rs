//! # Fleet Manager
//!
//! Facade over the [`DeviceRegistry`]. It owns the current credentials, starts discovery
//! cycles, reconciles the discoverer's event stream with the registry and routes device
//! commands by endpoint address.
//!
//! Discovery events are consumed by a single intake task spawned in [`Manager::new`], so
//! records of one cycle are admitted strictly one after another and the end-of-cycle
//! notification is published only after all of them.

use std::sync::Arc;

use camfleet_common::config::Config;
use camfleet_common::credentials::Credentials;
use camfleet_common::device::DeviceFactory;
use camfleet_common::discovery::{
    DiscoveryEvent, DiscoveryRecord, Discoverer, Generation, ProbeSink,
};
use camfleet_common::error::ManagerError;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{info, warn};

use crate::events::FleetEvent;
use crate::registry::{DeviceHandle, DeviceRegistry};

mod dispatch;
mod intake;

pub use dispatch::{Command, Outcome};

/// State shared between manager handles and the intake task.
pub(crate) struct Shared {
    credentials: RwLock<Credentials>,
    registry: DeviceRegistry,
    discoverer: Arc<dyn Discoverer>,
    factory: Arc<dyn DeviceFactory>,
    events: broadcast::Sender<FleetEvent>,
}

/// Cloneable handle to one fleet.
///
/// The intake task stops once every handle and every outstanding [`ProbeSink`] is gone.
#[derive(Clone)]
pub struct Manager {
    shared: Arc<Shared>,
    intake: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl Manager {
    /// Builds the manager and spawns its intake task. Must run inside a tokio runtime.
    ///
    /// No discovery cycle is started; call [`start_discovery`](Self::start_discovery).
    pub fn new(
        cfg: &Config,
        discoverer: Arc<dyn Discoverer>,
        factory: Arc<dyn DeviceFactory>,
    ) -> Self {
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(cfg.event_capacity.max(1));

        let shared = Arc::new(Shared {
            credentials: RwLock::new(cfg.credentials.clone()),
            registry: DeviceRegistry::new(),
            discoverer,
            factory,
            events,
        });

        tokio::spawn(intake::run(Arc::clone(&shared), intake_rx));

        Self {
            shared,
            intake: intake_tx,
        }
    }

    /// Receiver for "device found" and "discovery ended" notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.shared.events.subscribe()
    }

    /// Drops every known device and asks the discoverer for a fresh probe cycle.
    ///
    /// Returns as soon as the probe is sent. Records still in flight from earlier
    /// cycles are discarded when they arrive.
    pub async fn start_discovery(&self) -> Result<Generation, ManagerError> {
        let generation = self.shared.registry.clear().await;
        info!(%generation, "starting discovery cycle");

        let sink = ProbeSink::new(generation, self.intake.clone());
        if let Err(e) = self.shared.discoverer.start_probe(sink).await {
            warn!(%generation, "discovery probe could not be sent: {e}");
            return Err(e.into());
        }

        Ok(generation)
    }

    /// Replaces the credentials and restarts discovery.
    ///
    /// Devices opened with the previous credentials are disposed before the new cycle
    /// begins.
    pub async fn set_credentials(&self, credentials: Credentials) -> Result<Generation, ManagerError> {
        info!(username = credentials.username(), "credentials changed");
        *self.shared.credentials.write().await = credentials;
        self.start_discovery().await
    }

    pub async fn credentials(&self) -> Credentials {
        self.shared.credentials.read().await.clone()
    }

    pub async fn lookup(&self, address: &str) -> Option<DeviceHandle> {
        self.shared.registry.get(address).await
    }

    pub async fn exists(&self, address: &str) -> bool {
        self.shared.registry.exists(address).await
    }

    /// Snapshot of all known devices keyed by endpoint address.
    pub async fn devices(&self) -> Vec<(String, DeviceHandle)> {
        self.shared.registry.devices().await
    }

    pub async fn device_count(&self) -> usize {
        self.shared.registry.len().await
    }

    /// Generation of the cycle currently populating the registry.
    pub async fn generation(&self) -> Generation {
        self.shared.registry.generation().await
    }

    /// Processes one record directly, bypassing the intake queue.
    ///
    /// Returns the device when the record admitted a new one.
    pub async fn on_discovery_record(
        &self,
        generation: Generation,
        record: &DiscoveryRecord,
    ) -> Option<DeviceHandle> {
        self.shared.on_record(generation, record).await
    }

    /// Announces the end of `generation`. Returns `false` if it was stale or already
    /// announced. Records for `generation` are dropped from then on.
    pub async fn on_discovery_ended(&self, generation: Generation) -> bool {
        self.shared.on_search_ended(generation).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{ManualDiscoverer, MockFactory};
    use camfleet_common::discovery::keys;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn record(endpoint: &str, service: &str) -> DiscoveryRecord {
        DiscoveryRecord::from_pairs([
            (keys::ENDPOINT_ADDRESS, endpoint),
            (keys::DEVICE_SERVICE_ADDRESS, service),
        ])
    }

    fn fleet() -> (Manager, Arc<ManualDiscoverer>, Arc<MockFactory>) {
        let discoverer = Arc::new(ManualDiscoverer::new());
        let factory = Arc::new(MockFactory::new());
        let cfg = Config::default().with_credentials(Credentials::new("admin", "admin"));
        let manager = Manager::new(&cfg, discoverer.clone(), factory.clone());
        (manager, discoverer, factory)
    }

    async fn next_event(rx: &mut broadcast::Receiver<FleetEvent>) -> FleetEvent {
        timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for fleet event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn duplicate_records_admit_one_device_and_notify_once() {
        let (manager, discoverer, factory) = fleet();
        let mut events = manager.subscribe();
        let generation = manager.start_discovery().await.unwrap();
        let sink = discoverer.latest_sink().unwrap();

        sink.record(record("ep1", "http://10.0.0.5/onvif"));
        sink.record(record("ep1", "http://10.0.0.5/onvif"));
        sink.search_ended();

        match next_event(&mut events).await {
            FleetEvent::DeviceFound { device, .. } => assert_eq!(device.endpoint_address(), "ep1"),
            other => panic!("unexpected event {other:?}"),
        }
        match next_event(&mut events).await {
            FleetEvent::DiscoveryEnded { generation: ended, devices } => {
                assert_eq!(ended, generation);
                assert_eq!(devices, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(manager.device_count().await, 1);
        assert_eq!(factory.opened(), 1);
    }

    #[tokio::test]
    async fn new_devices_receive_current_credentials() {
        let (manager, _discoverer, factory) = fleet();
        let generation = manager.start_discovery().await.unwrap();

        let device = manager
            .on_discovery_record(generation, &record("ep1", "http://10.0.0.5/onvif"))
            .await
            .expect("first record admits a device");

        assert_eq!(device.probe_data().device_service_address, "http://10.0.0.5/onvif");
        assert_eq!(factory.credentials_seen(), vec![Credentials::new("admin", "admin")]);
    }

    #[tokio::test]
    async fn records_without_endpoint_are_dropped() {
        let (manager, _discoverer, factory) = fleet();
        let generation = manager.start_discovery().await.unwrap();

        let admitted = manager
            .on_discovery_record(generation, &record("", "http://10.0.0.5/onvif"))
            .await;

        assert!(admitted.is_none());
        assert_eq!(factory.opened(), 0);
        assert_eq!(manager.device_count().await, 0);
    }

    #[tokio::test]
    async fn stale_records_are_dropped_after_restart() {
        let (manager, discoverer, factory) = fleet();
        let first = manager.start_discovery().await.unwrap();
        let old_sink = discoverer.latest_sink().unwrap();
        let second = manager.start_discovery().await.unwrap();
        assert_eq!(second, first.next());

        let mut events = manager.subscribe();
        old_sink.record(record("ep-late", "http://10.0.0.9/onvif"));
        old_sink.search_ended();
        let new_sink = discoverer.latest_sink().unwrap();
        new_sink.search_ended();

        match next_event(&mut events).await {
            FleetEvent::DiscoveryEnded { generation, devices } => {
                assert_eq!(generation, second);
                assert_eq!(devices, 0);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(manager.lookup("ep-late").await.is_none());
        assert_eq!(factory.opened(), 0);
    }

    #[tokio::test]
    async fn discovery_end_is_announced_once_per_cycle() {
        let (manager, _discoverer, _factory) = fleet();
        let generation = manager.start_discovery().await.unwrap();

        assert!(manager.on_discovery_ended(generation).await);
        assert!(!manager.on_discovery_ended(generation).await);
        assert!(!manager.on_discovery_ended(Generation::default()).await);
    }

    #[tokio::test]
    async fn records_after_the_end_of_their_cycle_are_dropped() {
        let (manager, _discoverer, factory) = fleet();
        let generation = manager.start_discovery().await.unwrap();
        assert!(manager.on_discovery_ended(generation).await);

        let admitted = manager
            .on_discovery_record(generation, &record("ep-late", "http://10.0.0.9/onvif"))
            .await;

        assert!(admitted.is_none());
        assert!(!manager.exists("ep-late").await);
        assert_eq!(factory.opened(), 0);
    }

    #[tokio::test]
    async fn sink_records_sent_after_search_ended_are_dropped() {
        let (manager, discoverer, factory) = fleet();
        let mut events = manager.subscribe();
        let generation = manager.start_discovery().await.unwrap();
        let sink = discoverer.latest_sink().unwrap();

        sink.record(record("ep1", "http://10.0.0.5/onvif"));
        sink.search_ended();
        sink.record(record("ep-late", "http://10.0.0.9/onvif"));
        sink.search_ended();

        assert!(matches!(next_event(&mut events).await, FleetEvent::DeviceFound { .. }));
        match next_event(&mut events).await {
            FleetEvent::DiscoveryEnded { generation: ended, devices } => {
                assert_eq!(ended, generation);
                assert_eq!(devices, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        // Lets the intake task drain the rest of the queue.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(events.try_recv().is_err());
        assert_eq!(manager.generation().await, generation);
        assert!(!manager.exists("ep-late").await);
        assert_eq!(factory.opened(), 1);
        assert!(factory.device("ep-late").is_none());
    }

    #[tokio::test]
    async fn metadata_version_change_keeps_the_known_device() {
        let (manager, _discoverer, factory) = fleet();
        let mut events = manager.subscribe();
        let generation = manager.start_discovery().await.unwrap();
        let announce = |version: &str| {
            DiscoveryRecord::from_pairs([
                (keys::ENDPOINT_ADDRESS, "ep1"),
                (keys::DEVICE_SERVICE_ADDRESS, "http://10.0.0.5/onvif"),
                (keys::METADATA_VERSION, version),
            ])
        };

        assert!(manager.on_discovery_record(generation, &announce("1")).await.is_some());
        assert!(manager.on_discovery_record(generation, &announce("2")).await.is_none());
        assert!(manager.on_discovery_ended(generation).await);

        assert!(matches!(next_event(&mut events).await, FleetEvent::DeviceFound { .. }));
        assert!(matches!(
            next_event(&mut events).await,
            FleetEvent::DiscoveryEnded { devices: 1, .. }
        ));
        assert_eq!(factory.opened(), 1);
        let device = manager.lookup("ep1").await.unwrap();
        assert_eq!(device.probe_data().metadata_version, "1");
        assert!(factory.device("ep1").unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn set_credentials_empties_registry_and_disposes_devices() {
        let (manager, discoverer, factory) = fleet();
        let generation = manager.start_discovery().await.unwrap();
        manager
            .on_discovery_record(generation, &record("ep1", "http://10.0.0.5/onvif"))
            .await
            .unwrap();

        let next = manager
            .set_credentials(Credentials::new("u2", "p2"))
            .await
            .unwrap();

        assert_eq!(next, generation.next());
        assert!(manager.lookup("ep1").await.is_none());
        assert!(factory.devices().iter().all(|device| device.is_disposed()));
        assert_eq!(manager.credentials().await, Credentials::new("u2", "p2"));
        assert_eq!(discoverer.probes(), 2);
    }

    #[tokio::test]
    async fn failed_probe_start_is_reported() {
        let (manager, discoverer, _factory) = fleet();
        discoverer.fail_next_probe("interface down");

        let err = manager.start_discovery().await.unwrap_err();
        assert!(matches!(err, ManagerError::Discovery(_)));
        assert!(manager.start_discovery().await.is_ok());
    }
}
