//! In-memory collaborators for testing without cameras.
//!
//! [`MockDevice`] answers every capability call from local state and records what was
//! called. [`MockFactory`] opens mock devices and remembers them. [`ManualDiscoverer`]
//! hands its sinks back to the caller, so a test decides exactly which records arrive,
//! for which generation, and when a cycle ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use camfleet_common::credentials::Credentials;
use camfleet_common::device::{
    Device, DeviceDateTime, DeviceFactory, DeviceInformation, DeviceState, NetworkInterfaces,
    NetworkProtocols, PtzVelocity, VideoEncoderConfig,
};
use camfleet_common::discovery::{Discoverer, ProbeData, ProbeSink};
use camfleet_common::error::{DeviceError, DeviceResult, DiscoveryError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated camera.
pub struct MockDevice {
    probe: ProbeData,
    credentials: Credentials,
    failure: Option<DeviceError>,
    calls: Mutex<Vec<&'static str>>,
    state: Mutex<DeviceState>,
    clock: Mutex<DeviceDateTime>,
    moving: AtomicBool,
    disposed: AtomicBool,
}

impl MockDevice {
    pub fn new(probe: ProbeData, credentials: Credentials) -> Self {
        Self {
            probe,
            credentials,
            failure: None,
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(DeviceState::default()),
            clock: Mutex::new(DeviceDateTime::manual(
                SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000),
            )),
            moving: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Mock whose every capability call fails with `failure`.
    pub fn failing(probe: ProbeData, credentials: Credentials, failure: DeviceError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(probe, credentials)
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Operation names in call order, failed calls included.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn call(&self, operation: &'static str) -> DeviceResult<()> {
        lock(&self.calls).push(operation);
        if self.is_disposed() {
            return Err(DeviceError::Unreachable(format!(
                "{} was disposed",
                self.probe.endpoint_address
            )));
        }
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn update(&self, operation: &'static str, apply: impl FnOnce(&mut DeviceState)) -> DeviceResult<()> {
        self.call(operation)?;
        apply(&mut lock(&self.state));
        Ok(())
    }
}

#[async_trait]
impl Device for MockDevice {
    fn probe_data(&self) -> &ProbeData {
        &self.probe
    }

    fn state(&self) -> DeviceState {
        lock(&self.state).clone()
    }

    async fn refresh_capabilities(&self) -> DeviceResult<()> {
        self.update("refresh_capabilities", |state| state.ptz_supported = Some(true))
    }

    async fn refresh_information(&self) -> DeviceResult<()> {
        self.update("refresh_information", |state| {
            state.information = Some(DeviceInformation {
                manufacturer: String::from("Mock"),
                model: String::from("MC-100"),
                firmware_version: String::from("1.0.0"),
                serial_number: self.probe.endpoint_address.clone(),
                hardware_id: String::from("mock"),
            })
        })
    }

    async fn refresh_scopes(&self) -> DeviceResult<()> {
        let scopes: Vec<String> = self.probe.scope_uris().map(str::to_string).collect();
        self.update("refresh_scopes", |state| state.scopes = scopes)
    }

    async fn refresh_video_configs(&self) -> DeviceResult<()> {
        self.call("refresh_video_configs")
    }

    async fn refresh_stream_uris(&self) -> DeviceResult<()> {
        let uri = format!("rtsp://{}/stream1", self.probe.device_ip);
        self.update("refresh_stream_uris", |state| state.stream_uris = vec![uri])
    }

    async fn refresh_video_config_options(&self) -> DeviceResult<()> {
        self.call("refresh_video_config_options")
    }

    async fn refresh_profiles(&self) -> DeviceResult<()> {
        self.update("refresh_profiles", |state| {
            state.profiles = vec![String::from("profile_1"), String::from("profile_2")]
        })
    }

    async fn refresh_interfaces(&self) -> DeviceResult<()> {
        self.update("refresh_interfaces", |state| {
            state.interfaces.get_or_insert_with(NetworkInterfaces::default);
        })
    }

    async fn refresh_protocols(&self) -> DeviceResult<()> {
        self.update("refresh_protocols", |state| {
            state.protocols.get_or_insert_with(NetworkProtocols::default);
        })
    }

    async fn refresh_users(&self) -> DeviceResult<()> {
        let user = self.credentials.username().to_string();
        self.update("refresh_users", |state| state.users = vec![user])
    }

    async fn refresh_ptz_configs(&self) -> DeviceResult<()> {
        self.call("refresh_ptz_configs")
    }

    async fn date_and_time(&self) -> DeviceResult<DeviceDateTime> {
        self.call("date_and_time")?;
        Ok(lock(&self.clock).clone())
    }

    async fn set_date_and_time(&self, date_time: DeviceDateTime) -> DeviceResult<()> {
        self.call("set_date_and_time")?;
        *lock(&self.clock) = date_time;
        Ok(())
    }

    async fn set_scopes(&self, name: &str, location: &str) -> DeviceResult<()> {
        let scopes = vec![
            format!("onvif://www.onvif.org/name/{name}"),
            format!("onvif://www.onvif.org/location/{location}"),
        ];
        self.update("set_scopes", |state| state.scopes = scopes)
    }

    async fn set_video_config(&self, config: VideoEncoderConfig) -> DeviceResult<()> {
        self.update("set_video_config", |state| {
            state.video_configs.retain(|existing| existing.token != config.token);
            state.video_configs.push(config);
        })
    }

    async fn set_interfaces(&self, interfaces: NetworkInterfaces) -> DeviceResult<()> {
        self.update("set_interfaces", |state| state.interfaces = Some(interfaces))
    }

    async fn set_protocols(&self, protocols: NetworkProtocols) -> DeviceResult<()> {
        self.update("set_protocols", |state| state.protocols = Some(protocols))
    }

    async fn reset_factory(&self) -> DeviceResult<()> {
        self.update("reset_factory", |state| *state = DeviceState::default())
    }

    async fn reboot(&self) -> DeviceResult<()> {
        self.call("reboot")
    }

    async fn continuous_move(&self, velocity: PtzVelocity) -> DeviceResult<()> {
        self.call("continuous_move")?;
        self.moving.store(!velocity.is_still(), Ordering::SeqCst);
        Ok(())
    }

    async fn stop_movement(&self) -> DeviceResult<()> {
        self.call("stop_movement")?;
        self.moving.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

/// Opens [`MockDevice`]s and keeps every instance it created.
#[derive(Default)]
pub struct MockFactory {
    opened: AtomicUsize,
    devices: Mutex<Vec<Arc<MockDevice>>>,
    credentials_seen: Mutex<Vec<Credentials>>,
    failures: Mutex<HashMap<String, DeviceError>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices opened for `endpoint` from now on fail every call with `failure`.
    pub fn fail_endpoint(&self, endpoint: &str, failure: DeviceError) {
        lock(&self.failures).insert(endpoint.to_string(), failure);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn devices(&self) -> Vec<Arc<MockDevice>> {
        lock(&self.devices).clone()
    }

    /// Most recently opened device for `endpoint`.
    pub fn device(&self, endpoint: &str) -> Option<Arc<MockDevice>> {
        lock(&self.devices)
            .iter()
            .rev()
            .find(|device| device.probe_data().endpoint_address == endpoint)
            .cloned()
    }

    pub fn credentials_seen(&self) -> Vec<Credentials> {
        lock(&self.credentials_seen).clone()
    }
}

impl DeviceFactory for MockFactory {
    fn open(&self, probe: ProbeData, credentials: Credentials) -> Arc<dyn Device> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        lock(&self.credentials_seen).push(credentials.clone());

        let device = match lock(&self.failures).get(&probe.endpoint_address) {
            Some(failure) => MockDevice::failing(probe, credentials, failure.clone()),
            None => MockDevice::new(probe, credentials),
        };
        let device = Arc::new(device);
        lock(&self.devices).push(Arc::clone(&device));
        device
    }
}

/// Discoverer driven by the test: every probe only stores its sink.
#[derive(Default)]
pub struct ManualDiscoverer {
    sinks: Mutex<Vec<ProbeSink>>,
    next_failure: Mutex<Option<String>>,
}

impl ManualDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `start_probe` call fail with `reason`.
    pub fn fail_next_probe(&self, reason: &str) {
        *lock(&self.next_failure) = Some(reason.to_string());
    }

    /// Number of probe cycles started successfully.
    pub fn probes(&self) -> usize {
        lock(&self.sinks).len()
    }

    pub fn latest_sink(&self) -> Option<ProbeSink> {
        lock(&self.sinks).last().cloned()
    }
}

#[async_trait]
impl Discoverer for ManualDiscoverer {
    async fn start_probe(&self, sink: ProbeSink) -> Result<(), DiscoveryError> {
        if let Some(reason) = lock(&self.next_failure).take() {
            return Err(DiscoveryError::Unavailable(reason));
        }
        lock(&self.sinks).push(sink);
        Ok(())
    }
}
