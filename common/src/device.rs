//! # Device Contract
//!
//! A [`Device`] is a live handle to one physical endpoint. It owns its transport and
//! credentials; the fleet core only routes calls to it and never inspects payloads.
//!
//! Every capability call defaults to [`DeviceError::Unsupported`], so an implementation
//! only overrides what its transport can actually do.

use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::discovery::ProbeData;
use crate::error::{DeviceError, DeviceResult};

mod capabilities;

pub use capabilities::{
    DeviceDateTime, DeviceInformation, DeviceState, NetworkInterface, NetworkInterfaces,
    NetworkProtocol, NetworkProtocols, PtzVelocity, VideoEncoderConfig, VideoEncoding,
};

#[async_trait]
pub trait Device: Send + Sync {
    /// Probe data the device was admitted with.
    fn probe_data(&self) -> &ProbeData;

    /// Snapshot of capability data cached by earlier refresh calls.
    fn state(&self) -> DeviceState;

    fn endpoint_address(&self) -> &str {
        &self.probe_data().endpoint_address
    }

    async fn refresh_capabilities(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_capabilities"))
    }

    async fn refresh_information(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_information"))
    }

    async fn refresh_scopes(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_scopes"))
    }

    async fn refresh_video_configs(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_video_configs"))
    }

    async fn refresh_stream_uris(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_stream_uris"))
    }

    async fn refresh_video_config_options(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_video_config_options"))
    }

    async fn refresh_profiles(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_profiles"))
    }

    async fn refresh_interfaces(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_interfaces"))
    }

    async fn refresh_protocols(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_protocols"))
    }

    async fn refresh_users(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_users"))
    }

    async fn refresh_ptz_configs(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("refresh_ptz_configs"))
    }

    async fn date_and_time(&self) -> DeviceResult<DeviceDateTime> {
        Err(DeviceError::Unsupported("date_and_time"))
    }

    async fn set_date_and_time(&self, _date_time: DeviceDateTime) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("set_date_and_time"))
    }

    async fn set_scopes(&self, _name: &str, _location: &str) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("set_scopes"))
    }

    async fn set_video_config(&self, _config: VideoEncoderConfig) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("set_video_config"))
    }

    async fn set_interfaces(&self, _interfaces: NetworkInterfaces) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("set_interfaces"))
    }

    async fn set_protocols(&self, _protocols: NetworkProtocols) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("set_protocols"))
    }

    async fn reset_factory(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("reset_factory"))
    }

    async fn reboot(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("reboot"))
    }

    async fn continuous_move(&self, _velocity: PtzVelocity) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("continuous_move"))
    }

    async fn stop_movement(&self) -> DeviceResult<()> {
        Err(DeviceError::Unsupported("stop_movement"))
    }

    /// Releases transport resources. Called once when the device leaves the registry.
    fn dispose(&self) {}
}

/// Opens a [`Device`] for freshly admitted probe data.
///
/// Construction must not perform network I/O; the registry calls this while holding
/// its write lock.
pub trait DeviceFactory: Send + Sync {
    fn open(&self, probe: ProbeData, credentials: Credentials) -> Arc<dyn Device>;
}

impl<F> DeviceFactory for F
where
    F: Fn(ProbeData, Credentials) -> Arc<dyn Device> + Send + Sync,
{
    fn open(&self, probe: ProbeData, credentials: Credentials) -> Arc<dyn Device> {
        self(probe, credentials)
    }
}
