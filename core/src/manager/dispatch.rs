//! Routes per-device commands through the registry.
//!
//! The only check made here is that the address is known. Everything else, including
//! failures, comes back from the device untouched, and no failure ever evicts a device.

use std::future::Future;

use camfleet_common::device::{
    Device, DeviceDateTime, NetworkInterfaces, NetworkProtocols, PtzVelocity,
    VideoEncoderConfig,
};
use camfleet_common::error::{DeviceResult, ManagerError};
use tracing::debug;

use super::Manager;
use crate::registry::DeviceHandle;

/// A command addressed to one device.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RefreshCapabilities,
    RefreshInformation,
    RefreshScopes,
    RefreshVideoConfigs,
    RefreshStreamUris,
    RefreshVideoConfigOptions,
    RefreshProfiles,
    RefreshInterfaces,
    RefreshProtocols,
    RefreshUsers,
    RefreshPtzConfigs,
    GetDateAndTime,
    SetDateAndTime(DeviceDateTime),
    SetScopes { name: String, location: String },
    SetVideoConfig(VideoEncoderConfig),
    SetInterfaces(NetworkInterfaces),
    SetProtocols(NetworkProtocols),
    ResetFactory,
    Reboot,
    ContinuousMove(PtzVelocity),
    StopMovement,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RefreshCapabilities => "refresh_capabilities",
            Command::RefreshInformation => "refresh_information",
            Command::RefreshScopes => "refresh_scopes",
            Command::RefreshVideoConfigs => "refresh_video_configs",
            Command::RefreshStreamUris => "refresh_stream_uris",
            Command::RefreshVideoConfigOptions => "refresh_video_config_options",
            Command::RefreshProfiles => "refresh_profiles",
            Command::RefreshInterfaces => "refresh_interfaces",
            Command::RefreshProtocols => "refresh_protocols",
            Command::RefreshUsers => "refresh_users",
            Command::RefreshPtzConfigs => "refresh_ptz_configs",
            Command::GetDateAndTime => "date_and_time",
            Command::SetDateAndTime(_) => "set_date_and_time",
            Command::SetScopes { .. } => "set_scopes",
            Command::SetVideoConfig(_) => "set_video_config",
            Command::SetInterfaces(_) => "set_interfaces",
            Command::SetProtocols(_) => "set_protocols",
            Command::ResetFactory => "reset_factory",
            Command::Reboot => "reboot",
            Command::ContinuousMove(_) => "continuous_move",
            Command::StopMovement => "stop_movement",
        }
    }
}

/// Successful result of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    DateAndTime(DeviceDateTime),
}

impl Manager {
    /// Forwards `command` to the device registered under `address`.
    ///
    /// Fails with [`ManagerError::UnknownDevice`] without touching anything when the
    /// address is not registered.
    pub async fn dispatch(&self, address: &str, command: Command) -> Result<Outcome, ManagerError> {
        self.with_device(address, |device| async move {
            let name = command.name();
            let result = execute(device.as_ref(), command).await;
            if let Err(e) = &result {
                debug!(address = %device.endpoint_address(), command = name, "device reported failure: {e}");
            }
            result
        })
        .await
    }

    /// Runs `operation` against the device registered under `address`.
    ///
    /// The registry lock is released before `operation` starts, so slow device I/O never
    /// blocks admission or other lookups.
    pub async fn with_device<T, F, Fut>(&self, address: &str, operation: F) -> Result<T, ManagerError>
    where
        F: FnOnce(DeviceHandle) -> Fut,
        Fut: Future<Output = DeviceResult<T>>,
    {
        let Some(device) = self.shared.registry.get(address).await else {
            debug!(address, "dispatch to unknown device");
            return Err(ManagerError::UnknownDevice(address.to_string()));
        };

        Ok(operation(device).await?)
    }
}

async fn execute(device: &dyn Device, command: Command) -> DeviceResult<Outcome> {
    match command {
        Command::RefreshCapabilities => device.refresh_capabilities().await?,
        Command::RefreshInformation => device.refresh_information().await?,
        Command::RefreshScopes => device.refresh_scopes().await?,
        Command::RefreshVideoConfigs => device.refresh_video_configs().await?,
        Command::RefreshStreamUris => device.refresh_stream_uris().await?,
        Command::RefreshVideoConfigOptions => device.refresh_video_config_options().await?,
        Command::RefreshProfiles => device.refresh_profiles().await?,
        Command::RefreshInterfaces => device.refresh_interfaces().await?,
        Command::RefreshProtocols => device.refresh_protocols().await?,
        Command::RefreshUsers => device.refresh_users().await?,
        Command::RefreshPtzConfigs => device.refresh_ptz_configs().await?,
        Command::GetDateAndTime => return Ok(Outcome::DateAndTime(device.date_and_time().await?)),
        Command::SetDateAndTime(date_time) => device.set_date_and_time(date_time).await?,
        Command::SetScopes { name, location } => device.set_scopes(&name, &location).await?,
        Command::SetVideoConfig(config) => device.set_video_config(config).await?,
        Command::SetInterfaces(interfaces) => device.set_interfaces(interfaces).await?,
        Command::SetProtocols(protocols) => device.set_protocols(protocols).await?,
        Command::ResetFactory => device.reset_factory().await?,
        Command::Reboot => device.reboot().await?,
        Command::ContinuousMove(velocity) => device.continuous_move(velocity).await?,
        Command::StopMovement => device.stop_movement().await?,
    }
    Ok(Outcome::Done)
}
