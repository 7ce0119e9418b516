//! Error types shared by the fleet crates.
//!
//! All error types use thiserror. Messages never carry credentials.

/// Failure reported by a [`Device`](crate::device::Device) for one capability call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("operation not supported by this device: {0}")]
    Unsupported(&'static str),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("device rejected the request: {0}")]
    Rejected(String),

    #[error("device did not answer in time")]
    Timeout,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Reasons a raw discovery record cannot become probe data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("discovery record has no endpoint address")]
    MissingEndpoint,
}

/// Failure to start a probe cycle.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discoverer unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the fleet manager to its callers.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("device unknown: {0}")]
    UnknownDevice(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("failed to start discovery: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl ManagerError {
    pub fn is_unknown_device(&self) -> bool {
        matches!(self, ManagerError::UnknownDevice(_))
    }
}
