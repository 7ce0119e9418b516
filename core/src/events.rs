use std::fmt;

use camfleet_common::discovery::Generation;

use crate::registry::DeviceHandle;

/// Notifications published by the [`Manager`](crate::manager::Manager).
///
/// Both variants carry the generation they belong to, so a subscriber can ignore
/// announcements from a cycle that has since been superseded.
#[derive(Clone)]
pub enum FleetEvent {
    /// A device was admitted into the registry for the first time in this cycle.
    DeviceFound {
        generation: Generation,
        device: DeviceHandle,
    },
    /// Every record of the cycle has been processed.
    DiscoveryEnded {
        generation: Generation,
        devices: usize,
    },
}

impl FleetEvent {
    pub fn generation(&self) -> Generation {
        match self {
            FleetEvent::DeviceFound { generation, .. } => *generation,
            FleetEvent::DiscoveryEnded { generation, .. } => *generation,
        }
    }
}

impl fmt::Debug for FleetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetEvent::DeviceFound { generation, device } => f
                .debug_struct("DeviceFound")
                .field("generation", generation)
                .field("endpoint_address", &device.endpoint_address())
                .finish(),
            FleetEvent::DiscoveryEnded {
                generation,
                devices,
            } => f
                .debug_struct("DiscoveryEnded")
                .field("generation", generation)
                .field("devices", devices)
                .finish(),
        }
    }
}
