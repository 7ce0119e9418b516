//! # camfleet core
//!
//! Device registry and discovery reconciliation for a fleet of network cameras.
//!
//! * **[`registry`]**: the single map from endpoint address to live device.
//! * **[`manager`]**: the facade that drives discovery cycles, admits devices and
//!   routes commands by endpoint address.
//! * **[`events`]**: notifications published by the manager.
//! * **[`replay`]**: a discoverer that replays a fixed set of records per cycle.
//! * **[`mock`]**: in-memory collaborators for tests and development without cameras.

pub mod events;
pub mod manager;
pub mod mock;
pub mod registry;
pub mod replay;

pub use events::FleetEvent;
pub use manager::{Command, Manager, Outcome};
pub use registry::{Admission, DeviceHandle, DeviceRegistry};
