//! # Device Registry
//!
//! Owns every live [`Device`] keyed by endpoint address.
//!
//! All mutation goes through [`DeviceRegistry::admit`], [`DeviceRegistry::admit_tagged`],
//! [`DeviceRegistry::finish`] and [`DeviceRegistry::clear`], which take the write half of
//! one lock. Readers share the
//! read half and therefore observe either the full pre-clear map or the empty post-clear
//! map, never something in between.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use camfleet_common::device::Device;
use camfleet_common::discovery::{Generation, ProbeData};
use tokio::sync::RwLock;
use tracing::debug;

pub type DeviceHandle = Arc<dyn Device>;

/// Result of a generation-checked admission.
#[derive(Clone)]
pub enum Admission {
    /// The address was unknown; the factory ran and its device was inserted.
    New(DeviceHandle),
    /// The address was already present; the factory did not run.
    Known(DeviceHandle),
    /// The record belongs to a superseded or already finished cycle and was dropped.
    Stale,
}

impl Admission {
    pub fn is_new(&self) -> bool {
        matches!(self, Admission::New(_))
    }
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Admission::New(device) => f.debug_tuple("New").field(&device.endpoint_address()).finish(),
            Admission::Known(device) => f.debug_tuple("Known").field(&device.endpoint_address()).finish(),
            Admission::Stale => f.write_str("Stale"),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    generation: Generation,
    /// Set once the end of `generation` was announced.
    ended: bool,
    devices: HashMap<String, DeviceHandle>,
}

impl RegistryState {
    fn admit<F>(&mut self, probe: ProbeData, factory: F) -> (DeviceHandle, bool)
    where
        F: FnOnce(ProbeData) -> DeviceHandle,
    {
        match self.devices.entry(probe.endpoint_address.clone()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let device = factory(probe);
                entry.insert(Arc::clone(&device));
                (device, true)
            }
        }
    }
}

#[derive(Default)]
pub struct DeviceRegistry {
    state: RwLock<RegistryState>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn exists(&self, address: &str) -> bool {
        self.state.read().await.devices.contains_key(address)
    }

    /// Device registered under `address`. `None` is an ordinary answer, not an error.
    pub async fn get(&self, address: &str) -> Option<DeviceHandle> {
        self.state.read().await.devices.get(address).cloned()
    }

    /// Snapshot of every (address, device) pair, in no particular order.
    pub async fn devices(&self) -> Vec<(String, DeviceHandle)> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .map(|(address, device)| (address.clone(), Arc::clone(device)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.devices.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.devices.is_empty()
    }

    /// Generation of the discovery cycle the current contents belong to.
    pub async fn generation(&self) -> Generation {
        self.state.read().await.generation
    }

    /// Inserts a device for `probe` unless its address is already known.
    ///
    /// Returns the registered device and whether it was created by this call. The
    /// factory runs at most once, and only when the address was absent.
    pub async fn admit<F>(&self, probe: ProbeData, factory: F) -> (DeviceHandle, bool)
    where
        F: FnOnce(ProbeData) -> DeviceHandle,
    {
        self.state.write().await.admit(probe, factory)
    }

    /// Like [`admit`](Self::admit), but only while `generation` is current and not yet
    /// finished.
    ///
    /// The generation check and the insertion happen under the same write lock, so a
    /// record can never slip in after [`clear`](Self::clear) has advanced the cycle or
    /// after [`finish`](Self::finish) has closed it.
    pub async fn admit_tagged<F>(
        &self,
        generation: Generation,
        probe: ProbeData,
        factory: F,
    ) -> Admission
    where
        F: FnOnce(ProbeData) -> DeviceHandle,
    {
        let mut state = self.state.write().await;
        if state.generation != generation || state.ended {
            return Admission::Stale;
        }

        match state.admit(probe, factory) {
            (device, true) => Admission::New(device),
            (device, false) => Admission::Known(device),
        }
    }

    /// Closes `generation` to further admissions.
    ///
    /// Returns the device count at that moment, or `None` when `generation` is not the
    /// current cycle or was already finished.
    pub async fn finish(&self, generation: Generation) -> Option<usize> {
        let mut state = self.state.write().await;
        if state.generation != generation || state.ended {
            return None;
        }

        state.ended = true;
        Some(state.devices.len())
    }

    /// Disposes every device, empties the map and opens the next generation.
    pub async fn clear(&self) -> Generation {
        let mut state = self.state.write().await;
        let disposed = state.devices.len();

        for (_, device) in state.devices.drain() {
            device.dispose();
        }
        state.generation = state.generation.next();
        state.ended = false;

        debug!(disposed, generation = %state.generation, "registry cleared");
        state.generation
    }
}
