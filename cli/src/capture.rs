//! Discovery captures: JSON arrays of raw discovery records, replayed through the
//! fleet manager as if the devices had just answered a probe.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use camfleet_common::config::Config;
use camfleet_common::credentials::Credentials;
use camfleet_common::device::{Device, DeviceState};
use camfleet_common::discovery::{DiscoveryRecord, ProbeData};
use camfleet_core::Manager;
use camfleet_core::replay::ReplayDiscoverer;
use tracing::info;

pub struct ReplayOptions {
    /// Upper bound on how long one discovery cycle may take.
    pub wait: Duration,
    pub pace: Duration,
}

/// Device known only from a capture. It has no transport, so every live operation
/// reports itself unsupported.
pub struct CapturedDevice {
    probe: ProbeData,
}

impl Device for CapturedDevice {
    fn probe_data(&self) -> &ProbeData {
        &self.probe
    }

    fn state(&self) -> DeviceState {
        DeviceState::default()
    }
}

fn open_device(probe: ProbeData, _credentials: Credentials) -> Arc<dyn Device> {
    Arc::new(CapturedDevice { probe })
}

pub fn parse(text: &str) -> anyhow::Result<Vec<DiscoveryRecord>> {
    serde_json::from_str(text).context("capture must be a JSON array of string maps")
}

pub fn load(path: &Path) -> anyhow::Result<Vec<DiscoveryRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read capture {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid capture {}", path.display()))
}

/// Builds a manager whose discoverer replays the capture at `path`.
pub fn open_fleet(path: &Path, cfg: &Config, replay: &ReplayOptions) -> anyhow::Result<Manager> {
    let records = load(path)?;
    info!("Loaded {} discovery records from {}", records.len(), path.display());

    let discoverer = ReplayDiscoverer::new(records).with_pace(replay.pace);
    Ok(Manager::new(cfg, Arc::new(discoverer), Arc::new(open_device)))
}
