use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::bail;
use camfleet_common::config::Config;
use camfleet_common::discovery::Generation;
use camfleet_core::{DeviceHandle, FleetEvent, Manager};
use colored::*;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout_at;
use tracing::warn;

use crate::capture::{self, ReplayOptions};
use crate::terminal::{colors, format, print, spinner};

pub async fn discover(path: &Path, cfg: &Config, replay: &ReplayOptions) -> anyhow::Result<()> {
    let manager = capture::open_fleet(path, cfg, replay)?;

    let start_time: Instant = Instant::now();
    run_cycle(&manager, replay.wait).await?;

    let mut devices: Vec<(String, DeviceHandle)> = manager.devices().await;
    discovery_ends(&mut devices, start_time.elapsed(), cfg);
    Ok(())
}

/// Starts one discovery cycle and waits until the manager announces its end.
pub async fn run_cycle(manager: &Manager, wait: Duration) -> anyhow::Result<Generation> {
    let mut events = manager.subscribe();
    let generation = manager.start_discovery().await?;
    let deadline = tokio::time::Instant::now() + wait;
    spinner::start("Waiting for devices to answer...");
    let mut found: usize = 0;

    loop {
        let event = match timeout_at(deadline, events.recv()).await {
            Ok(event) => event,
            Err(_) => {
                spinner::stop();
                warn!("Discovery did not end within {}s, showing partial results", wait.as_secs());
                return Ok(generation);
            }
        };

        match event {
            Ok(FleetEvent::DeviceFound { generation: g, .. }) if g == generation => {
                found += 1;
                spinner::report_progress(found);
            }
            Ok(FleetEvent::DiscoveryEnded { generation: g, .. }) if g == generation => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {skipped} fleet events, counts may be off");
            }
            Err(RecvError::Closed) => {
                spinner::stop();
                bail!("fleet manager stopped before discovery ended");
            }
        }
    }

    spinner::stop();
    Ok(generation)
}

fn discovery_ends(devices: &mut [(String, DeviceHandle)], total_time: Duration, cfg: &Config) {
    if devices.is_empty() {
        print::header("zero devices detected", cfg.quiet);
        print::no_results();
        return;
    }

    print::header("fleet", cfg.quiet);
    devices.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (idx, (_, device)) in devices.iter().enumerate() {
        let probe = device.probe_data();
        let name = probe.scope("name").unwrap_or_else(|| probe.endpoint_address.clone());
        print::tree_head(idx, &name);
        print::as_tree_one_level(format::probe_to_details(probe));
        if idx + 1 != devices.len() {
            print::print("");
        }
    }
    print_summary(devices.len(), total_time, cfg);
}

fn print_summary(count: usize, total_time: Duration, cfg: &Config) {
    let active: ColoredString = format!("{count} devices").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("Discovery Complete: {active} admitted in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    if cfg.quiet == 0 {
        print::fat_separator();
    }
    print::print(&output);
}
