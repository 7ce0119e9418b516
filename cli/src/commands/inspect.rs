use std::path::Path;

use camfleet_common::config::Config;
use camfleet_common::error::ManagerError;
use tracing::error;

use super::discover;
use crate::capture::{self, ReplayOptions};
use crate::terminal::{format, print};

pub async fn inspect(
    path: &Path,
    endpoint: &str,
    cfg: &Config,
    replay: &ReplayOptions,
) -> anyhow::Result<()> {
    let manager = capture::open_fleet(path, cfg, replay)?;
    let generation = discover::run_cycle(&manager, replay.wait).await?;

    let Some(device) = manager.lookup(endpoint).await else {
        let err = ManagerError::UnknownDevice(endpoint.to_string());
        error!("{err} (cycle {generation})");
        return Err(err.into());
    };

    let probe = device.probe_data();
    print::tree_head(0, &probe.endpoint_address);
    print::as_tree_one_level(format::probe_to_details(probe));
    for uri in probe.scope_uris() {
        print::aligned_line("Scope", uri);
    }
    Ok(())
}
