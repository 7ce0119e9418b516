//! A [`Discoverer`] that answers every probe with a fixed set of records.
//!
//! Used to feed captured discovery traffic through the manager, e.g. from a JSON capture
//! file. Each cycle runs on its own task and ends with a search-ended signal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use camfleet_common::discovery::{Discoverer, DiscoveryRecord, ProbeSink};
use camfleet_common::error::DiscoveryError;
use tracing::debug;

pub struct ReplayDiscoverer {
    records: Arc<Vec<DiscoveryRecord>>,
    pace: Duration,
}

impl ReplayDiscoverer {
    pub fn new(records: Vec<DiscoveryRecord>) -> Self {
        Self {
            records: Arc::new(records),
            pace: Duration::ZERO,
        }
    }

    /// Waits `pace` before each record, to mimic devices answering over time.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

#[async_trait]
impl Discoverer for ReplayDiscoverer {
    async fn start_probe(&self, sink: ProbeSink) -> Result<(), DiscoveryError> {
        let records = Arc::clone(&self.records);
        let pace = self.pace;

        tokio::spawn(async move {
            let generation = sink.generation();
            for record in records.iter() {
                if !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
                if !sink.record(record.clone()) {
                    debug!(%generation, "replay stopped, manager is gone");
                    return;
                }
            }
            sink.search_ended();
        });

        Ok(())
    }
}
