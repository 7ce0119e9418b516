//! # Discovery Contract
//!
//! A [`Discoverer`] runs one probe cycle per call to [`Discoverer::start_probe`] and
//! reports back through the [`ProbeSink`] it was handed. Every event pushed into a sink
//! carries the [`Generation`] that was active when the probe was sent, so the consumer
//! can tell a straggler from a superseded cycle apart from a current record.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::DiscoveryError;

mod probe;
mod record;

pub use probe::ProbeData;
pub use record::{DiscoveryRecord, keys};

/// Monotonic counter identifying one discovery cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event delivered from a discoverer to the fleet manager.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    /// One device answered the probe.
    Record {
        generation: Generation,
        record: DiscoveryRecord,
    },
    /// The probe cycle is over; no further records follow for this generation.
    SearchEnded { generation: Generation },
}

impl DiscoveryEvent {
    pub fn generation(&self) -> Generation {
        match self {
            DiscoveryEvent::Record { generation, .. } => *generation,
            DiscoveryEvent::SearchEnded { generation } => *generation,
        }
    }
}

/// Write end handed to a discoverer for exactly one probe cycle.
///
/// Cloning is cheap; all clones tag their events with the same generation.
#[derive(Debug, Clone)]
pub struct ProbeSink {
    generation: Generation,
    tx: UnboundedSender<DiscoveryEvent>,
}

impl ProbeSink {
    pub fn new(generation: Generation, tx: UnboundedSender<DiscoveryEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Pushes one raw record. Returns `false` once the consumer is gone.
    pub fn record(&self, record: DiscoveryRecord) -> bool {
        self.tx
            .send(DiscoveryEvent::Record {
                generation: self.generation,
                record,
            })
            .is_ok()
    }

    /// Signals the end of this cycle. Returns `false` once the consumer is gone.
    pub fn search_ended(&self) -> bool {
        self.tx
            .send(DiscoveryEvent::SearchEnded {
                generation: self.generation,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs network probe cycles.
///
/// Implementations must return from [`start_probe`](Discoverer::start_probe) without
/// waiting for responses; records and the end signal are delivered later through the
/// sink, in order, from a single task per cycle.
#[async_trait]
pub trait Discoverer: Send + Sync {
    async fn start_probe(&self, sink: ProbeSink) -> Result<(), DiscoveryError>;
}
