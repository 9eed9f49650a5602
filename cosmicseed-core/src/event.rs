//! Per-event input collections.

use crate::error::{Error, Result};
use crate::hit::{ComboHit, RawHit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one detector event.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventId {
    /// Run number, the key for conditions lookup.
    pub run: u32,
    /// Subrun within the run.
    #[serde(default)]
    pub subrun: u32,
    /// Event number within the subrun.
    pub event: u32,
}

impl EventId {
    /// Creates a new event identifier.
    #[must_use]
    pub const fn new(run: u32, subrun: u32, event: u32) -> Self {
        Self { run, subrun, event }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} subrun {} event {}",
            self.run, self.subrun, self.event
        )
    }
}

/// A set of combo-hit indices believed to come from one coincident track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeCluster {
    /// Reference time of the cluster (ns).
    pub t0: f64,
    /// Indices into the event's combo-hit collection.
    pub hits: Vec<usize>,
}

impl TimeCluster {
    /// Creates a new time cluster.
    #[must_use]
    pub fn new(t0: f64, hits: Vec<usize>) -> Self {
        Self { t0, hits }
    }

    /// Returns the number of hits in the cluster.
    #[must_use]
    pub fn nhits(&self) -> usize {
        self.hits.len()
    }
}

/// All collections the seed finder consumes for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Event identity.
    pub id: EventId,
    /// Combined hits, referenced by time-cluster indices.
    #[serde(default)]
    pub combo_hits: Vec<ComboHit>,
    /// Elementary readings, referenced by combo-hit `raw_indices`.
    #[serde(default)]
    pub raw_hits: Vec<RawHit>,
    /// Time clusters to seed.
    #[serde(default)]
    pub time_clusters: Vec<TimeCluster>,
}

impl EventData {
    /// Creates an empty event.
    #[must_use]
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Checks that every index held by the collections points inside the
    /// collection it refers to.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHitIndex`] on the first dangling index.
    pub fn validate(&self) -> Result<()> {
        for (cluster, tc) in self.time_clusters.iter().enumerate() {
            if let Some(&index) = tc.hits.iter().find(|&&i| i >= self.combo_hits.len()) {
                return Err(Error::InvalidHitIndex {
                    collection: "combo",
                    owner: cluster,
                    index,
                    len: self.combo_hits.len(),
                });
            }
        }
        for (combo, hit) in self.combo_hits.iter().enumerate() {
            if let Some(&index) = hit.raw_indices.iter().find(|&&i| i >= self.raw_hits.len()) {
                return Err(Error::InvalidHitIndex {
                    collection: "raw",
                    owner: combo,
                    index,
                    len: self.raw_hits.len(),
                });
            }
        }
        Ok(())
    }
}
