//! cosmicseed-core: Core traits and types for cosmic-ray track seeding.
//!
//! This crate provides the data model shared by the seeding pipeline:
//! hits and time clusters, seed status flags, candidate and line seeds,
//! per-channel calibration, and the fit-engine trait.
//!

pub mod calibration;
pub mod config;
pub mod error;
pub mod event;
pub mod fit;
pub mod hit;
pub mod seed;
pub mod statistics;
pub mod status;

pub use calibration::{
    Calibration, ChannelResponse, ConditionsSource, FixedConditions, RunConditions,
};
pub use config::{CorrelationStrategy, SeedConfig, TimeWindow};
pub use error::{Error, Result};
pub use event::{EventData, EventId, TimeCluster};
pub use fit::FitEngine;
pub use hit::{ChannelId, ComboHit, Hit, RawHit, Vec3};
pub use seed::{canonical_direction, CandidateSeed, LineParams, LineSeed, SeedHit, TrackFit};
pub use statistics::{Rejection, SeedingStatistics};
pub use status::{FitFlag, FlagMatch, SaveFlags, SeedStatus};
