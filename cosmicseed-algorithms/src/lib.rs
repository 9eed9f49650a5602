//! cosmicseed-algorithms: Seeding stages for straight cosmic tracks.
//!
//! This crate provides the per-cluster stages and the driver that chains them:
//! - **Ordering** - deterministic descending-height hit order
//! - **Qualifier** - in-window good-hit count
//! - **Assembler** - candidate seed construction and acceptance gates
//! - **Refiner** - drift fit with outlier removal
//! - **Correlation** - combo-hit to raw-hit matching
//! - **Pipeline** - [`SeedFinder`], sequential per event, parallel across events
//! - **Line fit** - reference least-squares [`FitEngine`] implementation
//!
#![warn(missing_docs)]

mod assembler;
mod correlation;
mod line_fit;
mod ordering;
mod pipeline;
mod qualifier;
mod refiner;

pub use assembler::SeedAssembler;
pub use correlation::{Correlation, RawHitMatcher};
pub use line_fit::{LineFitConfig, LineFitEngine};
pub use ordering::order_hits_by_height;
pub use pipeline::{total_statistics, EventOutput, PipelineConfig, SeedFinder, SeedScratch};
pub use qualifier::good_hits;
pub use refiner::DriftRefiner;

// Re-export core seeding types
pub use cosmicseed_core::fit::FitEngine;
pub use cosmicseed_core::statistics::{Rejection, SeedingStatistics};
