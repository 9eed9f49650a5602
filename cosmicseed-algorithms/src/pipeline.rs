//! Per-event seeding pipeline.

use crate::assembler::SeedAssembler;
use crate::correlation::RawHitMatcher;
use crate::line_fit::{LineFitConfig, LineFitEngine};
use crate::refiner::DriftRefiner;
use cosmicseed_core::calibration::{Calibration, ConditionsSource};
use cosmicseed_core::config::SeedConfig;
use cosmicseed_core::error::{Error, Result};
use cosmicseed_core::event::{EventData, EventId};
use cosmicseed_core::fit::FitEngine;
use cosmicseed_core::seed::{CandidateSeed, LineSeed};
use cosmicseed_core::statistics::SeedingStatistics;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seeding thresholds plus the reference fit engine's tunables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed finder thresholds.
    pub seeding: SeedConfig,
    /// Line-fit tunables.
    pub fit: LineFitConfig,
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or holds invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks both sections.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.seeding.validate()?;
        self.fit.validate().map_err(Error::ConfigError)
    }
}

/// Scratch buffers reused across clusters.
///
/// One instance per worker thread; contents are meaningless between calls.
#[derive(Debug, Default)]
pub struct SeedScratch {
    /// Ordered combo-hit indices of the current cluster.
    pub ordered: Vec<usize>,
}

impl SeedScratch {
    /// Create empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the buffers, keeping their capacity.
    pub fn reset(&mut self) {
        self.ordered.clear();
    }
}

/// Everything the pipeline produced for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOutput {
    /// Event the output belongs to.
    pub id: EventId,
    /// Accepted seeds, in time-cluster order.
    pub seeds: Vec<CandidateSeed>,
    /// One line seed per accepted seed, unless dropped as uncorrelated.
    pub line_seeds: Vec<LineSeed>,
    /// Counters for this event alone.
    pub statistics: SeedingStatistics,
}

impl EventOutput {
    /// Create an empty output for an event.
    #[must_use]
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Sums the statistics of several events.
#[must_use]
pub fn total_statistics(outputs: &[EventOutput]) -> SeedingStatistics {
    outputs
        .iter()
        .fold(SeedingStatistics::default(), |mut total, output| {
            total += &output.statistics;
            total
        })
}

/// Straight-line seed finder.
///
/// Holds no per-event state: one finder can serve any number of threads.
#[derive(Debug, Clone)]
pub struct SeedFinder<E: FitEngine> {
    config: SeedConfig,
    engine: E,
}

impl SeedFinder<LineFitEngine> {
    /// Finder using the reference line fit.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn with_line_fit(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.seeding,
            engine: LineFitEngine::new(config.fit),
        })
    }
}

impl<E: FitEngine> SeedFinder<E> {
    /// Create a finder over any fit engine.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn new(config: SeedConfig, engine: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Get the fit engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs every time cluster of one event, in input order.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHitIndex`] if the event holds dangling hit
    /// indices. Nothing is produced for such an event.
    pub fn process_event(
        &self,
        event: &EventData,
        calibration: &Calibration,
        scratch: &mut SeedScratch,
    ) -> Result<EventOutput> {
        event.validate()?;

        let assembler = SeedAssembler::new(&self.config, &self.engine);
        let refiner = DriftRefiner::new(&self.engine);
        let matcher = RawHitMatcher::new(&event.raw_hits, self.config.correlation);
        let mut output = EventOutput::new(event.id);
        let stats = &mut output.statistics;

        for (index, cluster) in event.time_clusters.iter().enumerate() {
            scratch.reset();
            stats.clusters_processed += 1;

            let mut seed =
                match assembler.assemble(index, cluster, &event.combo_hits, &mut scratch.ordered) {
                    Ok(seed) => seed,
                    Err(rejection) => {
                        debug!("{}: cluster {index} rejected: {rejection}", event.id);
                        stats.record(rejection);
                        continue;
                    }
                };

            if self.config.drift {
                match refiner.refine(&mut seed, calibration) {
                    Ok(removed) => stats.outliers_removed += removed,
                    Err(rejection) => {
                        debug!("{}: cluster {index} rejected: {rejection}", event.id);
                        stats.record(rejection);
                        continue;
                    }
                }
            }

            let correlation = matcher.correlate(&seed.hits);
            stats.unmatched_hits += correlation.unmatched;

            let line = LineSeed::from_seed(&seed, correlation.indices);
            debug!(
                "{}: cluster {index} seeded with {} hits ({} raw), chi2/ndof {:.2}",
                event.id,
                seed.nhits(),
                line.raw_hit_indices.len(),
                seed.fit.chi2_dof
            );

            stats.seeds += 1;
            output.seeds.push(seed);

            if line.raw_hit_indices.is_empty() {
                warn!("{}: cluster {index} line seed has no raw hits", event.id);
                stats.uncorrelated_line_seeds += 1;
                if self.config.drop_uncorrelated_line_seeds {
                    continue;
                }
            }
            stats.line_seeds += 1;
            output.line_seeds.push(line);
        }

        Ok(output)
    }

    /// Like [`Self::process_event`], looking up the event's calibration.
    ///
    /// # Errors
    /// Also returns [`Error::MissingConditions`] if no calibration covers
    /// the event's run.
    pub fn process_event_with<C: ConditionsSource + ?Sized>(
        &self,
        event: &EventData,
        conditions: &C,
        scratch: &mut SeedScratch,
    ) -> Result<EventOutput> {
        let calibration = conditions.calibration(&event.id)?;
        self.process_event(event, calibration, scratch)
    }

    /// Processes independent events in parallel.
    ///
    /// Outputs are in input order. The first failing event aborts the batch.
    ///
    /// # Errors
    /// Returns the error of a failing event.
    pub fn process_events<C: ConditionsSource + ?Sized>(
        &self,
        events: &[EventData],
        conditions: &C,
    ) -> Result<Vec<EventOutput>> {
        let outputs: Vec<EventOutput> = events
            .par_iter()
            .map_init(SeedScratch::new, |scratch, event| {
                self.process_event_with(event, conditions, scratch)
            })
            .collect::<Result<_>>()?;

        if log::log_enabled!(log::Level::Debug) {
            let total = total_statistics(&outputs);
            debug!(
                "{} events, {} clusters: {} seeds, {} line seeds, {} rejected ({})",
                outputs.len(),
                total.clusters_processed,
                total.seeds,
                total.line_seeds,
                total.rejected(),
                self.engine.name()
            );
        }
        Ok(outputs)
    }
}
