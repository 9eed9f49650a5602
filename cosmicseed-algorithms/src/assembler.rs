//! Candidate seed assembly.
//!
//! Admission and acceptance run as a fixed sequence of gates:
//!
//! 1. Good-hit count of the time cluster (multiplicity-weighted, in window)
//! 2. Hit ordering, then combo-hit and raw-hit count thresholds
//! 3. `Straight | HitsOK` set, initial fit invoked
//! 4. Fit must report `HelixOK`, `HelixConverged` and `converged`
//! 5. Save requirement checked against the accepted status
//! 6. Raw-hit seed records filled
//! 7. Fit engine's own quality check; failure clears the fit flags
//!
//! The first failing gate ends the cluster with a [`Rejection`].

use crate::ordering::order_hits_by_height;
use crate::qualifier::good_hits;
use cosmicseed_core::config::SeedConfig;
use cosmicseed_core::event::TimeCluster;
use cosmicseed_core::fit::FitEngine;
use cosmicseed_core::hit::{ComboHit, Hit};
use cosmicseed_core::seed::{CandidateSeed, SeedHit};
use cosmicseed_core::statistics::Rejection;
use cosmicseed_core::status::FitFlag;

/// Builds and accepts candidate seeds for single time clusters.
pub struct SeedAssembler<'a, E: FitEngine> {
    config: &'a SeedConfig,
    engine: &'a E,
}

impl<'a, E: FitEngine> SeedAssembler<'a, E> {
    /// Create an assembler over a configuration and fit engine.
    pub fn new(config: &'a SeedConfig, engine: &'a E) -> Self {
        Self { config, engine }
    }

    /// Runs every acceptance gate for one cluster.
    ///
    /// `ordered` is scratch space for the ordered hit indices; its previous
    /// contents are discarded.
    ///
    /// # Errors
    /// Returns the [`Rejection`] of the first gate the cluster fails.
    pub fn assemble(
        &self,
        cluster_index: usize,
        cluster: &TimeCluster,
        hits: &[ComboHit],
        ordered: &mut Vec<usize>,
    ) -> Result<CandidateSeed, Rejection> {
        let config = self.config;

        let n_good = good_hits(cluster, hits, config.time_window);
        if n_good < config.min_good_hits {
            return Err(Rejection::TooFewGoodHits {
                found: n_good,
                required: config.min_good_hits,
            });
        }

        order_hits_by_height(hits, &cluster.hits, ordered);

        let n_combo = ordered.len();
        let n_raw: usize = ordered
            .iter()
            .map(|&index| hits[index].multiplicity() as usize)
            .sum();
        if n_combo < config.min_combo_hits {
            return Err(Rejection::TooFewComboHits {
                found: n_combo,
                required: config.min_combo_hits,
            });
        }
        if n_raw < config.min_raw_hits {
            return Err(Rejection::TooFewRawHits {
                found: n_raw,
                required: config.min_raw_hits,
            });
        }

        let mut seed = CandidateSeed::new(cluster_index, cluster.t0);
        seed.hit_indices = ordered.clone();
        seed.hits = ordered
            .iter()
            .map(|&index| ComboHit {
                outlier: false,
                ..hits[index].clone()
            })
            .collect();
        seed.status.merge(FitFlag::Straight);
        seed.status.merge(FitFlag::HitsOk);

        self.engine.begin_fit(&mut seed);
        if !(seed.status.is_accepted() && seed.fit.converged) {
            return Err(Rejection::FitNotConverged);
        }
        seed.status.merge(FitFlag::HelixOk);

        if !config.save_flags.is_satisfied_by(&seed.status) {
            return Err(Rejection::SaveFlagsUnsatisfied);
        }

        fill_seed_hits(&mut seed);

        if !self.engine.good_track(&seed.fit) {
            seed.status.clear(FitFlag::HelixConverged);
            seed.status.clear(FitFlag::HelixOk);
            return Err(Rejection::BadTrack);
        }

        Ok(seed)
    }
}

/// Rebuilds the raw-hit seed records from the seed's current hits.
pub(crate) fn fill_seed_hits(seed: &mut CandidateSeed) {
    let t0 = seed.t0;
    seed.seed_hits = seed
        .hits
        .iter()
        .flat_map(|hit| hit.raw_indices.iter())
        .map(|&index| SeedHit { index, t0 })
        .collect();
}
