//! Drift-fit refinement of accepted seeds.

use crate::assembler::fill_seed_hits;
use cosmicseed_core::calibration::Calibration;
use cosmicseed_core::fit::FitEngine;
use cosmicseed_core::seed::CandidateSeed;
use cosmicseed_core::statistics::Rejection;
use cosmicseed_core::status::FitFlag;

/// Runs the drift fit and drops the hits it rejects.
pub struct DriftRefiner<'a, E: FitEngine> {
    engine: &'a E,
}

impl<'a, E: FitEngine> DriftRefiner<'a, E> {
    /// Create a refiner over a fit engine.
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Refits the seed and keeps only its non-outlier hits.
    ///
    /// Returns the number of hits removed. The seed's original hit list is
    /// replaced; nothing of the removed hits is kept.
    ///
    /// # Errors
    /// [`Rejection::DriftNotConverged`] if the drift fit fails (the fit flags
    /// are cleared), [`Rejection::HitListChanged`] if the engine resized the
    /// hit list, [`Rejection::NoActiveHits`] if every hit was rejected.
    pub fn refine(
        &self,
        seed: &mut CandidateSeed,
        calibration: &Calibration,
    ) -> Result<usize, Rejection> {
        self.engine.drift_fit(seed, calibration);
        if !seed.fit.drift_converged {
            seed.status.clear(FitFlag::HelixConverged);
            seed.status.clear(FitFlag::HelixOk);
            return Err(Rejection::DriftNotConverged);
        }

        let before = seed.hit_indices.len();
        if seed.hits.len() != before {
            seed.status.clear(FitFlag::HelixConverged);
            seed.status.clear(FitFlag::HelixOk);
            return Err(Rejection::HitListChanged {
                before,
                after: seed.hits.len(),
            });
        }

        let (hits, indices): (Vec<_>, Vec<_>) = std::mem::take(&mut seed.hits)
            .into_iter()
            .zip(std::mem::take(&mut seed.hit_indices))
            .filter(|(hit, _)| !hit.outlier)
            .unzip();
        seed.hits = hits;
        seed.hit_indices = indices;

        if seed.hits.is_empty() {
            return Err(Rejection::NoActiveHits);
        }
        fill_seed_hits(seed);

        Ok(before - seed.hits.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmicseed_core::hit::{ChannelId, ComboHit, Vec3};
    use cosmicseed_core::seed::TrackFit;

    /// Drift engine that flags a fixed set of hit positions as outliers.
    struct FlaggingEngine {
        outliers: Vec<usize>,
        converge: bool,
    }

    impl FitEngine for FlaggingEngine {
        fn name(&self) -> &'static str {
            "flagging"
        }

        fn begin_fit(&self, _seed: &mut CandidateSeed) {}

        fn drift_fit(&self, seed: &mut CandidateSeed, _calibration: &Calibration) {
            for &i in &self.outliers {
                seed.hits[i].outlier = true;
            }
            seed.fit.drift_converged = self.converge;
        }

        fn good_track(&self, _fit: &TrackFit) -> bool {
            true
        }
    }

    fn accepted_seed(n: usize) -> CandidateSeed {
        let mut seed = CandidateSeed::new(0, 1000.0);
        for i in 0..n {
            seed.hits.push(
                ComboHit::new(Vec3::new(0.0, -(i as f64), 0.0), 1000.0, ChannelId::new(i as u32))
                    .with_raw_indices(vec![100 + i]),
            );
            seed.hit_indices.push(i * 2);
        }
        for flag in FitFlag::ALL {
            seed.status.merge(flag);
        }
        seed.fit.converged = true;
        seed
    }

    #[test]
    fn test_outliers_removed_in_sync() {
        let engine = FlaggingEngine {
            outliers: vec![1, 4],
            converge: true,
        };
        let mut seed = accepted_seed(6);
        let removed = DriftRefiner::new(&engine)
            .refine(&mut seed, &Calibration::default())
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(seed.nhits(), 4);
        assert_eq!(seed.hit_indices, vec![0, 4, 6, 10]);
        assert!(seed.hits.iter().all(|h| !h.outlier));
        let raw: Vec<usize> = seed.seed_hits.iter().map(|h| h.index).collect();
        assert_eq!(raw, vec![100, 102, 103, 105]);
        assert!(seed.status.is_accepted());
    }

    #[test]
    fn test_not_converged_clears_flags() {
        let engine = FlaggingEngine {
            outliers: vec![],
            converge: false,
        };
        let mut seed = accepted_seed(4);
        let err = DriftRefiner::new(&engine)
            .refine(&mut seed, &Calibration::default())
            .unwrap_err();

        assert_eq!(err, Rejection::DriftNotConverged);
        assert!(!seed.status.helix_ok);
        assert!(!seed.status.helix_converged);
        assert!(seed.status.straight);
        assert_eq!(seed.nhits(), 4);
    }

    #[test]
    fn test_resized_hit_list_rejected() {
        struct DroppingEngine;
        impl FitEngine for DroppingEngine {
            fn name(&self) -> &'static str {
                "dropping"
            }
            fn begin_fit(&self, _seed: &mut CandidateSeed) {}
            fn drift_fit(&self, seed: &mut CandidateSeed, _calibration: &Calibration) {
                seed.hits.pop();
                seed.fit.drift_converged = true;
            }
            fn good_track(&self, _fit: &TrackFit) -> bool {
                true
            }
        }

        let mut seed = accepted_seed(5);
        let err = DriftRefiner::new(&DroppingEngine)
            .refine(&mut seed, &Calibration::default())
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::HitListChanged {
                before: 5,
                after: 4
            }
        );
        assert!(!seed.status.is_accepted());
        assert_eq!(seed.hit_indices.len(), 5);
    }

    #[test]
    fn test_all_outliers_rejected() {
        let engine = FlaggingEngine {
            outliers: vec![0, 1, 2],
            converge: true,
        };
        let mut seed = accepted_seed(3);
        let err = DriftRefiner::new(&engine)
            .refine(&mut seed, &Calibration::default())
            .unwrap_err();
        assert_eq!(err, Rejection::NoActiveHits);
        assert!(seed.hits.is_empty());
    }
}
