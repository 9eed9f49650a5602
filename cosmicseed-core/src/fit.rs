//! Fit-engine traits.

use crate::calibration::Calibration;
use crate::seed::{CandidateSeed, TrackFit};

/// Trait for straight-line fit engines.
///
/// The seed finder only drives the fit through these calls; the numerics
/// live in the implementation. Calls are synchronous and depend only on
/// their arguments.
pub trait FitEngine: Send + Sync {
    /// Engine name.
    fn name(&self) -> &'static str;

    /// Initial fit over `seed.hits`, which arrive ordered by descending `y`.
    ///
    /// On success the engine fills `seed.fit.initial`, sets
    /// `seed.fit.converged` and merges `HelixOK` and `HelixConverged` into
    /// `seed.status`. On failure it leaves those unset.
    fn begin_fit(&self, seed: &mut CandidateSeed);

    /// Drift-based refit using per-channel calibration.
    ///
    /// Fills `seed.fit.drift`, sets `seed.fit.drift_converged` and marks
    /// rejected hits with `outlier = true`. Must not add or remove hits.
    fn drift_fit(&self, seed: &mut CandidateSeed, calibration: &Calibration);

    /// Independent quality check on a fit result.
    fn good_track(&self, fit: &TrackFit) -> bool;
}

impl<E: FitEngine + ?Sized> FitEngine for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn begin_fit(&self, seed: &mut CandidateSeed) {
        (**self).begin_fit(seed);
    }

    fn drift_fit(&self, seed: &mut CandidateSeed, calibration: &Calibration) {
        (**self).drift_fit(seed, calibration);
    }

    fn good_track(&self, fit: &TrackFit) -> bool {
        (**self).good_track(fit)
    }
}
