//! Candidate seeds and the line seeds derived from them.

use crate::hit::{ComboHit, Vec3};
use crate::status::SeedStatus;
use serde::{Deserialize, Serialize};

/// Straight line parameterised along the chamber axis:
/// `x(z) = a0 + a1 * z`, `y(z) = b0 + b1 * z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    /// `x` at `z = 0`.
    pub a0: f64,
    /// `dx/dz`.
    pub a1: f64,
    /// `y` at `z = 0`.
    pub b0: f64,
    /// `dy/dz`.
    pub b1: f64,
}

impl LineParams {
    /// Creates a new set of line parameters.
    #[must_use]
    pub const fn new(a0: f64, a1: f64, b0: f64, b1: f64) -> Self {
        Self { a0, a1, b0, b1 }
    }

    /// Point where the line crosses `z = 0`.
    #[must_use]
    pub fn intercept(&self) -> Vec3 {
        Vec3::new(self.a0, self.b0, 0.0)
    }

    /// Unnormalised direction `(a1, b1, 1)`.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.a1, self.b1, 1.0)
    }

    /// Point on the line at the given `z`.
    #[must_use]
    pub fn at(&self, z: f64) -> Vec3 {
        Vec3::new(self.a0 + self.a1 * z, self.b0 + self.b1 * z, z)
    }

    /// Returns true if all parameters are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.a0.is_finite() && self.a1.is_finite() && self.b0.is_finite() && self.b1.is_finite()
    }
}

/// Result of the two fit stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFit {
    /// Parameters of the initial straight-line fit.
    pub initial: LineParams,
    /// Initial fit converged.
    pub converged: bool,
    /// Chi-square per degree of freedom of the latest fit.
    pub chi2_dof: f64,
    /// Parameters of the drift fit.
    pub drift: LineParams,
    /// Drift fit converged.
    pub drift_converged: bool,
    /// Iterations used by the drift fit.
    pub iterations: u32,
    /// Hits marked as outliers by the drift fit.
    pub n_outliers: u32,
}

impl TrackFit {
    /// Best available parameters: drift results once converged, initial otherwise.
    #[must_use]
    pub fn best_params(&self) -> LineParams {
        if self.drift_converged {
            self.drift
        } else {
            self.initial
        }
    }
}

/// Seed record for one raw hit used by a seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedHit {
    /// Index into the raw-hit collection.
    pub index: usize,
    /// Reference time assigned to the hit (ns).
    pub t0: f64,
}

/// Per-cluster work object carried through assembly and refinement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSeed {
    /// Reference time, copied from the time cluster (ns).
    pub t0: f64,
    /// Index of the originating time cluster.
    pub time_cluster: usize,
    /// Combo-hit collection indices of `hits`, same order.
    pub hit_indices: Vec<usize>,
    /// Hits used in the fit, ordered by descending `y`.
    pub hits: Vec<ComboHit>,
    /// Raw-hit records for the seed's hits.
    pub seed_hits: Vec<SeedHit>,
    /// Acceptance flags set so far.
    pub status: SeedStatus,
    /// Fit results from the engine.
    pub fit: TrackFit,
}

impl CandidateSeed {
    /// Creates an empty seed for a time cluster.
    #[must_use]
    pub fn new(time_cluster: usize, t0: f64) -> Self {
        Self {
            t0,
            time_cluster,
            ..Default::default()
        }
    }

    /// Number of hits currently held.
    #[must_use]
    pub fn nhits(&self) -> usize {
        self.hits.len()
    }

    /// Number of hits not flagged as outliers.
    #[must_use]
    pub fn n_active_hits(&self) -> usize {
        self.hits.iter().filter(|hit| !hit.outlier).count()
    }
}

/// Simplified line record emitted for each accepted seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeed {
    /// Reference time of the originating cluster (ns).
    pub t0: f64,
    /// Index of the originating time cluster.
    pub time_cluster: usize,
    /// Point where the line crosses `z = 0`.
    pub intercept: Vec3,
    /// Unit direction with `y <= 0`.
    pub direction: Vec3,
    /// Drift fit converged.
    pub converged: bool,
    /// Indices into the raw-hit collection.
    pub raw_hit_indices: Vec<usize>,
}

impl LineSeed {
    /// Builds a line seed from a seed's best fit parameters.
    ///
    /// The direction is normalised and flipped to point downward, so the sign
    /// returned by the fit does not leak into the output.
    #[must_use]
    pub fn from_seed(seed: &CandidateSeed, raw_hit_indices: Vec<usize>) -> Self {
        let params = seed.fit.best_params();
        Self {
            t0: seed.t0,
            time_cluster: seed.time_cluster,
            intercept: params.intercept(),
            direction: canonical_direction(params.direction()),
            converged: seed.fit.drift_converged,
            raw_hit_indices,
        }
    }
}

/// Unit vector with `y <= 0`.
#[must_use]
pub fn canonical_direction(direction: Vec3) -> Vec3 {
    let unit = direction.unit();
    if unit.y > 0.0 {
        -unit
    } else {
        unit
    }
}
