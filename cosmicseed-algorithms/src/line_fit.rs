//! Least-squares straight-line fit engine.
//!
//! Fits `x(z) = a0 + a1*z` and `y(z) = b0 + b1*z` independently by weighted
//! linear regression on the hit positions.
//!
//! The drift stage weights each hit by `1 / (sigma^2 + r^2)`, where `sigma`
//! is the channel resolution and `r` the drift radius: the wire position can
//! sit up to `r` away from the track. A hit's pull is `|d - r| / sigma` with
//! `d` its transverse distance from the fitted line. The worst hit above the
//! pull cut is dropped and the fit repeated until every pull passes.

use cosmicseed_core::calibration::Calibration;
use cosmicseed_core::fit::FitEngine;
use cosmicseed_core::hit::{ComboHit, Vec3};
use cosmicseed_core::seed::{CandidateSeed, LineParams, TrackFit};
use cosmicseed_core::status::FitFlag;
use log::debug;
use serde::{Deserialize, Serialize};

/// Line-fit tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFitConfig {
    /// Minimum hits for either fit stage.
    pub min_hits: usize,
    /// Position resolution assumed by the initial fit (mm).
    pub hit_resolution: f64,
    /// Pull above which the drift fit rejects a hit.
    pub outlier_pull: f64,
    /// Maximum drift-fit iterations.
    pub max_iterations: u32,
    /// Largest chi2/ndof accepted by the quality check.
    pub max_chi2_dof: f64,
    /// Smallest weighted variance of `z` for a non-degenerate fit (mm^2).
    pub min_z_variance: f64,
}

impl Default for LineFitConfig {
    fn default() -> Self {
        Self {
            min_hits: 3,
            hit_resolution: 5.0,
            outlier_pull: 5.0,
            max_iterations: 10,
            max_chi2_dof: 25.0,
            min_z_variance: 1.0,
        }
    }
}

impl LineFitConfig {
    /// Sets the minimum hit count.
    #[must_use]
    pub fn with_min_hits(mut self, n: usize) -> Self {
        self.min_hits = n;
        self
    }

    /// Sets the initial-fit hit resolution.
    #[must_use]
    pub fn with_hit_resolution(mut self, resolution: f64) -> Self {
        self.hit_resolution = resolution;
        self
    }

    /// Sets the outlier pull cut.
    #[must_use]
    pub fn with_outlier_pull(mut self, pull: f64) -> Self {
        self.outlier_pull = pull;
        self
    }

    /// Sets the maximum number of drift iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the chi2/ndof quality cut.
    #[must_use]
    pub fn with_max_chi2_dof(mut self, chi2: f64) -> Self {
        self.max_chi2_dof = chi2;
        self
    }

    /// Checks the tunables.
    ///
    /// # Errors
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_hits < 2 {
            return Err(format!("min_hits must be at least 2, got {}", self.min_hits));
        }
        for (name, value) in [
            ("hit_resolution", self.hit_resolution),
            ("outlier_pull", self.outlier_pull),
            ("max_chi2_dof", self.max_chi2_dof),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if !(self.min_z_variance.is_finite() && self.min_z_variance >= 0.0) {
            return Err(format!(
                "min_z_variance must be non-negative, got {}",
                self.min_z_variance
            ));
        }
        Ok(())
    }
}

/// Weighted sums for the two regressions.
#[derive(Default)]
struct Sums {
    w: f64,
    wz: f64,
    wzz: f64,
    wx: f64,
    wzx: f64,
    wy: f64,
    wzy: f64,
}

impl Sums {
    fn add(&mut self, pos: Vec3, weight: f64) {
        self.w += weight;
        self.wz += weight * pos.z;
        self.wzz += weight * pos.z * pos.z;
        self.wx += weight * pos.x;
        self.wzx += weight * pos.z * pos.x;
        self.wy += weight * pos.y;
        self.wzy += weight * pos.z * pos.y;
    }

    fn solve(&self, min_z_variance: f64) -> Option<LineParams> {
        if self.w <= 0.0 {
            return None;
        }
        let det = self.w * self.wzz - self.wz * self.wz;
        // det / w^2 is the weighted variance of z
        if !det.is_finite() || det <= min_z_variance * self.w * self.w || det <= 0.0 {
            return None;
        }
        let a1 = (self.w * self.wzx - self.wz * self.wx) / det;
        let b1 = (self.w * self.wzy - self.wz * self.wy) / det;
        let params = LineParams::new(
            (self.wx - a1 * self.wz) / self.w,
            a1,
            (self.wy - b1 * self.wz) / self.w,
            b1,
        );
        params.is_finite().then_some(params)
    }
}

/// Transverse distance from a hit to the line, measured at the hit's `z`.
fn transverse_distance(params: &LineParams, pos: Vec3) -> f64 {
    let on_line = params.at(pos.z);
    (pos.x - on_line.x).hypot(pos.y - on_line.y)
}

#[allow(clippy::cast_precision_loss)]
fn chi2_dof(chi2: f64, n_hits: usize) -> f64 {
    // Two measured coordinates per hit, four line parameters
    let ndof = (2 * n_hits).saturating_sub(4).max(1);
    chi2 / ndof as f64
}

/// Reference [`FitEngine`] for straight cosmic tracks.
#[derive(Clone, Debug, Default)]
pub struct LineFitEngine {
    config: LineFitConfig,
}

impl LineFitEngine {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: LineFitConfig) -> Self {
        Self { config }
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &LineFitConfig {
        &self.config
    }

    fn fit_weighted<'h>(
        &self,
        hits: impl Iterator<Item = (&'h ComboHit, f64)>,
    ) -> Option<LineParams> {
        let mut sums = Sums::default();
        for (hit, weight) in hits {
            sums.add(hit.pos, weight);
        }
        sums.solve(self.config.min_z_variance)
    }
}

impl FitEngine for LineFitEngine {
    fn name(&self) -> &'static str {
        "LineFit"
    }

    fn begin_fit(&self, seed: &mut CandidateSeed) {
        seed.fit.converged = false;
        if seed.hits.len() < self.config.min_hits {
            return;
        }

        let weight = 1.0 / (self.config.hit_resolution * self.config.hit_resolution);
        let Some(params) = self.fit_weighted(seed.hits.iter().map(|hit| (hit, weight))) else {
            debug!(
                "cluster {}: degenerate initial fit over {} hits",
                seed.time_cluster,
                seed.hits.len()
            );
            return;
        };

        let chi2: f64 = seed
            .hits
            .iter()
            .map(|hit| transverse_distance(&params, hit.pos).powi(2) * weight)
            .sum();

        seed.fit.initial = params;
        seed.fit.converged = true;
        seed.fit.chi2_dof = chi2_dof(chi2, seed.hits.len());
        seed.status.merge(FitFlag::HelixConverged);
        seed.status.merge(FitFlag::HelixOk);
    }

    fn drift_fit(&self, seed: &mut CandidateSeed, calibration: &Calibration) {
        let config = &self.config;
        let t0 = seed.t0;

        for hit in &mut seed.hits {
            hit.outlier = false;
        }
        seed.fit.drift_converged = false;
        seed.fit.iterations = 0;
        seed.fit.n_outliers = 0;

        // (drift radius, resolution) per hit, fixed for all iterations
        let response: Vec<(f64, f64)> = seed
            .hits
            .iter()
            .map(|hit| {
                let channel = calibration.response(hit.channel);
                (channel.drift_radius(hit.time, t0), channel.resolution)
            })
            .collect();

        let mut n_active = seed.hits.len();
        while n_active >= config.min_hits {
            seed.fit.iterations += 1;

            let active = seed
                .hits
                .iter()
                .zip(&response)
                .filter(|(hit, _)| !hit.outlier)
                .map(|(hit, &(radius, sigma))| (hit, 1.0 / (sigma * sigma + radius * radius)));
            let Some(params) = self.fit_weighted(active) else {
                break;
            };
            seed.fit.drift = params;

            let mut chi2 = 0.0;
            let mut worst: Option<(usize, f64)> = None;
            for (i, (hit, &(radius, sigma))) in seed.hits.iter().zip(&response).enumerate() {
                if hit.outlier {
                    continue;
                }
                let pull = (transverse_distance(&params, hit.pos) - radius).abs() / sigma;
                chi2 += pull * pull;
                if pull > config.outlier_pull && worst.map_or(true, |(_, p)| pull > p) {
                    worst = Some((i, pull));
                }
            }
            seed.fit.chi2_dof = chi2_dof(chi2, n_active);

            // The last allowed iteration keeps its fit even with pulls above the cut
            match worst.filter(|_| seed.fit.iterations < config.max_iterations) {
                None => {
                    seed.fit.drift_converged = true;
                    break;
                }
                Some((i, pull)) => {
                    debug!(
                        "cluster {}: drift iteration {} drops hit {} (pull {:.1})",
                        seed.time_cluster, seed.fit.iterations, i, pull
                    );
                    seed.hits[i].outlier = true;
                    seed.fit.n_outliers += 1;
                    n_active -= 1;
                }
            }
        }
    }

    fn good_track(&self, fit: &TrackFit) -> bool {
        fit.converged && fit.initial.is_finite() && fit.chi2_dof <= self.config.max_chi2_dof
    }
}
