//! Rejection reasons and seeding counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Why a time cluster produced no seed.
///
/// Rejections are normal outcomes, not errors: the event continues with the
/// next cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// Good-hit count below the minimum.
    TooFewGoodHits { found: usize, required: usize },
    /// Combo-hit count below the minimum.
    TooFewComboHits { found: usize, required: usize },
    /// Summed multiplicity below the minimum.
    TooFewRawHits { found: usize, required: usize },
    /// Initial fit did not accept or did not converge.
    FitNotConverged,
    /// Accepted status does not meet the save requirement.
    SaveFlagsUnsatisfied,
    /// Fit engine's quality check failed.
    BadTrack,
    /// Drift fit did not converge.
    DriftNotConverged,
    /// Every hit was flagged as an outlier.
    NoActiveHits,
    /// The drift fit added or removed hits instead of flagging them.
    HitListChanged { before: usize, after: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewGoodHits { found, required } => {
                write!(f, "good hits {found} < {required}")
            }
            Rejection::TooFewComboHits { found, required } => {
                write!(f, "combo hits {found} < {required}")
            }
            Rejection::TooFewRawHits { found, required } => {
                write!(f, "raw hits {found} < {required}")
            }
            Rejection::FitNotConverged => f.write_str("initial fit not converged"),
            Rejection::SaveFlagsUnsatisfied => f.write_str("save flags not satisfied"),
            Rejection::BadTrack => f.write_str("track quality check failed"),
            Rejection::DriftNotConverged => f.write_str("drift fit not converged"),
            Rejection::NoActiveHits => f.write_str("no hits left after outlier removal"),
            Rejection::HitListChanged { before, after } => {
                write!(f, "drift fit changed hit count {before} -> {after}")
            }
        }
    }
}

/// Counters accumulated while seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedingStatistics {
    /// Time clusters seen.
    pub clusters_processed: usize,
    /// Clusters with too few in-window hits.
    pub rejected_good_hits: usize,
    /// Clusters with too few combo hits.
    pub rejected_combo_hits: usize,
    /// Clusters with too little summed multiplicity.
    pub rejected_raw_hits: usize,
    /// Initial fits missing an acceptance flag.
    pub rejected_fit: usize,
    /// Seeds failing the save requirement.
    pub rejected_save_flags: usize,
    /// Seeds failing the track-quality cut.
    pub rejected_bad_track: usize,
    /// Seeds whose drift fit failed.
    pub rejected_drift: usize,
    /// Seeds left without active hits.
    pub rejected_no_active_hits: usize,
    /// Accepted candidate seeds.
    pub seeds: usize,
    /// Emitted line seeds.
    pub line_seeds: usize,
    /// Hits dropped as drift-fit outliers from emitted seeds.
    pub outliers_removed: usize,
    /// Retained hits without a raw-hit match.
    pub unmatched_hits: usize,
    /// Line seeds whose raw-hit index list came out empty.
    pub uncorrelated_line_seeds: usize,
}

impl SeedingStatistics {
    /// Counts one rejection.
    pub fn record(&mut self, rejection: Rejection) {
        let slot = match rejection {
            Rejection::TooFewGoodHits { .. } => &mut self.rejected_good_hits,
            Rejection::TooFewComboHits { .. } => &mut self.rejected_combo_hits,
            Rejection::TooFewRawHits { .. } => &mut self.rejected_raw_hits,
            Rejection::FitNotConverged => &mut self.rejected_fit,
            Rejection::SaveFlagsUnsatisfied => &mut self.rejected_save_flags,
            Rejection::BadTrack => &mut self.rejected_bad_track,
            Rejection::DriftNotConverged | Rejection::HitListChanged { .. } => {
                &mut self.rejected_drift
            }
            Rejection::NoActiveHits => &mut self.rejected_no_active_hits,
        };
        *slot += 1;
    }

    /// Total rejected clusters.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected_good_hits
            + self.rejected_combo_hits
            + self.rejected_raw_hits
            + self.rejected_fit
            + self.rejected_save_flags
            + self.rejected_bad_track
            + self.rejected_drift
            + self.rejected_no_active_hits
    }

    /// Adds another set of counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.clusters_processed += other.clusters_processed;
        self.rejected_good_hits += other.rejected_good_hits;
        self.rejected_combo_hits += other.rejected_combo_hits;
        self.rejected_raw_hits += other.rejected_raw_hits;
        self.rejected_fit += other.rejected_fit;
        self.rejected_save_flags += other.rejected_save_flags;
        self.rejected_bad_track += other.rejected_bad_track;
        self.rejected_drift += other.rejected_drift;
        self.rejected_no_active_hits += other.rejected_no_active_hits;
        self.seeds += other.seeds;
        self.line_seeds += other.line_seeds;
        self.outliers_removed += other.outliers_removed;
        self.unmatched_hits += other.unmatched_hits;
        self.uncorrelated_line_seeds += other.uncorrelated_line_seeds;
    }
}

impl AddAssign<&SeedingStatistics> for SeedingStatistics {
    fn add_assign(&mut self, rhs: &SeedingStatistics) {
        self.merge(rhs);
    }
}
