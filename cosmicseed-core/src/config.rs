//! Seed finder configuration.

use crate::error::{Error, Result};
use crate::status::SaveFlags;
use serde::{Deserialize, Serialize};

/// Inclusive time window used to count good hits in a time cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest admissible hit time (ns).
    pub min: f64,
    /// Latest admissible hit time (ns).
    pub max: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            min: 500.0,
            max: 2000.0,
        }
    }
}

impl TimeWindow {
    /// Creates a new window.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if the time lies inside the window, bounds included.
    #[inline]
    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.min && time <= self.max
    }
}

/// How retained hits are matched against the raw-hit collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrategy {
    /// Scan the raw collection once per retained hit.
    #[default]
    Linear,
    /// Build a (channel, time) index once per event.
    Hashed,
}

/// Thresholds and policies applied by the seed finder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Minimum number of combo hits for a viable fit.
    pub min_combo_hits: usize,
    /// Minimum summed multiplicity of the combo hits.
    pub min_raw_hits: usize,
    /// Minimum good-hit count of a time cluster.
    pub min_good_hits: usize,
    /// Window used by the good-hit count.
    pub time_window: TimeWindow,
    /// Status a seed needs to be saved.
    pub save_flags: SaveFlags,
    /// Run the drift refinement stage.
    pub drift: bool,
    /// Raw-hit matching strategy.
    pub correlation: CorrelationStrategy,
    /// Suppress line seeds none of whose hits could be matched.
    pub drop_uncorrelated_line_seeds: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            min_combo_hits: 8,
            min_raw_hits: 2,
            min_good_hits: 1,
            time_window: TimeWindow::default(),
            save_flags: SaveFlags::default(),
            drift: true,
            correlation: CorrelationStrategy::Linear,
            drop_uncorrelated_line_seeds: false,
        }
    }
}

impl SeedConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum combo-hit count.
    #[must_use]
    pub fn with_min_combo_hits(mut self, n: usize) -> Self {
        self.min_combo_hits = n;
        self
    }

    /// Sets the minimum raw-hit count.
    #[must_use]
    pub fn with_min_raw_hits(mut self, n: usize) -> Self {
        self.min_raw_hits = n;
        self
    }

    /// Sets the minimum good-hit count per time cluster.
    #[must_use]
    pub fn with_min_good_hits(mut self, n: usize) -> Self {
        self.min_good_hits = n;
        self
    }

    /// Sets the good-hit time window.
    #[must_use]
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    /// Sets the save requirement.
    #[must_use]
    pub fn with_save_flags(mut self, save_flags: SaveFlags) -> Self {
        self.save_flags = save_flags;
        self
    }

    /// Enables or disables drift refinement.
    #[must_use]
    pub fn with_drift(mut self, drift: bool) -> Self {
        self.drift = drift;
        self
    }

    /// Sets the raw-hit matching strategy.
    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationStrategy) -> Self {
        self.correlation = correlation;
        self
    }

    /// Suppresses line seeds with an empty raw-hit index list.
    #[must_use]
    pub fn with_drop_uncorrelated_line_seeds(mut self, drop: bool) -> Self {
        self.drop_uncorrelated_line_seeds = drop;
        self
    }

    /// Checks the configuration for inconsistent values.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let window = self.time_window;
        if !window.min.is_finite() || !window.max.is_finite() {
            return Err(Error::ConfigError(format!(
                "time window bounds must be finite, got [{}, {}]",
                window.min, window.max
            )));
        }
        if window.min > window.max {
            return Err(Error::ConfigError(format!(
                "time window is empty: min {} > max {}",
                window.min, window.max
            )));
        }
        if self.save_flags.flags.is_empty() {
            return Err(Error::ConfigError(
                "save_flags must name at least one flag".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::FitFlag;

    #[test]
    fn test_time_window_bounds_inclusive() {
        let window = TimeWindow::default();
        assert!(window.contains(500.0));
        assert!(window.contains(2000.0));
        assert!(window.contains(1200.0));
        assert!(!window.contains(499.9));
        assert!(!window.contains(2000.1));
        assert!(!window.contains(f64::NAN));
    }

    #[test]
    fn test_seed_config_builder() {
        let config = SeedConfig::new()
            .with_min_combo_hits(5)
            .with_min_raw_hits(3)
            .with_min_good_hits(4)
            .with_time_window(TimeWindow::new(0.0, 100.0))
            .with_drift(false)
            .with_correlation(CorrelationStrategy::Hashed);

        assert_eq!(config.min_combo_hits, 5);
        assert_eq!(config.min_raw_hits, 3);
        assert_eq!(config.min_good_hits, 4);
        assert!(!config.drift);
        assert_eq!(config.correlation, CorrelationStrategy::Hashed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let config = SeedConfig::new().with_time_window(TimeWindow::new(10.0, 5.0));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("time window is empty"));
    }

    #[test]
    fn test_validate_rejects_empty_save_flags() {
        let config = SeedConfig::new().with_save_flags(SaveFlags::all(&[]));
        assert!(config.validate().is_err());

        let config = SeedConfig::new().with_save_flags(SaveFlags::all(&[FitFlag::HelixOk]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: SeedConfig =
            serde_json::from_str(r#"{"min_combo_hits": 6, "correlation": "hashed"}"#).unwrap();
        assert_eq!(config.min_combo_hits, 6);
        assert_eq!(config.min_raw_hits, 2);
        assert!(config.drift);
        assert_eq!(config.correlation, CorrelationStrategy::Hashed);
    }
}
