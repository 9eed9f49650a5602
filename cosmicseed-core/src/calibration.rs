//! Per-channel response constants and the conditions lookup.

use crate::error::{Error, Result};
use crate::event::EventId;
use crate::hit::ChannelId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Timing response of a single readout channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelResponse {
    /// Drift velocity (mm/ns).
    pub drift_velocity: f64,
    /// Intrinsic position resolution (mm).
    pub resolution: f64,
    /// Electronics time offset subtracted before converting to drift (ns).
    pub time_offset: f64,
    /// Largest physical drift radius (mm).
    pub max_drift_radius: f64,
}

impl Default for ChannelResponse {
    fn default() -> Self {
        Self {
            drift_velocity: 0.065,
            resolution: 0.2,
            time_offset: 0.0,
            max_drift_radius: 2.5,
        }
    }
}

impl ChannelResponse {
    /// Checks the constants.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::ConfigError(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        for (name, value) in [
            ("drift_velocity", self.drift_velocity),
            ("max_drift_radius", self.max_drift_radius),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::ConfigError(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if !self.time_offset.is_finite() {
            return Err(Error::ConfigError(format!(
                "time_offset must be finite, got {}",
                self.time_offset
            )));
        }
        Ok(())
    }

    /// Converts a hit time into a drift radius, clamped to the physical range.
    #[must_use]
    pub fn drift_radius(&self, time: f64, t0: f64) -> f64 {
        (self.drift_velocity * (time - t0 - self.time_offset)).clamp(0.0, self.max_drift_radius)
    }
}

/// Response constants for every channel, valid for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Response used for channels without an override.
    pub default: ChannelResponse,
    /// Per-channel overrides.
    pub channels: HashMap<ChannelId, ChannelResponse>,
}

impl Calibration {
    /// Creates a calibration with one response for every channel.
    #[must_use]
    pub fn uniform(response: ChannelResponse) -> Self {
        Self {
            default: response,
            channels: HashMap::new(),
        }
    }

    /// Adds a per-channel override.
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelId, response: ChannelResponse) -> Self {
        self.channels.insert(channel, response);
        self
    }

    /// Checks the default response and every override.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] naming the offending channel.
    pub fn validate(&self) -> Result<()> {
        self.default.validate()?;
        let mut channels: Vec<_> = self.channels.iter().collect();
        channels.sort_unstable_by_key(|(channel, _)| **channel);
        for (channel, response) in channels {
            response
                .validate()
                .map_err(|e| in_context(e, &format!("channel {}", channel.as_u32())))?;
        }
        Ok(())
    }

    /// Response for a channel, falling back to the default.
    #[must_use]
    pub fn response(&self, channel: ChannelId) -> &ChannelResponse {
        self.channels.get(&channel).unwrap_or(&self.default)
    }
}

/// Supplies the calibration valid for a given event.
pub trait ConditionsSource: Send + Sync {
    /// Returns the calibration for the event.
    ///
    /// # Errors
    /// Returns [`Error::MissingConditions`] if no calibration covers the event.
    fn calibration(&self, event: &EventId) -> Result<&Calibration>;
}

/// One calibration for every event.
#[derive(Debug, Clone, Default)]
pub struct FixedConditions {
    calibration: Calibration,
}

impl FixedConditions {
    /// Serves `calibration` for every event.
    #[must_use]
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }
}

impl ConditionsSource for FixedConditions {
    fn calibration(&self, _event: &EventId) -> Result<&Calibration> {
        Ok(&self.calibration)
    }
}

/// Calibrations keyed by run number, with an optional fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConditions {
    /// Calibration per run number.
    pub runs: BTreeMap<u32, Calibration>,
    /// Used for runs missing from `runs`.
    pub fallback: Option<Calibration>,
}

impl RunConditions {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the calibration for a run.
    #[must_use]
    pub fn with_run(mut self, run: u32, calibration: Calibration) -> Self {
        self.runs.insert(run, calibration);
        self
    }

    /// Sets the calibration used for runs without an entry.
    #[must_use]
    pub fn with_fallback(mut self, calibration: Calibration) -> Self {
        self.fallback = Some(calibration);
        self
    }

    /// Checks every calibration in the table.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] naming the offending run.
    pub fn validate(&self) -> Result<()> {
        for (run, calibration) in &self.runs {
            calibration
                .validate()
                .map_err(|e| in_context(e, &format!("run {run}")))?;
        }
        if let Some(fallback) = &self.fallback {
            fallback
                .validate()
                .map_err(|e| in_context(e, "fallback"))?;
        }
        Ok(())
    }

    /// Loads a conditions table from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds
    /// invalid constants.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let conditions: Self = serde_json::from_reader(reader)?;
        conditions.validate()?;
        Ok(conditions)
    }

    /// Loads a conditions table from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or holds invalid
    /// constants.
    pub fn from_json(json: &str) -> Result<Self> {
        let conditions: Self = serde_json::from_str(json)?;
        conditions.validate()?;
        Ok(conditions)
    }
}

impl ConditionsSource for RunConditions {
    fn calibration(&self, event: &EventId) -> Result<&Calibration> {
        self.runs
            .get(&event.run)
            .or(self.fallback.as_ref())
            .ok_or(Error::MissingConditions { run: event.run })
    }
}

fn in_context(err: Error, context: &str) -> Error {
    match err {
        Error::ConfigError(msg) => Error::ConfigError(format!("{context}: {msg}")),
        other => other,
    }
}
