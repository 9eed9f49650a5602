//! Seed acceptance flags.
//!
//! A seed's status is a fixed set of independent booleans. Flags are merged
//! as the seed passes each stage and cleared only when the seed is rejected,
//! after which the seed is discarded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One acceptance criterion a seed can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitFlag {
    /// Seed is fitted as a straight line.
    Straight,
    /// Hit-count thresholds passed.
    #[serde(rename = "HitsOK")]
    HitsOk,
    /// Seed accepted by the fit.
    #[serde(rename = "HelixOK")]
    HelixOk,
    /// Fit converged.
    HelixConverged,
}

impl FitFlag {
    /// All flags in declaration order.
    pub const ALL: [FitFlag; 4] = [
        FitFlag::Straight,
        FitFlag::HitsOk,
        FitFlag::HelixOk,
        FitFlag::HelixConverged,
    ];

    /// Flag name as written in configuration files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FitFlag::Straight => "Straight",
            FitFlag::HitsOk => "HitsOK",
            FitFlag::HelixOk => "HelixOK",
            FitFlag::HelixConverged => "HelixConverged",
        }
    }
}

impl fmt::Display for FitFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulated acceptance state of a candidate seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SeedStatus {
    /// `Straight` flag.
    pub straight: bool,
    /// `HitsOK` flag.
    pub hits_ok: bool,
    /// `HelixOK` flag.
    pub helix_ok: bool,
    /// `HelixConverged` flag.
    pub helix_converged: bool,
}

impl SeedStatus {
    /// Status with no flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, flag: FitFlag) -> &mut bool {
        match flag {
            FitFlag::Straight => &mut self.straight,
            FitFlag::HitsOk => &mut self.hits_ok,
            FitFlag::HelixOk => &mut self.helix_ok,
            FitFlag::HelixConverged => &mut self.helix_converged,
        }
    }

    /// Sets a flag.
    pub fn merge(&mut self, flag: FitFlag) {
        *self.slot(flag) = true;
    }

    /// Clears a flag.
    pub fn clear(&mut self, flag: FitFlag) {
        *self.slot(flag) = false;
    }

    /// Returns true if the flag is set.
    #[must_use]
    pub fn has(&self, flag: FitFlag) -> bool {
        match flag {
            FitFlag::Straight => self.straight,
            FitFlag::HitsOk => self.hits_ok,
            FitFlag::HelixOk => self.helix_ok,
            FitFlag::HelixConverged => self.helix_converged,
        }
    }

    /// Returns true if at least one of the flags is set.
    #[must_use]
    pub fn has_any(&self, flags: &[FitFlag]) -> bool {
        flags.iter().any(|&flag| self.has(flag))
    }

    /// Returns true if every one of the flags is set.
    #[must_use]
    pub fn has_all(&self, flags: &[FitFlag]) -> bool {
        flags.iter().all(|&flag| self.has(flag))
    }

    /// The set flags, in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = FitFlag> + '_ {
        FitFlag::ALL.into_iter().filter(|&flag| self.has(flag))
    }

    /// Returns true once the fit has both accepted and converged.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.helix_ok && self.helix_converged
    }
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in self.flags() {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{flag}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// How a [`SaveFlags`] requirement combines its flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagMatch {
    /// At least one listed flag must be set.
    #[default]
    Any,
    /// Every listed flag must be set.
    All,
}

/// Which status a seed needs to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveFlags {
    /// Flags to test.
    pub flags: Vec<FitFlag>,
    /// Whether any or all of `flags` must be set.
    #[serde(rename = "match")]
    pub mode: FlagMatch,
}

impl Default for SaveFlags {
    fn default() -> Self {
        Self {
            flags: vec![FitFlag::HelixOk],
            mode: FlagMatch::Any,
        }
    }
}

impl SaveFlags {
    /// Requirement satisfied when any of the flags is set.
    #[must_use]
    pub fn any(flags: &[FitFlag]) -> Self {
        Self {
            flags: flags.to_vec(),
            mode: FlagMatch::Any,
        }
    }

    /// Requirement satisfied when all of the flags are set.
    #[must_use]
    pub fn all(flags: &[FitFlag]) -> Self {
        Self {
            flags: flags.to_vec(),
            mode: FlagMatch::All,
        }
    }

    /// Checks the requirement against a status.
    #[must_use]
    pub fn is_satisfied_by(&self, status: &SeedStatus) -> bool {
        match self.mode {
            FlagMatch::Any => status.has_any(&self.flags),
            FlagMatch::All => status.has_all(&self.flags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_clear() {
        let mut status = SeedStatus::new();
        assert!(!status.has_any(&FitFlag::ALL));

        status.merge(FitFlag::Straight);
        status.merge(FitFlag::HitsOk);
        assert!(status.has_all(&[FitFlag::Straight, FitFlag::HitsOk]));
        assert!(!status.is_accepted());

        status.merge(FitFlag::HelixOk);
        status.merge(FitFlag::HelixConverged);
        assert!(status.is_accepted());

        status.clear(FitFlag::HelixOk);
        assert!(!status.is_accepted());
        assert!(status.has(FitFlag::HelixConverged));
    }

    #[test]
    fn test_display() {
        let mut status = SeedStatus::new();
        assert_eq!(status.to_string(), "none");
        status.merge(FitFlag::HitsOk);
        status.merge(FitFlag::HelixOk);
        assert_eq!(status.to_string(), "HitsOK|HelixOK");
    }

    #[test]
    fn test_save_flags_any_vs_all() {
        let mut status = SeedStatus::new();
        status.merge(FitFlag::HelixOk);

        assert!(SaveFlags::default().is_satisfied_by(&status));
        assert!(SaveFlags::any(&[FitFlag::HelixOk, FitFlag::HelixConverged]).is_satisfied_by(&status));
        assert!(!SaveFlags::all(&[FitFlag::HelixOk, FitFlag::HelixConverged]).is_satisfied_by(&status));

        // An empty any-of requirement can never be met
        assert!(!SaveFlags::any(&[]).is_satisfied_by(&status));
    }

    #[test]
    fn test_save_flags_json() {
        let json = r#"{"flags": ["HelixOK", "HelixConverged"], "match": "all"}"#;
        let save: SaveFlags = serde_json::from_str(json).unwrap();
        assert_eq!(save.mode, FlagMatch::All);
        assert_eq!(save.flags, vec![FitFlag::HelixOk, FitFlag::HelixConverged]);

        let partial: SaveFlags = serde_json::from_str("{}").unwrap();
        assert_eq!(partial, SaveFlags::default());
    }
}
