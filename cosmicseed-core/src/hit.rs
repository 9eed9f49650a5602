//! Hit traits and types for drift-chamber data.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Point or direction in the detector frame (`y` is vertical, `z` along the
/// chamber axis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// Horizontal, across the chamber axis.
    pub x: f64,
    /// Vertical.
    pub y: f64,
    /// Along the chamber axis.
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn mag(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the vector scaled to unit length.
    ///
    /// A zero vector is returned unchanged.
    #[must_use]
    pub fn unit(&self) -> Self {
        let mag = self.mag();
        if mag > 0.0 {
            *self * (1.0 / mag)
        } else {
            *self
        }
    }

    /// Returns true if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Readout channel (one straw/wire) identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Creates a new channel identifier.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Trait for spatial-temporal hit measurements.
///
/// Provides a common view over combined hits and the elementary raw hits
/// they are built from.
pub trait Hit: Send + Sync {
    /// Returns the measured position.
    fn pos(&self) -> Vec3;

    /// Returns the measured time (ns).
    fn time(&self) -> f64;

    /// Returns the readout channel.
    fn channel(&self) -> ChannelId;

    /// Returns the number of elementary readings aggregated by this hit.
    #[inline]
    fn multiplicity(&self) -> u32 {
        1
    }

    /// Returns the vertical coordinate.
    #[inline]
    fn y(&self) -> f64 {
        self.pos().y
    }
}

/// A combined hit aggregating one or more raw readings on a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboHit {
    /// Reconstructed position.
    pub pos: Vec3,
    /// Hit time (ns).
    pub time: f64,
    /// Readout channel.
    pub channel: ChannelId,
    /// Number of raw hits combined into this one.
    #[serde(default = "default_multiplicity")]
    pub n_raw_hits: u16,
    /// Indices of the aggregated hits in the raw-hit collection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_indices: Vec<usize>,
    /// Set by the drift fit on hits it rejects.
    #[serde(default)]
    pub outlier: bool,
}

fn default_multiplicity() -> u16 {
    1
}

impl ComboHit {
    /// Creates a combo hit with multiplicity 1 and no raw-hit back references.
    #[must_use]
    pub fn new(pos: Vec3, time: f64, channel: ChannelId) -> Self {
        Self {
            pos,
            time,
            channel,
            n_raw_hits: 1,
            raw_indices: Vec::new(),
            outlier: false,
        }
    }

    /// Sets the multiplicity.
    #[must_use]
    pub fn with_multiplicity(mut self, n_raw_hits: u16) -> Self {
        self.n_raw_hits = n_raw_hits;
        self
    }

    /// Sets the raw-hit back references.
    #[must_use]
    pub fn with_raw_indices(mut self, raw_indices: Vec<usize>) -> Self {
        self.raw_indices = raw_indices;
        self
    }
}

impl Hit for ComboHit {
    #[inline]
    fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    fn channel(&self) -> ChannelId {
        self.channel
    }

    #[inline]
    fn multiplicity(&self) -> u32 {
        u32::from(self.n_raw_hits)
    }
}

/// An elementary, uncombined reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Reconstructed position.
    pub pos: Vec3,
    /// Hit time (ns).
    pub time: f64,
    /// Readout channel.
    pub channel: ChannelId,
}

impl RawHit {
    /// Creates a new raw hit.
    #[inline]
    #[must_use]
    pub fn new(pos: Vec3, time: f64, channel: ChannelId) -> Self {
        Self { pos, time, channel }
    }
}

impl Hit for RawHit {
    #[inline]
    fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    fn channel(&self) -> ChannelId {
        self.channel
    }
}
