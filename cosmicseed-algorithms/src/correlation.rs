//! Matching retained combo hits against the raw-hit collection.
//!
//! Both collections are produced independently, so hits are matched by
//! identity (channel and exact time) rather than by index. The linear scan
//! is cheap for the few dozen hits of a cosmic seed; the hashed index gives
//! the same answers for events with many raw hits.

use cosmicseed_core::config::CorrelationStrategy;
use cosmicseed_core::hit::{ChannelId, ComboHit, RawHit};
use log::warn;
use std::collections::HashMap;

/// Outcome of correlating one seed's hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Raw-hit indices, in the order of the hits that produced them.
    pub indices: Vec<usize>,
    /// Hits for which no raw hit matched.
    pub unmatched: usize,
}

/// Finds raw hits by (channel, time).
pub struct RawHitMatcher<'a> {
    raw: &'a [RawHit],
    index: Option<HashMap<(ChannelId, u64), usize>>,
}

impl<'a> RawHitMatcher<'a> {
    /// Create a matcher over one event's raw hits.
    ///
    /// The hashed strategy builds its index here, once per event.
    pub fn new(raw: &'a [RawHit], strategy: CorrelationStrategy) -> Self {
        let index = match strategy {
            CorrelationStrategy::Linear => None,
            CorrelationStrategy::Hashed => {
                let mut index = HashMap::with_capacity(raw.len());
                for (i, hit) in raw.iter().enumerate() {
                    if let Some(key) = time_key(hit.time) {
                        // First occurrence wins, as in the linear scan
                        index.entry((hit.channel, key)).or_insert(i);
                    }
                }
                Some(index)
            }
        };
        Self { raw, index }
    }

    /// Index of the first raw hit on `channel` with exactly `time`.
    #[allow(clippy::float_cmp)]
    pub fn find(&self, channel: ChannelId, time: f64) -> Option<usize> {
        match &self.index {
            Some(index) => time_key(time).and_then(|key| index.get(&(channel, key)).copied()),
            None => self
                .raw
                .iter()
                .position(|hit| hit.channel == channel && hit.time == time),
        }
    }

    /// Matches the raw readings behind every hit.
    ///
    /// A hit listing `raw_indices` is matched through each listed raw hit's
    /// channel and time, so a combined hit yields one index per reading. A
    /// hit without them is matched by its own channel and time. Readings
    /// with no match are reported and skipped.
    pub fn correlate(&self, hits: &[ComboHit]) -> Correlation {
        let mut correlation = Correlation {
            indices: Vec::with_capacity(hits.len()),
            unmatched: 0,
        };
        for hit in hits {
            if hit.raw_indices.is_empty() {
                self.match_into(hit.channel, hit.time, &mut correlation);
                continue;
            }
            for &index in &hit.raw_indices {
                if let Some(raw) = self.raw.get(index) {
                    self.match_into(raw.channel, raw.time, &mut correlation);
                } else {
                    warn!(
                        "raw index {index} out of range ({} raw hits)",
                        self.raw.len()
                    );
                    correlation.unmatched += 1;
                }
            }
        }
        correlation
    }

    fn match_into(&self, channel: ChannelId, time: f64, correlation: &mut Correlation) {
        if let Some(index) = self.find(channel, time) {
            correlation.indices.push(index);
        } else {
            warn!(
                "no raw hit matches channel {} at t={}",
                channel.as_u32(),
                time
            );
            correlation.unmatched += 1;
        }
    }
}

/// Hash key agreeing with `==` on times: `-0.0` folds onto `0.0`, NaN has no key.
fn time_key(time: f64) -> Option<u64> {
    if time.is_nan() {
        None
    } else {
        Some((time + 0.0).to_bits())
    }
}
