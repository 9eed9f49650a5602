//! Time-cluster admission count.

use cosmicseed_core::config::TimeWindow;
use cosmicseed_core::event::TimeCluster;
use cosmicseed_core::hit::Hit;

/// Counts the elementary hits of a cluster that fall inside the time window.
///
/// Each combo hit contributes its multiplicity; hits outside the window
/// contribute nothing.
///
/// # Panics
/// Panics if a cluster index is out of range for `hits`; callers validate
/// indices first.
pub fn good_hits<H: Hit>(cluster: &TimeCluster, hits: &[H], window: TimeWindow) -> usize {
    cluster
        .hits
        .iter()
        .map(|&index| &hits[index])
        .filter(|hit| window.contains(hit.time()))
        .map(|hit| hit.multiplicity() as usize)
        .sum()
}
