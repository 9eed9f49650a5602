//! Vertical ordering of cluster hits.

use cosmicseed_core::hit::Hit;
use std::cmp::Ordering;

/// Orders hit indices by descending `y`, breaking ties by ascending index.
///
/// `output` is cleared first, so a buffer can be reused across clusters
/// without carrying anything over. NaN coordinates sort by
/// [`f64::total_cmp`], which keeps the order total and repeatable.
///
/// # Panics
/// Panics if an index is out of range for `hits`; callers validate indices
/// before ordering.
pub fn order_hits_by_height<H: Hit>(hits: &[H], input: &[usize], output: &mut Vec<usize>) {
    output.clear();
    output.extend_from_slice(input);
    output.sort_unstable_by(|&a, &b| compare_height(hits, a, b));
}

#[inline]
fn compare_height<H: Hit>(hits: &[H], a: usize, b: usize) -> Ordering {
    hits[b].y().total_cmp(&hits[a].y()).then(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmicseed_core::hit::{ChannelId, ComboHit, Vec3};

    fn hits_at(ys: &[f64]) -> Vec<ComboHit> {
        ys.iter()
            .enumerate()
            .map(|(i, &y)| ComboHit::new(Vec3::new(0.0, y, 0.0), 800.0, ChannelId::new(i as u32)))
            .collect()
    }

    #[test]
    fn test_orders_descending_y() {
        let hits = hits_at(&[1.0, 5.0, -3.0, 2.5]);
        let mut out = Vec::new();
        order_hits_by_height(&hits, &[0, 1, 2, 3], &mut out);
        assert_eq!(out, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_ties_broken_by_index() {
        let hits = hits_at(&[2.0, 2.0, 7.0, 2.0]);
        let mut out = Vec::new();
        order_hits_by_height(&hits, &[3, 1, 0, 2], &mut out);
        assert_eq!(out, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_subset_only_and_buffer_reset() {
        let hits = hits_at(&[0.0, 10.0, 20.0, 30.0]);
        let mut out = vec![99, 98, 97];
        order_hits_by_height(&hits, &[0, 2], &mut out);
        assert_eq!(out, vec![2, 0]);

        order_hits_by_height(&hits, &[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_deterministic_for_permuted_input() {
        let hits = hits_at(&[1.0, 1.0, 3.0, f64::NAN, -1.0]);
        let mut first = Vec::new();
        let mut second = Vec::new();
        order_hits_by_height(&hits, &[0, 1, 2, 3, 4], &mut first);
        order_hits_by_height(&hits, &[4, 3, 2, 1, 0], &mut second);
        assert_eq!(first, second);
    }
}
