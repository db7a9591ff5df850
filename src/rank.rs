//! Exact distance ranking of candidate sets.
//!
//! Distances are true Euclidean distances, in the same units as the mask
//! threshold. Selection is a partial selection (`select_nth_unstable_by`) so
//! only the `k` survivors are fully sorted. Ordering uses the reported
//! distance itself, and equal distances are ordered by ascending point index.

use std::cmp::Ordering;

use glam::Vec3;

use crate::error::{PointSet, Result, SerialNeighborError};
use crate::types::{to_vec3, Point3Like};

/// One slot of a neighbor list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the point cloud, or `u32::MAX` for the sentinel.
    pub index: u32,
    /// Euclidean distance to the query, or `+inf` for the sentinel.
    pub distance: f32,
}

impl Neighbor {
    /// "No valid neighbor in this slot."
    pub const SENTINEL: Neighbor = Neighbor {
        index: u32::MAX,
        distance: f32::INFINITY,
    };

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.index != u32::MAX
    }
}

/// The `k` nearest neighbors of one query, ascending by distance.
///
/// Always exactly `k` slots long. Slots with no neighbor (masked, or fewer
/// than `k` candidates) hold [`Neighbor::SENTINEL`] and sit at the tail. Valid
/// entries never repeat a point index.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborResult {
    neighbors: Vec<Neighbor>,
}

impl NeighborResult {
    pub(crate) fn from_slots(neighbors: Vec<Neighbor>) -> Self {
        Self { neighbors }
    }

    /// Number of slots (`k`).
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Non-sentinel entries, nearest first.
    pub fn valid(&self) -> impl Iterator<Item = &Neighbor> + '_ {
        self.neighbors.iter().filter(|n| n.is_valid())
    }

    pub fn into_vec(self) -> Vec<Neighbor> {
        self.neighbors
    }
}

/// Slot accounting for one ranked query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RankStats {
    /// Unique candidates whose distance was computed.
    pub examined: usize,
    /// Selected neighbors replaced by sentinels for exceeding the threshold.
    pub masked: usize,
    /// Slots left empty because there were fewer than `k` candidates.
    pub unfilled: usize,
}

/// Rank `candidate_indices` by distance to `query_point` and keep the `k`
/// nearest.
///
/// Duplicate candidate indices count once. Neighbors further than
/// `mask_threshold` become sentinels rather than being dropped, so the result
/// always has `k` slots.
pub fn rank<P: Point3Like, Q: Point3Like>(
    query_point: &Q,
    candidate_indices: &[u32],
    points: &[P],
    k: usize,
    mask_threshold: Option<f32>,
) -> Result<NeighborResult> {
    check_k(k)?;
    check_table_size(1, k)?;
    check_mask_threshold(mask_threshold)?;
    let q = to_vec3(query_point);
    if !q.is_finite() {
        return Err(SerialNeighborError::NumericError {
            set: PointSet::Single,
            index: 0,
        });
    }
    if let Some(&bad) = candidate_indices.iter().find(|&&i| i as usize >= points.len()) {
        return Err(SerialNeighborError::invalid(
            "candidate_indices",
            bad,
            "candidate index out of range for the point cloud",
        ));
    }

    let mut unique = candidate_indices.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let mut scored = Vec::with_capacity(unique.len());
    for &idx in &unique {
        let p = to_vec3(&points[idx as usize]);
        if !p.is_finite() {
            return Err(SerialNeighborError::NumericError {
                set: PointSet::Points,
                index: idx as usize,
            });
        }
        scored.push((euclidean(q, p), idx));
    }

    let mut out = vec![Neighbor::SENTINEL; k];
    select_into(&mut scored, mask_threshold, &mut out);
    Ok(NeighborResult::from_slots(out))
}

pub(crate) fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(SerialNeighborError::invalid("k", 0, "k must be positive"));
    }
    Ok(())
}

/// `k` must also keep the `(num_queries, k)` output addressable.
pub(crate) fn check_table_size(num_queries: usize, k: usize) -> Result<()> {
    match num_queries.checked_mul(k) {
        Some(slots) if slots <= MAX_TABLE_SLOTS => Ok(()),
        _ => Err(SerialNeighborError::invalid(
            "k",
            k,
            "num_queries * k exceeds the addressable output size",
        )),
    }
}

/// Upper bound on `num_queries * k`; both output arrays must fit in `isize`.
pub(crate) const MAX_TABLE_SLOTS: usize = isize::MAX as usize / std::mem::size_of::<i64>();

/// Euclidean distance between `a` and `b`.
///
/// Squares are taken in `f64`, so any pair of finite `f32` points has a finite,
/// ordered distance. Results beyond `f32::MAX` saturate there rather than
/// becoming the sentinel `+inf`.
#[inline]
pub(crate) fn euclidean(a: Vec3, b: Vec3) -> f32 {
    (a.as_dvec3().distance(b.as_dvec3()) as f32).min(f32::MAX)
}

pub(crate) fn check_mask_threshold(mask_threshold: Option<f32>) -> Result<()> {
    match mask_threshold {
        Some(t) if t.is_nan() || t < 0.0 => Err(SerialNeighborError::invalid(
            "mask_threshold",
            t,
            "must be non-negative",
        )),
        _ => Ok(()),
    }
}

#[inline]
pub(crate) fn by_distance(a: &(f32, u32), b: &(f32, u32)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Score unique candidates against `q` and fill `out` (length `k`).
///
/// `candidates` must be deduplicated and in range. `scratch` is reused
/// across queries.
#[inline]
pub(crate) fn rank_unique_into(
    q: Vec3,
    candidates: &[u32],
    points: &[Vec3],
    mask_threshold: Option<f32>,
    scratch: &mut Vec<(f32, u32)>,
    out: &mut [Neighbor],
) -> RankStats {
    scratch.clear();
    scratch.extend(
        candidates
            .iter()
            .map(|&idx| (euclidean(q, points[idx as usize]), idx)),
    );
    select_into(scratch, mask_threshold, out)
}

/// Keep the `out.len()` smallest `(distance, index)` pairs, sorted, masked and
/// sentinel padded.
pub(crate) fn select_into(
    scored: &mut Vec<(f32, u32)>,
    mask_threshold: Option<f32>,
    out: &mut [Neighbor],
) -> RankStats {
    let k = out.len();
    let mut stats = RankStats {
        examined: scored.len(),
        ..RankStats::default()
    };

    if scored.len() > k {
        scored.select_nth_unstable_by(k - 1, by_distance);
        scored.truncate(k);
    }
    scored.sort_unstable_by(by_distance);

    for (slot, &(distance, idx)) in out.iter_mut().zip(scored.iter()) {
        *slot = match mask_threshold {
            Some(t) if distance > t => {
                stats.masked += 1;
                Neighbor::SENTINEL
            }
            _ => Neighbor {
                index: idx,
                distance,
            },
        };
    }
    for slot in out.iter_mut().skip(scored.len()) {
        *slot = Neighbor::SENTINEL;
    }
    stats.unfilled = k.saturating_sub(scored.len());
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn test_unit_square_tie_broken_by_index() {
        let result = rank(&[0.1f32, 0.1, 0.0], &[3, 2, 1, 0], &square(), 2, Some(2.0)).unwrap();
        let slots = result.as_slice();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].index, 0);
        assert!((slots[0].distance - 0.02f32.sqrt()).abs() < 1e-6);
        assert_eq!(slots[1].index, 1);
        assert!((slots[1].distance - 0.82f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_pads_with_sentinels() {
        let result = rank(&[0.0f32, 0.0, 0.0], &[1, 2], &square(), 4, None).unwrap();
        let slots = result.as_slice();
        assert_eq!(slots.len(), 4);
        assert!(slots[0].is_valid() && slots[1].is_valid());
        assert_eq!(slots[2], Neighbor::SENTINEL);
        assert_eq!(slots[3], Neighbor::SENTINEL);
        assert_eq!(result.valid().count(), 2);
    }

    #[test]
    fn test_duplicates_count_once() {
        let result = rank(&[0.0f32, 0.0, 0.0], &[0, 0, 1, 1, 0], &square(), 3, None).unwrap();
        let indices: Vec<u32> = result.as_slice().iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, u32::MAX]);
    }

    #[test]
    fn test_mask_threshold() {
        let all_masked = rank(&[0.5f32, 0.5, 0.5], &[0, 1, 2, 3], &square(), 4, Some(0.01)).unwrap();
        assert!(all_masked.as_slice().iter().all(|n| *n == Neighbor::SENTINEL));

        // Exactly at the threshold is kept.
        let at_edge = rank(&[0.0f32, 0.0, 0.0], &[0, 1, 3], &square(), 3, Some(1.0)).unwrap();
        let indices: Vec<u32> = at_edge.as_slice().iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, u32::MAX]);

        let zero = rank(&[0.0f32, 0.0, 0.0], &[0, 1], &square(), 2, Some(0.0)).unwrap();
        assert_eq!(zero.as_slice()[0].index, 0);
        assert_eq!(zero.as_slice()[1], Neighbor::SENTINEL);
    }

    #[test]
    fn test_select_matches_full_sort() {
        let mut scored: Vec<(f32, u32)> = (0..200u32)
            .map(|i| (((i * 7919) % 97) as f32, i))
            .collect();
        let mut expected = scored.clone();
        expected.sort_unstable_by(by_distance);

        let mut out = vec![Neighbor::SENTINEL; 10];
        let stats = select_into(&mut scored, None, &mut out);
        assert_eq!(stats.examined, 200);
        assert_eq!(stats.unfilled, 0);
        for (slot, &(d, idx)) in out.iter().zip(expected.iter()) {
            assert_eq!(slot.index, idx);
            assert_eq!(slot.distance, d);
        }
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let points = square();
        let q = [0.0f32, 0.0, 0.0];
        assert!(matches!(
            rank(&q, &[0], &points, 0, None),
            Err(SerialNeighborError::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            rank(&q, &[0], &points, 1, Some(-1.0)),
            Err(SerialNeighborError::InvalidParameter { name: "mask_threshold", .. })
        ));
        assert!(matches!(
            rank(&q, &[0], &points, 1, Some(f32::NAN)),
            Err(SerialNeighborError::InvalidParameter { name: "mask_threshold", .. })
        ));
        assert!(matches!(
            rank(&q, &[4], &points, 1, None),
            Err(SerialNeighborError::InvalidParameter { name: "candidate_indices", .. })
        ));
        assert!(matches!(
            rank(&[f32::NAN, 0.0, 0.0], &[0], &points, 1, None),
            Err(SerialNeighborError::NumericError { set: PointSet::Single, index: 0 })
        ));
    }

    #[test]
    fn test_huge_coordinates_rank_by_true_distance() {
        let points = [[3.0e19f32, 0.0, 0.0], [2.0e19, 0.0, 0.0], [0.0, -1.0e20, 0.0]];
        let result = rank(&[0.0f32, 0.0, 0.0], &[0, 1, 2], &points, 3, None).unwrap();
        let indices: Vec<u32> = result.as_slice().iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![1, 0, 2]);
        for n in result.as_slice() {
            assert!(n.distance.is_finite());
        }
        assert!((result.as_slice()[0].distance / 2.0e19 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_saturates_instead_of_overflowing() {
        let a = Vec3::splat(-f32::MAX);
        let b = Vec3::splat(f32::MAX);
        assert_eq!(euclidean(a, b), f32::MAX);
        assert_eq!(euclidean(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn test_table_size_checked() {
        assert!(check_table_size(1000, 16).is_ok());
        assert!(check_table_size(0, usize::MAX).is_ok());
        assert!(matches!(
            check_table_size(2, usize::MAX / 2 + 1),
            Err(SerialNeighborError::InvalidParameter { name: "k", .. })
        ));
        assert!(check_table_size(1, MAX_TABLE_SLOTS + 1).is_err());
    }
}
