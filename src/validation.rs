//! Exact reference search and recall measurement.
//!
//! Serialized search is approximate: how often it recovers the true nearest
//! neighbors depends on the point distribution, `grid_size` and the window
//! radius. These helpers measure that against an all-pairs search so those
//! parameters can be tuned for a given workload.

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::combine::{write_row, NeighborTable, NEIGHBOR_SENTINEL};
use crate::error::{PointSet, Result, SerialNeighborError};
use crate::rank::{
    check_k, check_mask_threshold, check_table_size, euclidean, select_into, Neighbor,
};
use crate::serialize::{check_point_count, to_finite_vec3s};
use crate::types::Point3Like;

/// Exact `k` nearest neighbors of every query by comparing against all points.
///
/// Uses the same distance, tie-breaking, masking and sentinel rules as
/// [`serial_neighbor`](crate::serial_neighbor), so on inputs where the windows
/// cover the whole cloud the two produce identical tables. `O(n * m)`.
pub fn brute_force_neighbors<P, Q>(
    points: &[P],
    query_points: &[Q],
    k: usize,
    mask_threshold: Option<f32>,
) -> Result<NeighborTable>
where
    P: Point3Like + Sync,
    Q: Point3Like + Sync,
{
    check_k(k)?;
    check_table_size(query_points.len(), k)?;
    check_mask_threshold(mask_threshold)?;
    check_point_count(points.len())?;
    let points = to_finite_vec3s(points, PointSet::Points)?;
    let queries = to_finite_vec3s(query_points, PointSet::Queries)?;

    let mut table = NeighborTable::filled(queries.len(), k);
    if queries.is_empty() {
        return Ok(table);
    }
    let (indices, distances) = table.rows_mut();

    let scan = |scored: &mut Vec<(f32, u32)>,
                slots: &mut Vec<Neighbor>,
                q: Vec3,
                idx_row: &mut [i64],
                dist_row: &mut [f32]| {
        scored.clear();
        scored.extend(
            points
                .iter()
                .enumerate()
                .map(|(i, &p)| (euclidean(q, p), i as u32)),
        );
        select_into(scored, mask_threshold, slots);
        write_row(slots, idx_row, dist_row);
    };

    #[cfg(feature = "parallel")]
    indices
        .par_chunks_mut(k)
        .zip(distances.par_chunks_mut(k))
        .zip(queries.par_iter())
        .for_each_init(
            || (Vec::with_capacity(points.len()), vec![Neighbor::SENTINEL; k]),
            |(scored, slots), ((idx_row, dist_row), &q)| scan(scored, slots, q, idx_row, dist_row),
        );
    #[cfg(not(feature = "parallel"))]
    {
        let mut scored = Vec::with_capacity(points.len());
        let mut slots = vec![Neighbor::SENTINEL; k];
        for ((idx_row, dist_row), &q) in indices
            .chunks_mut(k)
            .zip(distances.chunks_mut(k))
            .zip(queries.iter())
        {
            scan(&mut scored, &mut slots, q, idx_row, dist_row);
        }
    }

    Ok(table)
}

/// How well an approximate table recovers an exact one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallReport {
    /// Number of queries compared.
    pub num_queries: usize,
    /// Valid neighbors in the exact table.
    pub expected: usize,
    /// Exact neighbors also present in the approximate row.
    pub found: usize,
    /// Mean of per-query recall, over queries with at least one exact neighbor.
    pub mean_recall: f64,
    /// Worst per-query recall (1.0 if nothing was expected).
    pub min_recall: f64,
    /// Queries whose approximate row contains every exact neighbor.
    pub perfect_queries: usize,
    /// Valid approximate entries whose index is not in the exact row.
    ///
    /// These are real points that are further than the true k-th neighbor.
    pub substitutions: usize,
}

impl RecallReport {
    /// Fraction of all exact neighbors recovered.
    pub fn overall_recall(&self) -> f64 {
        if self.expected == 0 {
            1.0
        } else {
            self.found as f64 / self.expected as f64
        }
    }

    /// Every exact neighbor was recovered for every query.
    pub fn is_exact(&self) -> bool {
        self.found == self.expected
    }
}

impl std::fmt::Display for RecallReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecallReport {{ queries={}, recall={:.4} (mean {:.4}, min {:.4}), perfect={}/{}, substitutions={} }}",
            self.num_queries,
            self.overall_recall(),
            self.mean_recall,
            self.min_recall,
            self.perfect_queries,
            self.num_queries,
            self.substitutions
        )
    }
}

/// Compare `approx` against `exact`, row by row.
///
/// Both tables must have the same shape. Sentinel slots are ignored on both
/// sides.
pub fn recall(approx: &NeighborTable, exact: &NeighborTable) -> Result<RecallReport> {
    if approx.shape() != exact.shape() {
        return Err(SerialNeighborError::InconsistentParameters(format!(
            "recall tables differ in shape: {:?} vs {:?}",
            approx.shape(),
            exact.shape()
        )));
    }

    let mut expected = 0usize;
    let mut found = 0usize;
    let mut substitutions = 0usize;
    let mut perfect_queries = 0usize;
    let mut recall_sum = 0.0f64;
    let mut scored_queries = 0usize;
    let mut min_recall = 1.0f64;

    for ((approx_row, _), (exact_row, _)) in approx.rows().zip(exact.rows()) {
        let truth: Vec<i64> = exact_row
            .iter()
            .copied()
            .filter(|&i| i != NEIGHBOR_SENTINEL)
            .collect();
        let mut hits = 0usize;
        for &i in approx_row.iter().filter(|&&i| i != NEIGHBOR_SENTINEL) {
            if truth.contains(&i) {
                hits += 1;
            } else {
                substitutions += 1;
            }
        }

        expected += truth.len();
        found += hits;
        if hits == truth.len() {
            perfect_queries += 1;
        }
        if !truth.is_empty() {
            let r = hits as f64 / truth.len() as f64;
            recall_sum += r;
            scored_queries += 1;
            min_recall = min_recall.min(r);
        }
    }

    Ok(RecallReport {
        num_queries: approx.num_queries(),
        expected,
        found,
        mean_recall: if scored_queries == 0 {
            1.0
        } else {
            recall_sum / scored_queries as f64
        },
        min_recall,
        perfect_queries,
        substitutions,
    })
}
