//! Merging per-curve results and assembling the batch output.

use rustc_hash::FxHashMap;

use crate::rank::{by_distance, Neighbor, NeighborResult};

/// Sentinel written to [`NeighborTable`] index slots with no neighbor.
pub const NEIGHBOR_SENTINEL: i64 = -1;

/// How results from several curves are combined for one query.
///
/// Both strategies produce identical output: the top `k` of a union equals the
/// top `k` of the union of each part's top `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineStrategy {
    /// Union every curve's candidate window, deduplicate, rank once.
    #[default]
    UnionCandidates,
    /// Rank each curve's window separately, then [`combine`] the results.
    MergeResults,
}

/// Merge several results for the same query into one of length `k`.
///
/// A point found through more than one curve counts once, with its smallest
/// distance. Sentinel slots are ignored. Ties are ordered by point index.
pub fn combine(per_variant: &[NeighborResult], k: usize) -> NeighborResult {
    let mut merge = MergeScratch::default();
    for result in per_variant {
        merge.push(result.as_slice());
    }
    let mut out = vec![Neighbor::SENTINEL; k];
    combine_into(&mut merge, &mut out);
    NeighborResult::from_slots(out)
}

/// Reusable buffers for merging per-curve results of one query at a time.
#[derive(Debug, Default)]
pub(crate) struct MergeScratch {
    best: FxHashMap<u32, f32>,
    merged: Vec<(f32, u32)>,
}

impl MergeScratch {
    #[inline]
    pub(crate) fn begin(&mut self) {
        self.best.clear();
        self.merged.clear();
    }

    /// Add one curve's slots, keeping each index at its smallest distance.
    pub(crate) fn push(&mut self, slots: &[Neighbor]) {
        for n in slots.iter().filter(|n| n.is_valid()) {
            self.best
                .entry(n.index)
                .and_modify(|d| *d = d.min(n.distance))
                .or_insert(n.distance);
        }
    }
}

/// Write the `out.len()` best merged entries into `out`, sentinel padded, and
/// return how many are valid. Leaves `merge` empty.
pub(crate) fn combine_into(merge: &mut MergeScratch, out: &mut [Neighbor]) -> usize {
    // At most `variants * k` entries; a full sort is fine here.
    merge.merged.clear();
    merge.merged.extend(merge.best.drain().map(|(idx, d)| (d, idx)));
    merge.merged.sort_unstable_by(by_distance);

    let valid = merge.merged.len().min(out.len());
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = match merge.merged.get(i) {
            Some(&(distance, index)) => Neighbor { index, distance },
            None => Neighbor::SENTINEL,
        };
    }
    merge.merged.clear();
    valid
}

/// Fixed-shape `(num_queries, k)` output of a batch search.
///
/// Row-major: row `q` occupies `[q * k, (q + 1) * k)` of both arrays. Missing
/// or masked slots hold [`NEIGHBOR_SENTINEL`] and `f32::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTable {
    k: usize,
    indices: Vec<i64>,
    distances: Vec<f32>,
}

impl NeighborTable {
    /// Callers check `num_queries * k` with `check_table_size` first.
    pub(crate) fn filled(num_queries: usize, k: usize) -> Self {
        Self {
            k,
            indices: vec![NEIGHBOR_SENTINEL; num_queries * k],
            distances: vec![f32::INFINITY; num_queries * k],
        }
    }

    /// Build a table from per-query results, each of length `k`.
    pub fn from_results(results: &[NeighborResult], k: usize) -> Self {
        let mut table = Self::filled(results.len(), k);
        for (q, result) in results.iter().enumerate() {
            debug_assert_eq!(result.len(), k);
            let (idx_row, dist_row) = table.row_mut(q);
            write_row(result.as_slice(), idx_row, dist_row);
        }
        table
    }

    #[inline]
    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.indices.len() / self.k
        }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// `(num_queries, k)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_queries(), self.k)
    }

    #[inline]
    pub fn indices(&self) -> &[i64] {
        &self.indices
    }

    #[inline]
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    /// Indices and distances of query `q`.
    #[inline]
    pub fn row(&self, q: usize) -> (&[i64], &[f32]) {
        let range = q * self.k..(q + 1) * self.k;
        (&self.indices[range.clone()], &self.distances[range])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&[i64], &[f32])> + '_ {
        (0..self.num_queries()).map(move |q| self.row(q))
    }

    /// Number of non-sentinel slots over all queries.
    pub fn valid_count(&self) -> usize {
        self.indices.iter().filter(|&&i| i != NEIGHBOR_SENTINEL).count()
    }

    /// Split into `(indices, distances)`.
    pub fn into_parts(self) -> (Vec<i64>, Vec<f32>) {
        (self.indices, self.distances)
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, q: usize) -> (&mut [i64], &mut [f32]) {
        let range = q * self.k..(q + 1) * self.k;
        (&mut self.indices[range.clone()], &mut self.distances[range])
    }

    #[inline]
    pub(crate) fn rows_mut(&mut self) -> (&mut [i64], &mut [f32]) {
        (&mut self.indices, &mut self.distances)
    }
}

#[inline]
pub(crate) fn write_row(slots: &[Neighbor], idx_row: &mut [i64], dist_row: &mut [f32]) {
    for ((slot, i), d) in slots.iter().zip(idx_row.iter_mut()).zip(dist_row.iter_mut()) {
        if slot.is_valid() {
            *i = i64::from(slot.index);
            *d = slot.distance;
        } else {
            *i = NEIGHBOR_SENTINEL;
            *d = f32::INFINITY;
        }
    }
}
