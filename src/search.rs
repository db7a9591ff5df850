//! Batch neighbor search over one or more serialized curves.
//!
//! Each curve is serialized once per point cloud; every query then binary
//! searches each curve for its window, unions the windows and ranks the
//! candidates exactly. Queries are independent and share only the immutable
//! index, so they run data-parallel with per-worker scratch buffers.

use std::ops::Range;

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::combine::{combine_into, write_row, CombineStrategy, MergeScratch, NeighborTable};
use crate::curve::{parse_orders, CurveOrder};
use crate::error::{PointSet, Result};
use crate::quantize::check_grid_size;
use crate::rank::{
    check_k, check_mask_threshold, check_table_size, rank_unique_into, Neighbor, RankStats,
};
use crate::serialize::{check_point_count, serialize_points, to_finite_vec3s, SerializedIndex};
use crate::timing::{SearchTimings, Timer};
use crate::types::Point3Like;
use crate::window::{window_range, WindowPolicy};

/// Configuration for serialized neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchConfig {
    /// Window radius policy (sorted positions scanned on each side of a query).
    ///
    /// Larger windows raise recall towards brute force at proportional cost.
    /// The default scans `4k` positions on each side per curve.
    pub window: WindowPolicy,
    /// How candidates from several curves are combined. Both strategies return
    /// identical neighbors; `UnionCandidates` ranks each candidate once.
    pub combine: CombineStrategy,
}

impl SearchConfig {
    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    pub fn with_combine(mut self, combine: CombineStrategy) -> Self {
        self.combine = combine;
        self
    }
}

/// Diagnostic counters from a batch search.
#[derive(Debug, Clone, Default)]
pub struct SearchDiagnostics {
    /// Unique candidates ranked, summed over queries.
    pub candidates_examined: usize,
    /// Selected neighbors replaced by sentinels for exceeding the mask threshold.
    pub masked_slots: usize,
    /// Slots left as sentinels because a query had fewer than `k` candidates.
    pub unfilled_slots: usize,
    /// Phase timings (zero-sized unless the `timing` feature is enabled).
    pub timings: SearchTimings,
}

impl SearchDiagnostics {
    /// Returns true if every output slot holds a valid neighbor.
    pub fn is_complete(&self) -> bool {
        self.masked_slots == 0 && self.unfilled_slots == 0
    }
}

/// Output from a batch search, including neighbors and diagnostics.
#[derive(Debug, Clone)]
pub struct NeighborOutput {
    /// `(num_queries, k)` indices and distances.
    pub neighbors: NeighborTable,
    /// Diagnostic information about the search.
    pub diagnostics: SearchDiagnostics,
}

/// A point cloud serialized along one or more curves, ready for queries.
///
/// Building costs `O(n log n)` per curve; each [`search`](Self::search) reuses
/// the serialization. The index is immutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct SerialNeighborIndex {
    points: Vec<Vec3>,
    grid_size: f32,
    serialized: Vec<SerializedIndex>,
    config: SearchConfig,
    build_timings: SearchTimings,
}

impl SerialNeighborIndex {
    /// Validate inputs and serialize `points` along every requested curve.
    pub fn build<P, S>(
        points: &[P],
        serial_orders: &[S],
        grid_size: f32,
        config: SearchConfig,
    ) -> Result<Self>
    where
        P: Point3Like + Sync,
        S: AsRef<str>,
    {
        let mut timings = SearchTimings::default();
        let t = Timer::start();
        check_grid_size(grid_size)?;
        config.window.validate()?;
        let orders = parse_orders(serial_orders)?;
        check_point_count(points.len())?;
        let converted = to_finite_vec3s(points, PointSet::Points)?;
        timings.add_validate(t.elapsed());

        Ok(Self::build_validated(converted, &orders, grid_size, config, timings))
    }

    pub(crate) fn build_validated(
        points: Vec<Vec3>,
        orders: &[CurveOrder],
        grid_size: f32,
        config: SearchConfig,
        mut timings: SearchTimings,
    ) -> Self {
        let t = Timer::start();
        let serialized = serialize_curves(&points, orders, grid_size);
        timings.add_serialize(t.elapsed());

        tracing::debug!(
            num_points = points.len(),
            curves = ?orders,
            grid_size,
            "serialized point cloud"
        );

        Self {
            points,
            grid_size,
            serialized,
            config,
            build_timings: timings,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Curves in request order, duplicates removed.
    pub fn orders(&self) -> impl Iterator<Item = CurveOrder> + '_ {
        self.serialized.iter().map(|s| s.order())
    }

    /// The serialization for `order`, if it was requested.
    pub fn serialized(&self, order: CurveOrder) -> Option<&SerializedIndex> {
        self.serialized.iter().find(|s| s.order() == order)
    }

    /// Find the `k` nearest indexed points for every query.
    ///
    /// Neighbors further than `mask_threshold` (Euclidean) are replaced by
    /// sentinels. Fails without doing any query work if `k` is zero or too
    /// large for the output table, the threshold is negative or NaN, or a
    /// query coordinate is not finite.
    pub fn search<Q: Point3Like + Sync>(
        &self,
        query_points: &[Q],
        k: usize,
        mask_threshold: Option<f32>,
    ) -> Result<NeighborOutput> {
        let mut timings = SearchTimings::default();
        let t = Timer::start();
        check_k(k)?;
        check_table_size(query_points.len(), k)?;
        check_mask_threshold(mask_threshold)?;
        let queries = to_finite_vec3s(query_points, PointSet::Queries)?;
        timings.add_validate(t.elapsed());

        Ok(self.search_validated(&queries, k, mask_threshold, timings))
    }

    pub(crate) fn search_validated(
        &self,
        queries: &[Vec3],
        k: usize,
        mask_threshold: Option<f32>,
        mut timings: SearchTimings,
    ) -> NeighborOutput {
        let radius = self.config.window.radius(k);
        if radius.saturating_mul(2) < k {
            tracing::warn!(
                k,
                radius,
                "window holds fewer than k positions per curve; results will be sentinel padded"
            );
        }

        let t = Timer::start();
        let mut table = NeighborTable::filled(queries.len(), k);
        let stats = self.run_queries(queries, k, radius, mask_threshold, &mut table);
        timings.add_query(t.elapsed());

        let mut diagnostics = SearchDiagnostics {
            candidates_examined: stats.examined,
            masked_slots: stats.masked,
            unfilled_slots: stats.unfilled,
            timings: self.build_timings,
        };
        diagnostics.timings.merge(&timings);
        diagnostics.timings.report(queries.len());

        tracing::debug!(
            num_queries = queries.len(),
            k,
            radius,
            candidates_examined = diagnostics.candidates_examined,
            masked_slots = diagnostics.masked_slots,
            unfilled_slots = diagnostics.unfilled_slots,
            "serial neighbor search complete"
        );

        NeighborOutput {
            neighbors: table,
            diagnostics,
        }
    }

    fn run_queries(
        &self,
        queries: &[Vec3],
        k: usize,
        radius: usize,
        mask_threshold: Option<f32>,
        table: &mut NeighborTable,
    ) -> RankStats {
        if queries.is_empty() {
            return RankStats::default();
        }
        let n = self.points.len();
        let (indices, distances) = table.rows_mut();

        #[cfg(feature = "parallel")]
        {
            indices
                .par_chunks_mut(k)
                .zip(distances.par_chunks_mut(k))
                .zip(queries.par_iter())
                .map_init(
                    || QueryScratch::new(n, k),
                    |scratch, ((idx_row, dist_row), &q)| {
                        self.search_query(q, k, radius, mask_threshold, scratch, idx_row, dist_row)
                    },
                )
                .reduce(RankStats::default, RankStats::merged)
        }
        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = QueryScratch::new(n, k);
            indices
                .chunks_mut(k)
                .zip(distances.chunks_mut(k))
                .zip(queries.iter())
                .map(|((idx_row, dist_row), &q)| {
                    self.search_query(q, k, radius, mask_threshold, &mut scratch, idx_row, dist_row)
                })
                .fold(RankStats::default(), RankStats::merged)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search_query(
        &self,
        q: Vec3,
        k: usize,
        radius: usize,
        mask_threshold: Option<f32>,
        scratch: &mut QueryScratch,
        idx_row: &mut [i64],
        dist_row: &mut [f32],
    ) -> RankStats {
        scratch.begin_query();
        for index in &self.serialized {
            let range = window_range(index, q, radius);
            for &idx in &index.sorted_indices()[range.clone()] {
                if scratch.mark_seen(idx) {
                    scratch.candidates.push(idx);
                }
            }
            scratch.ranges.push(range);
        }

        let stats = match self.config.combine {
            CombineStrategy::UnionCandidates => rank_unique_into(
                q,
                &scratch.candidates,
                &self.points,
                mask_threshold,
                &mut scratch.scored,
                &mut scratch.slots,
            ),
            CombineStrategy::MergeResults => {
                let QueryScratch {
                    candidates,
                    ranges,
                    scored,
                    slots,
                    merge,
                    ..
                } = &mut *scratch;
                merge.begin();
                for (index, range) in self.serialized.iter().zip(ranges.iter()) {
                    // Windows of one curve never repeat an index.
                    rank_unique_into(
                        q,
                        &index.sorted_indices()[range.clone()],
                        &self.points,
                        mask_threshold,
                        scored,
                        slots.as_mut_slice(),
                    );
                    merge.push(slots.as_slice());
                }
                let valid = combine_into(merge, slots.as_mut_slice());

                let examined = candidates.len();
                let filled = k.min(examined);
                RankStats {
                    examined,
                    masked: filled - valid,
                    unfilled: k - filled,
                }
            }
        };

        write_row(&scratch.slots, idx_row, dist_row);
        stats
    }
}

/// Find the `k` nearest points for every query with default settings.
///
/// Returns a `(query_points.len(), k)` table. Slots with no neighbor, or whose
/// neighbor is further than `mask_threshold`, hold `-1` and `+inf`.
pub fn serial_neighbor<P, Q, S>(
    points: &[P],
    query_points: &[Q],
    serial_orders: &[S],
    k: usize,
    grid_size: f32,
    mask_threshold: Option<f32>,
) -> Result<NeighborTable>
where
    P: Point3Like + Sync,
    Q: Point3Like + Sync,
    S: AsRef<str>,
{
    serial_neighbor_with(
        points,
        query_points,
        serial_orders,
        k,
        grid_size,
        mask_threshold,
        SearchConfig::default(),
    )
    .map(|out| out.neighbors)
}

/// Find the `k` nearest points for every query with explicit configuration.
///
/// Every parameter and both point sets are validated before any work starts.
pub fn serial_neighbor_with<P, Q, S>(
    points: &[P],
    query_points: &[Q],
    serial_orders: &[S],
    k: usize,
    grid_size: f32,
    mask_threshold: Option<f32>,
    config: SearchConfig,
) -> Result<NeighborOutput>
where
    P: Point3Like + Sync,
    Q: Point3Like + Sync,
    S: AsRef<str>,
{
    let mut timings = SearchTimings::default();
    let t = Timer::start();
    check_k(k)?;
    check_table_size(query_points.len(), k)?;
    check_grid_size(grid_size)?;
    check_mask_threshold(mask_threshold)?;
    config.window.validate()?;
    let orders = parse_orders(serial_orders)?;
    check_point_count(points.len())?;
    let points = to_finite_vec3s(points, PointSet::Points)?;
    let queries = to_finite_vec3s(query_points, PointSet::Queries)?;
    timings.add_validate(t.elapsed());

    let index = SerialNeighborIndex::build_validated(points, &orders, grid_size, config, timings);
    Ok(index.search_validated(&queries, k, mask_threshold, SearchTimings::default()))
}

/// Serialize along each curve; curves are independent and built concurrently.
fn serialize_curves(points: &[Vec3], orders: &[CurveOrder], grid_size: f32) -> Vec<SerializedIndex> {
    #[cfg(feature = "parallel")]
    {
        orders
            .par_iter()
            .map(|&order| serialize_points(points, grid_size, order))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        orders
            .iter()
            .map(|&order| serialize_points(points, grid_size, order))
            .collect()
    }
}

impl RankStats {
    #[inline]
    fn merged(self, other: RankStats) -> RankStats {
        RankStats {
            examined: self.examined + other.examined,
            masked: self.masked + other.masked,
            unfilled: self.unfilled + other.unfilled,
        }
    }
}

/// Reusable per-worker query buffers.
///
/// Uses visitation stamps to deduplicate candidates across curves without
/// clearing an `n`-sized array between queries.
struct QueryScratch {
    seen_stamp: Vec<u32>,
    stamp: u32,
    candidates: Vec<u32>,
    ranges: Vec<Range<usize>>,
    scored: Vec<(f32, u32)>,
    slots: Vec<Neighbor>,
    merge: MergeScratch,
}

impl QueryScratch {
    fn new(num_points: usize, k: usize) -> Self {
        Self {
            seen_stamp: vec![0; num_points],
            stamp: 0,
            candidates: Vec::new(),
            ranges: Vec::new(),
            scored: Vec::new(),
            slots: vec![Neighbor::SENTINEL; k],
            merge: MergeScratch::default(),
        }
    }

    #[inline]
    fn begin_query(&mut self) {
        self.candidates.clear();
        self.ranges.clear();

        // Stamp 0 means "unseen". Avoid ever using stamp 0 for a query.
        self.stamp = self.stamp.wrapping_add(1).max(1);
        if self.stamp == u32::MAX {
            self.seen_stamp.fill(0);
            self.stamp = 1;
        }
    }

    #[inline]
    fn mark_seen(&mut self, idx: u32) -> bool {
        let slot = &mut self.seen_stamp[idx as usize];
        if *slot == self.stamp {
            return false;
        }
        *slot = self.stamp;
        true
    }
}
