//! Candidate windows around a query's position in curve order.
//!
//! Because a curve is only locality preserving on average, the window must be
//! wider than `k` to recover the true nearest neighbors with high probability.
//! Larger windows approach brute-force accuracy at higher cost.

use std::ops::Range;

use glam::Vec3;

use crate::curve::CurveOrder;
use crate::error::{PointSet, Result, SerialNeighborError};
use crate::serialize::SerializedIndex;
use crate::types::{to_vec3, Point3Like};

/// Default multiple of `k` used as the window radius.
pub const DEFAULT_WINDOW_FACTOR: usize = 4;

/// How many sorted positions to scan on each side of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Radius is `factor * k`.
    PerNeighbor(usize),
    /// Radius is a fixed number of positions regardless of `k`.
    Fixed(usize),
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::PerNeighbor(DEFAULT_WINDOW_FACTOR)
    }
}

impl WindowPolicy {
    /// Window radius for a query asking for `k` neighbors.
    #[inline]
    pub fn radius(self, k: usize) -> usize {
        match self {
            WindowPolicy::PerNeighbor(factor) => factor.saturating_mul(k),
            WindowPolicy::Fixed(radius) => radius,
        }
    }

    pub(crate) fn validate(self) -> Result<()> {
        match self {
            WindowPolicy::PerNeighbor(0) => Err(SerialNeighborError::invalid(
                "window",
                "PerNeighbor(0)",
                "window factor must be positive",
            )),
            WindowPolicy::Fixed(0) => Err(SerialNeighborError::invalid(
                "window",
                "Fixed(0)",
                "window radius must be positive",
            )),
            _ => Ok(()),
        }
    }
}

/// Collect the point indices in the window around `query_point`.
///
/// `variant` and `grid_size` must be the ones `index` was built with; a
/// mismatch fails with `InconsistentParameters`. The window spans
/// `window_radius` sorted positions on each side of the query's insertion
/// point and is clamped to the ends of the index.
pub fn find_candidates<P: Point3Like>(
    query_point: &P,
    index: &SerializedIndex,
    variant: CurveOrder,
    grid_size: f32,
    window_radius: usize,
) -> Result<Vec<u32>> {
    if variant != index.order() {
        return Err(SerialNeighborError::InconsistentParameters(format!(
            "query encoded with curve {} but index was serialized with {}",
            variant,
            index.order()
        )));
    }
    if grid_size.to_bits() != index.grid_size().to_bits() {
        return Err(SerialNeighborError::InconsistentParameters(format!(
            "query quantized with grid_size {} but index was built with {}",
            grid_size,
            index.grid_size()
        )));
    }
    if window_radius == 0 {
        return Err(SerialNeighborError::invalid(
            "window_radius",
            0,
            "window radius must be positive",
        ));
    }
    let q = to_vec3(query_point);
    if !q.is_finite() {
        return Err(SerialNeighborError::NumericError {
            set: PointSet::Single,
            index: 0,
        });
    }

    let range = window_range(index, q, window_radius);
    Ok(index.sorted_indices()[range].to_vec())
}

/// Sorted-position range scanned for `q`.
#[inline]
pub(crate) fn window_range(index: &SerializedIndex, q: Vec3, radius: usize) -> Range<usize> {
    let pos = index.lower_bound(index.key_of(q));
    let start = pos.saturating_sub(radius);
    let end = pos.saturating_add(radius).min(index.len());
    start..end
}
