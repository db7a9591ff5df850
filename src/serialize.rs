//! Point cloud serialization along a space-filling curve.

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::curve::{CurveOrder, OrderKey};
use crate::error::{PointSet, Result, SerialNeighborError};
use crate::quantize::{cell_of, check_grid_size};
use crate::types::{to_vec3, Point3Like};

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

/// Points sorted by their key along one curve.
///
/// Immutable once built. All arrays are flat and indexed by position:
/// - `keys[pos]` is the key of the point at sorted position `pos` (ascending),
/// - `permutation[pos]` is that point's original index,
/// - `inverse[idx]` is the sorted position of original point `idx`.
///
/// Equal keys are ordered by original index, so the permutation is
/// deterministic.
#[derive(Debug, Clone)]
pub struct SerializedIndex {
    order: CurveOrder,
    grid_size: f32,
    keys: Vec<OrderKey>,
    permutation: Vec<u32>,
    inverse: Vec<u32>,
}

impl SerializedIndex {
    #[inline]
    pub fn order(&self) -> CurveOrder {
        self.order
    }

    #[inline]
    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Original point indices in curve order.
    #[inline]
    pub fn sorted_indices(&self) -> &[u32] {
        &self.permutation
    }

    /// Keys in ascending order, parallel to [`sorted_indices`](Self::sorted_indices).
    #[inline]
    pub fn sorted_keys(&self) -> &[OrderKey] {
        &self.keys
    }

    /// Sorted position of each original point.
    #[inline]
    pub fn inverse(&self) -> &[u32] {
        &self.inverse
    }

    /// Sorted position of original point `index`.
    #[inline]
    pub fn position_of(&self, index: u32) -> usize {
        self.inverse[index as usize] as usize
    }

    /// First sorted position whose key is `>= key` (insertion point).
    #[inline]
    pub fn lower_bound(&self, key: OrderKey) -> usize {
        self.keys.partition_point(|&k| k < key)
    }

    /// Key of `p` under this index's grid size and curve.
    #[inline]
    pub(crate) fn key_of(&self, p: Vec3) -> OrderKey {
        self.order.encode(cell_of(p, self.grid_size))
    }
}

/// Sort a point cloud along `variant`.
///
/// Fails on an invalid `grid_size`, an unknown curve name, an empty cloud, a
/// cloud too large for `u32` indices, or non-finite coordinates.
pub fn serialize<P: Point3Like + Sync>(
    points: &[P],
    grid_size: f32,
    variant: &str,
) -> Result<SerializedIndex> {
    check_grid_size(grid_size)?;
    let order: CurveOrder = variant.parse()?;
    check_point_count(points.len())?;
    let converted = to_finite_vec3s(points, PointSet::Points)?;
    Ok(serialize_points(&converted, grid_size, order))
}

pub(crate) fn check_point_count(n: usize) -> Result<()> {
    if n == 0 {
        return Err(SerialNeighborError::invalid(
            "points",
            "[]",
            "point cloud must not be empty",
        ));
    }
    // u32::MAX is reserved for the sentinel index.
    if n >= u32::MAX as usize {
        return Err(SerialNeighborError::invalid(
            "points",
            format!("{} points", n),
            "too many points for u32 indices",
        ));
    }
    Ok(())
}

/// Convert to `Vec3`, rejecting the first non-finite coordinate.
pub(crate) fn to_finite_vec3s<P: Point3Like + Sync>(points: &[P], set: PointSet) -> Result<Vec<Vec3>> {
    let converted: Vec<Vec3> = maybe_par_iter!(points).map(to_vec3).collect();
    match converted.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(SerialNeighborError::NumericError { set, index }),
        None => Ok(converted),
    }
}

/// Build the index for already validated points.
pub(crate) fn serialize_points(points: &[Vec3], grid_size: f32, order: CurveOrder) -> SerializedIndex {
    let n = points.len();
    debug_assert!(n < u32::MAX as usize);

    let point_keys: Vec<OrderKey> = maybe_par_iter!(points)
        .map(|&p| order.encode(cell_of(p, grid_size)))
        .collect();

    // Sorting (key, index) pairs is a stable sort by key with ties broken by index.
    let mut sorted: Vec<(OrderKey, u32)> = point_keys
        .iter()
        .enumerate()
        .map(|(i, &key)| (key, i as u32))
        .collect();
    #[cfg(feature = "parallel")]
    sorted.par_sort_unstable();
    #[cfg(not(feature = "parallel"))]
    sorted.sort_unstable();

    let mut keys = Vec::with_capacity(n);
    let mut permutation = Vec::with_capacity(n);
    let mut inverse = vec![0u32; n];
    for (pos, &(key, idx)) in sorted.iter().enumerate() {
        keys.push(key);
        permutation.push(idx);
        inverse[idx as usize] = pos as u32;
    }

    SerializedIndex {
        order,
        grid_size,
        keys,
        permutation,
        inverse,
    }
}
