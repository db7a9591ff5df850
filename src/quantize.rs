//! Continuous coordinates to integer grid cells.

use glam::Vec3;

use crate::error::{PointSet, Result, SerialNeighborError};
use crate::types::{to_vec3, Point3Like};

/// Integer grid cell, `floor(coordinate / grid_size)` per axis.
///
/// Many points may share a cell. Coordinates whose quotient exceeds the `i32`
/// range saturate at `i32::MIN` / `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Map a point to its grid cell.
///
/// Fails with `InvalidParameter` unless `grid_size` is positive and finite,
/// and with `NumericError { set: PointSet::Single, index: 0 }` if the point
/// has a non-finite coordinate.
pub fn quantize<P: Point3Like>(point: &P, grid_size: f32) -> Result<GridCell> {
    check_grid_size(grid_size)?;
    let p = to_vec3(point);
    if !p.is_finite() {
        return Err(SerialNeighborError::NumericError {
            set: PointSet::Single,
            index: 0,
        });
    }
    Ok(cell_of(p, grid_size))
}

pub(crate) fn check_grid_size(grid_size: f32) -> Result<()> {
    if grid_size.is_finite() && grid_size > 0.0 {
        Ok(())
    } else {
        Err(SerialNeighborError::invalid(
            "grid_size",
            grid_size,
            "must be positive and finite",
        ))
    }
}

/// The single quantization formula shared by serialization and windowing.
#[inline]
pub(crate) fn cell_of(p: Vec3, grid_size: f32) -> GridCell {
    let q = (p / grid_size).floor();
    // `as` saturates for out-of-range floats.
    GridCell::new(q.x as i32, q.y as i32, q.z as i32)
}
