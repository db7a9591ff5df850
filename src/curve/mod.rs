//! Space-filling curve encoders.
//!
//! Each [`CurveOrder`] maps a [`GridCell`] to a scalar [`OrderKey`] such that
//! cells close in space tend to be close in key order. No curve is perfectly
//! locality preserving; requesting several curves at once covers the seams of
//! any single one.
//!
//! Keys use 21 bits per axis (63 bits total). Signed cells are shifted by
//! [`CELL_BIAS`] so that cell `0` lands mid-range, then clamped to
//! `[0, 2^21 - 1]`. Cells further than `2^20` from the origin collapse onto
//! the boundary of the key space: they still encode, just with reduced
//! locality.

pub(crate) mod hilbert;
pub(crate) mod morton;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SerialNeighborError};
use crate::quantize::GridCell;

/// Position of a grid cell along a curve. Only comparable between keys of the
/// same [`CurveOrder`].
pub type OrderKey = u64;

/// Bits per axis in an [`OrderKey`].
pub const AXIS_BITS: u32 = 21;
pub(crate) const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;
const AXIS_MAX: i64 = (1 << AXIS_BITS) - 1;

/// Offset added to each signed cell coordinate before encoding.
pub const CELL_BIAS: i64 = 1 << (AXIS_BITS - 1);

/// Supported space-filling curve variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveOrder {
    /// Morton / Z-order bit interleave.
    Z,
    /// Z-order with the x and y axes swapped.
    ZTrans,
    /// 3D Hilbert curve.
    Hilbert,
    /// Hilbert curve with the x and y axes swapped.
    HilbertTrans,
}

impl CurveOrder {
    pub const ALL: [CurveOrder; 4] = [
        CurveOrder::Z,
        CurveOrder::ZTrans,
        CurveOrder::Hilbert,
        CurveOrder::HilbertTrans,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            CurveOrder::Z => "z",
            CurveOrder::ZTrans => "z-trans",
            CurveOrder::Hilbert => "hilbert",
            CurveOrder::HilbertTrans => "hilbert-trans",
        }
    }

    /// Encode a grid cell into this curve's key space.
    #[inline]
    pub fn encode(self, cell: GridCell) -> OrderKey {
        let x = bias(cell.x);
        let y = bias(cell.y);
        let z = bias(cell.z);
        match self {
            CurveOrder::Z => morton::encode(x, y, z),
            CurveOrder::ZTrans => morton::encode(y, x, z),
            CurveOrder::Hilbert => hilbert::encode(x, y, z),
            CurveOrder::HilbertTrans => hilbert::encode(y, x, z),
        }
    }

    /// Recover the (biased, clamped) cell a key was encoded from.
    pub fn decode(self, key: OrderKey) -> GridCell {
        let (a, b, c) = match self {
            CurveOrder::Z => morton::decode(key),
            CurveOrder::ZTrans => {
                let (y, x, z) = morton::decode(key);
                (x, y, z)
            }
            CurveOrder::Hilbert => hilbert::decode(key),
            CurveOrder::HilbertTrans => {
                let (y, x, z) = hilbert::decode(key);
                (x, y, z)
            }
        };
        GridCell::new(unbias(a), unbias(b), unbias(c))
    }
}

impl fmt::Display for CurveOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveOrder {
    type Err = SerialNeighborError;

    fn from_str(s: &str) -> Result<Self> {
        CurveOrder::ALL
            .into_iter()
            .find(|order| order.name() == s)
            .ok_or_else(|| SerialNeighborError::UnsupportedVariant(s.to_string()))
    }
}

/// Encode a cell along the named curve.
pub fn encode(cell: GridCell, variant: &str) -> Result<OrderKey> {
    Ok(variant.parse::<CurveOrder>()?.encode(cell))
}

/// Parse a list of curve names.
///
/// Fails with `InvalidParameter` if the list is empty and `UnsupportedVariant`
/// on the first unknown name. Repeated names are collapsed; the first
/// occurrence keeps its position.
pub fn parse_orders<S: AsRef<str>>(names: &[S]) -> Result<Vec<CurveOrder>> {
    if names.is_empty() {
        return Err(SerialNeighborError::invalid(
            "serial_orders",
            "[]",
            "at least one curve is required",
        ));
    }
    let mut orders = Vec::with_capacity(names.len());
    for name in names {
        let order: CurveOrder = name.as_ref().parse()?;
        if !orders.contains(&order) {
            orders.push(order);
        }
    }
    Ok(orders)
}

#[inline]
fn bias(c: i32) -> u32 {
    (i64::from(c) + CELL_BIAS).clamp(0, AXIS_MAX) as u32
}

#[inline]
fn unbias(v: u32) -> i32 {
    (i64::from(v) - CELL_BIAS) as i32
}
