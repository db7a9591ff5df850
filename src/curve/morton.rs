//! Morton (Z-order) bit interleaving for 21-bit axes.

use super::AXIS_MASK;

/// Spread the low 21 bits of `v` so that bit `i` lands at bit `3 * i`.
#[inline]
pub(crate) fn split_by_3(v: u32) -> u64 {
    let mut x = u64::from(v) & AXIS_MASK;
    x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// Inverse of [`split_by_3`]: gather every third bit starting at bit 0.
#[inline]
pub(crate) fn compact_by_3(v: u64) -> u32 {
    let mut x = v & 0x1249_2492_4924_9249;
    x = (x ^ (x >> 2)) & 0x10c3_0c30_c30c_30c3;
    x = (x ^ (x >> 4)) & 0x100f_00f0_0f00_f00f;
    x = (x ^ (x >> 8)) & 0x001f_0000_ff00_00ff;
    x = (x ^ (x >> 16)) & 0x001f_0000_0000_ffff;
    x = (x ^ (x >> 32)) & AXIS_MASK;
    x as u32
}

/// Interleave three 21-bit axes: `... z1 y1 x1 z0 y0 x0`.
#[inline]
pub(crate) fn encode(x: u32, y: u32, z: u32) -> u64 {
    split_by_3(x) | (split_by_3(y) << 1) | (split_by_3(z) << 2)
}

#[inline]
pub(crate) fn decode(key: u64) -> (u32, u32, u32) {
    (compact_by_3(key), compact_by_3(key >> 1), compact_by_3(key >> 2))
}
