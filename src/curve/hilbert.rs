//! 3D Hilbert curve keys.
//!
//! Uses Skilling's transpose formulation ("Programming the Hilbert curve",
//! AIP Conf. Proc. 707, 2004): the axes are rotated/reflected in place into the
//! "transposed" Hilbert index, whose bits are then interleaved exactly like a
//! Morton key (axis 0 most significant within each 3-bit group).
//!
//! The curve starts at the origin and consecutive keys always map to cells
//! that differ by one step along exactly one axis.

use super::{morton, AXIS_BITS};

const TOP: u32 = 1 << (AXIS_BITS - 1);

/// Encode three 21-bit axes into a 63-bit Hilbert key.
#[inline]
pub(crate) fn encode(x: u32, y: u32, z: u32) -> u64 {
    let mut axes = [x, y, z];
    axes_to_transpose(&mut axes);
    // Axis 0 carries the most significant bit of every 3-bit digit.
    morton::encode(axes[2], axes[1], axes[0])
}

/// Inverse of [`encode`].
#[inline]
pub(crate) fn decode(key: u64) -> (u32, u32, u32) {
    let (a2, a1, a0) = morton::decode(key);
    let mut axes = [a0, a1, a2];
    transpose_to_axes(&mut axes);
    (axes[0], axes[1], axes[2])
}

fn axes_to_transpose(x: &mut [u32; 3]) {
    // Inverse undo.
    let mut q = TOP;
    while q > 1 {
        let p = q - 1;
        for i in 0..3 {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q >>= 1;
    }

    // Gray encode.
    x[1] ^= x[0];
    x[2] ^= x[1];
    let mut t = 0;
    let mut q = TOP;
    while q > 1 {
        if x[2] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for v in x.iter_mut() {
        *v ^= t;
    }
}

fn transpose_to_axes(x: &mut [u32; 3]) {
    // Gray decode by H ^ (H / 2).
    let t = x[2] >> 1;
    x[2] ^= x[1];
    x[1] ^= x[0];
    x[0] ^= t;

    // Undo excess work.
    let mut q = 2u32;
    while q != TOP << 1 {
        let p = q - 1;
        for i in (0..3).rev() {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q <<= 1;
    }
}
