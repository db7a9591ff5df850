#![allow(dead_code)]

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serial_neighbor::Point3;

/// Generate points uniformly distributed in `[0, 1)^3`.
pub fn random_cube_points(n: usize, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_cube_points_with_rng(n, &mut rng)
}

pub fn random_cube_points_with_rng<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Point3> {
    (0..n)
        .map(|_| Point3::new(rng.gen(), rng.gen(), rng.gen()))
        .collect()
}

/// Generate points uniformly distributed in `[lo, hi)^3`.
pub fn random_box_points(n: usize, lo: f32, hi: f32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
            )
        })
        .collect()
}

/// Regular lattice of `side^3` points with the given spacing, starting at `origin`.
pub fn lattice_points(side: usize, spacing: f32, origin: [f32; 3]) -> Vec<Point3> {
    let mut points = Vec::with_capacity(side * side * side);
    for x in 0..side {
        for y in 0..side {
            for z in 0..side {
                points.push(Point3::new(
                    origin[0] + x as f32 * spacing,
                    origin[1] + y as f32 * spacing,
                    origin[2] + z as f32 * spacing,
                ));
            }
        }
    }
    points
}

// =============================================================================
// Adversarial Point Generators for Stress Testing
// =============================================================================

/// Tight clusters around a few random centers.
///
/// Many points share a grid cell, so key ties are common and windows are
/// dominated by a single cluster.
pub fn clustered_points(n: usize, num_clusters: usize, spread: f32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centers = random_cube_points_with_rng(num_clusters.max(1), &mut rng);
    (0..n)
        .map(|_| {
            let c = centers[rng.gen_range(0..centers.len())];
            Point3::new(
                c.x + rng.gen_range(-spread..spread),
                c.y + rng.gen_range(-spread..spread),
                c.z + rng.gen_range(-spread..spread),
            )
        })
        .collect()
}

/// Points on a plane (z = 0) with jitter in x and y only.
pub fn planar_points(n: usize, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point3::new(rng.gen(), rng.gen(), 0.0))
        .collect()
}

/// `n` copies of the same point.
pub fn duplicate_points(n: usize, p: [f32; 3]) -> Vec<Point3> {
    vec![Point3::from(p); n]
}
