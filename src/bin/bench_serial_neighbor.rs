//! Benchmark serialized kNN build + search, with recall against brute force.
//!
//! Build/run:
//!   cargo run --release --features cli --bin bench_serial_neighbor -- 200k -k 16
//!   cargo run --release --features cli,timing --bin bench_serial_neighbor -- 1m --orders z,hilbert
//!   RUST_LOG=serial_neighbor=debug cargo run --release --features cli --bin bench_serial_neighbor

use clap::{Parser, ValueEnum};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serial_neighbor::validation::{brute_force_neighbors, recall};
use serial_neighbor::{CombineStrategy, SearchConfig, SerialNeighborIndex, WindowPolicy};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 1_000_000)
    } else if let Some(stripped) = s.strip_suffix('k') {
        (stripped, 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Distribution {
    /// Uniform in the unit cube.
    Uniform,
    /// Gaussian blobs around random centers.
    Clustered,
}

fn generate_points<R: Rng>(n: usize, dist: Distribution, rng: &mut R) -> Vec<[f32; 3]> {
    match dist {
        Distribution::Uniform => (0..n)
            .map(|_| [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()])
            .collect(),
        Distribution::Clustered => {
            let centers: Vec<[f32; 3]> = (0..32)
                .map(|_| [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()])
                .collect();
            (0..n)
                .map(|_| {
                    let c = centers[rng.gen_range(0..centers.len())];
                    let mut p = [0.0f32; 3];
                    for (axis, v) in p.iter_mut().enumerate() {
                        // Sum of uniforms approximates a normal; spread ~0.02.
                        let g: f32 = (0..4).map(|_| rng.gen::<f32>() - 0.5).sum();
                        *v = c[axis] + g * 0.035;
                    }
                    p
                })
                .collect()
        }
    }
}

/// Cell edge giving roughly `per_cell` points per occupied cell in a unit cube.
fn auto_grid_size(n: usize, per_cell: f32) -> f32 {
    if n == 0 {
        return 1.0;
    }
    (per_cell / n as f32).cbrt()
}

#[derive(Parser)]
#[command(name = "bench_serial_neighbor")]
#[command(about = "Benchmark space-filling-curve kNN against brute force")]
struct Args {
    /// Number of points to generate (e.g., 100k, 1m).
    #[arg(value_parser = parse_count, default_value = "100k")]
    n: usize,

    /// Number of queries (defaults to n).
    #[arg(long, value_parser = parse_count)]
    queries: Option<usize>,

    /// Neighbors per query.
    #[arg(short, long, default_value_t = 16)]
    k: usize,

    /// Comma-separated curve names.
    #[arg(long, value_delimiter = ',', default_value = "z,z-trans,hilbert,hilbert-trans")]
    orders: Vec<String>,

    /// Grid cell edge. If omitted, uses a heuristic (~1 point per cell).
    #[arg(long)]
    grid_size: Option<f32>,

    /// Mask neighbors further than this distance.
    #[arg(long)]
    mask: Option<f32>,

    /// Window radius as a multiple of k.
    #[arg(long, default_value_t = serial_neighbor::DEFAULT_WINDOW_FACTOR)]
    window_factor: usize,

    /// Fixed window radius (overrides --window-factor).
    #[arg(long)]
    window: Option<usize>,

    /// Rank each curve separately and merge, instead of unioning candidates.
    #[arg(long)]
    merge: bool,

    /// Point distribution.
    #[arg(long, value_enum, default_value_t = Distribution::Uniform)]
    dist: Distribution,

    /// Random seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Search iterations to run (useful for profiling).
    #[arg(short = 'n', long, default_value_t = 3)]
    repeat: usize,

    /// Queries sampled for the brute-force recall check (0 = skip).
    #[arg(long, default_value_t = 2000)]
    recall_samples: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let points = generate_points(args.n, args.dist, &mut rng);
    let num_queries = args.queries.unwrap_or(args.n);
    let queries = generate_points(num_queries, args.dist, &mut rng);
    let grid_size = args.grid_size.unwrap_or_else(|| auto_grid_size(args.n, 1.0));

    let window = match args.window {
        Some(r) => WindowPolicy::Fixed(r),
        None => WindowPolicy::PerNeighbor(args.window_factor),
    };
    let combine = if args.merge {
        CombineStrategy::MergeResults
    } else {
        CombineStrategy::UnionCandidates
    };
    let config = SearchConfig::default()
        .with_window(window)
        .with_combine(combine);

    println!(
        "points={} queries={} k={} orders={:?} grid_size={:.5} window={:?} combine={:?} dist={:?}",
        args.n, num_queries, args.k, args.orders, grid_size, window, combine, args.dist
    );

    let t_build = Instant::now();
    let index = match SerialNeighborIndex::build(&points, &args.orders, grid_size, config) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("build failed: {}", e);
            std::process::exit(1);
        }
    };
    let build_ms = t_build.elapsed().as_secs_f64() * 1000.0;

    let mut search_ms = Vec::with_capacity(args.repeat.max(1));
    let mut last = None;
    for _ in 0..args.repeat.max(1) {
        let t = Instant::now();
        let out = match index.search(&queries, args.k, args.mask) {
            Ok(out) => out,
            Err(e) => {
                eprintln!("search failed: {}", e);
                std::process::exit(1);
            }
        };
        search_ms.push(t.elapsed().as_secs_f64() * 1000.0);
        last = Some(out);
    }
    let Some(out) = last else {
        return;
    };

    search_ms.sort_by(|a, b| a.total_cmp(b));
    let median = search_ms[search_ms.len() / 2];
    let per_query_us = median * 1000.0 / num_queries.max(1) as f64;
    let diag = &out.diagnostics;
    println!(
        "build={:.2}ms search(median)={:.2}ms ({:.3}us/query) candidates/query={:.1} masked={} unfilled={}",
        build_ms,
        median,
        per_query_us,
        diag.candidates_examined as f64 / num_queries.max(1) as f64,
        diag.masked_slots,
        diag.unfilled_slots
    );

    #[cfg(feature = "timing")]
    {
        let ms = |d: std::time::Duration| d.as_secs_f64() * 1000.0;
        println!(
            "timing: validate={:.2}ms serialize={:.2}ms query={:.2}ms",
            ms(diag.timings.validate),
            ms(diag.timings.serialize),
            ms(diag.timings.query)
        );
    }

    if args.recall_samples == 0 || num_queries == 0 {
        return;
    }

    // Recall on an evenly strided sample of the query batch.
    let stride = (num_queries / args.recall_samples.min(num_queries)).max(1);
    let sample: Vec<[f32; 3]> = queries.iter().step_by(stride).copied().collect();
    let t_exact = Instant::now();
    let report = index
        .search(&sample, args.k, args.mask)
        .and_then(|approx| {
            let exact = brute_force_neighbors(&points, &sample, args.k, args.mask)?;
            recall(&approx.neighbors, &exact)
        });
    match report {
        Ok(report) => println!(
            "{} (brute force on {} queries: {:.2}ms)",
            report,
            sample.len(),
            t_exact.elapsed().as_secs_f64() * 1000.0
        ),
        Err(e) => eprintln!("recall check failed: {}", e),
    }
}
