//! Zero-cost phase timings for serialized neighbor search.
//!
//! When the `timing` feature is enabled, [`SearchTimings`] records wall time
//! for validation, serialization and the per-query pass. When disabled, all
//! types become zero-sized and all methods compile away.

#[cfg(feature = "timing")]
mod real;
#[cfg(not(feature = "timing"))]
mod stub;

#[cfg(feature = "timing")]
pub use real::*;
#[cfg(not(feature = "timing"))]
pub use stub::*;
