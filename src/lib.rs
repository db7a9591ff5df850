//! k-nearest-neighbor search over 3D point clouds by space-filling-curve
//! serialization.
//!
//! Points are quantized onto a uniform grid, sorted along one or more
//! space-filling curves (Z-order, Hilbert and their axis-swapped variants),
//! and each query ranks only the points that sit within a window around its
//! own position in curve order. Candidates are ranked by exact Euclidean
//! distance, so results are always real neighbors; recall depends on how well
//! the curves preserve locality for the data.
//!
//! # Example
//!
//! ```
//! use serial_neighbor::{serial_neighbor, NEIGHBOR_SENTINEL};
//!
//! let points = vec![
//!     [0.0f32, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [1.0, 1.0, 0.0],
//! ];
//! let queries = vec![[0.1f32, 0.1, 0.0], [5.0, 5.0, 5.0]];
//!
//! let table = serial_neighbor(&points, &queries, &["z", "hilbert"], 2, 0.5, Some(2.0))
//!     .expect("valid parameters");
//! assert_eq!(table.shape(), (2, 2));
//!
//! let (indices, distances) = table.row(0);
//! assert_eq!(indices, &[0, 1]);
//! assert!(distances[0] < distances[1]);
//!
//! // Everything is further than the mask threshold from the second query.
//! assert_eq!(table.row(1).0, &[NEIGHBOR_SENTINEL, NEIGHBOR_SENTINEL]);
//! ```
//!
//! For repeated query batches against the same cloud, build a
//! [`SerialNeighborIndex`] once and call [`SerialNeighborIndex::search`].

mod combine;
pub mod curve;
mod error;
mod quantize;
mod rank;
mod search;
mod serialize;
mod timing;
mod types;
pub mod validation;
mod window;

pub use combine::{combine, CombineStrategy, NeighborTable, NEIGHBOR_SENTINEL};
pub use curve::{parse_orders, CurveOrder, OrderKey};
pub use error::{PointSet, Result, SerialNeighborError};
pub use quantize::{quantize, GridCell};
pub use rank::{rank, Neighbor, NeighborResult};
pub use search::{
    serial_neighbor, serial_neighbor_with, NeighborOutput, SearchConfig, SearchDiagnostics,
    SerialNeighborIndex,
};
pub use serialize::{serialize, SerializedIndex};
pub use timing::SearchTimings;
pub use types::{Point3, Point3Like};
pub use window::{find_candidates, WindowPolicy, DEFAULT_WINDOW_FACTOR};
