//! Error types for serialized neighbor search.

use std::fmt;

use thiserror::Error;

/// Which input point set an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSet {
    /// The source point cloud being searched.
    Points,
    /// The query points whose neighbors are sought.
    Queries,
    /// The lone point passed to a single-point operation such as
    /// [`quantize`](crate::quantize); the reported index is always 0.
    Single,
}

impl fmt::Display for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSet::Points => f.write_str("points"),
            PointSet::Queries => f.write_str("query_points"),
            PointSet::Single => f.write_str("the given point"),
        }
    }
}

/// Errors that can occur during serialized neighbor search.
///
/// All of these are raised during validation, before any serialization work
/// starts. A failed call never produces partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SerialNeighborError {
    /// A scalar or collection parameter is out of range.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Unrecognized space-filling curve name.
    #[error("unsupported serial order {0:?} (expected one of \"z\", \"z-trans\", \"hilbert\", \"hilbert-trans\")")]
    UnsupportedVariant(String),

    /// Encoding parameters disagree between components.
    ///
    /// A correct caller never sees this; it indicates a query was issued
    /// against an index built with a different grid size or curve.
    #[error("inconsistent parameters: {0}")]
    InconsistentParameters(String),

    /// NaN or infinite coordinate in the input.
    #[error("non-finite coordinate in {set} at index {index}")]
    NumericError { set: PointSet, index: usize },
}

impl SerialNeighborError {
    pub(crate) fn invalid(name: &'static str, value: impl fmt::Display, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerialNeighborError>;
