//! Error types for hierarchy construction and flattening.

use thiserror::Error;

/// Errors that can occur while building or flattening a hierarchy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    /// No primitives were supplied.
    #[error("cannot build a hierarchy from zero primitives")]
    EmptyInput,

    /// A primitive has NaN or infinite coordinates.
    #[error("primitive {index} has non-finite coordinates")]
    NonFinitePrimitive {
        /// Index of the offending primitive.
        index: usize,
    },

    /// The tree violates the leaf/internal invariant.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// Too many nodes to address with signed 32-bit indices.
    #[error("too many nodes for flat encoding: {0}")]
    TooManyNodes(usize),

    /// Too many vertices to address with signed 32-bit offsets.
    #[error("too many vertices for flat encoding: {0}")]
    TooManyVertices(usize),

    /// A polygon references a vertex that does not exist.
    #[error("polygon {polygon} references missing vertex {index}")]
    VertexIndexOutOfRange {
        /// Index of the polygon.
        polygon: usize,
        /// The out-of-range vertex index.
        index: usize,
    },
}

/// Result type for hierarchy operations.
pub type Result<T> = std::result::Result<T, BvhError>;
