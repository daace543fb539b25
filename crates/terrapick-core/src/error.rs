//! Error types for terrapick.
//!
//! Ordinary picking misses are not errors; they are reported through
//! `PickOutcome`. Everything here is either a data-integrity fault in the
//! terrain buffers or a configuration/persistence failure.

use thiserror::Error;

/// The main error type for terrapick operations.
#[derive(Error, Debug)]
pub enum PickError {
    /// An index run references a vertex outside the vertex array.
    ///
    /// This means the index buffer is corrupted. The pick is aborted rather
    /// than clamped.
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    InvalidIndex {
        index: u32,
        vertex_count: usize,
        leaf_key: Option<u32>,
    },

    /// An index run whose length is not a whole number of triangles.
    #[error("index run of length {len} is not a multiple of 3")]
    MalformedIndexRun { len: usize, leaf_key: Option<u32> },

    /// A leaf range points past the end of the shared index buffer.
    #[error("leaf {leaf_key} range {start}..{end} exceeds index buffer of length {len}")]
    LeafRangeOutOfBounds {
        leaf_key: u32,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Two nodes in the same tree share a key.
    #[error("duplicate quad-tree node key {0}")]
    DuplicateKey(u32),

    /// The key does not name a leaf of the tree.
    #[error("no leaf with key {0}")]
    UnknownLeaf(u32),

    /// A spatial index was requested for zero triangles.
    #[error("cannot build a quad-tree from an empty triangle list")]
    EmptyTree,

    /// A ray with a zero-length or non-finite direction.
    #[error("ray direction is zero or not finite")]
    DegenerateRay,

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PickError {
    /// Attaches the owning leaf key to an index fault raised without one.
    #[must_use]
    pub fn with_leaf_key(self, key: u32) -> Self {
        match self {
            Self::InvalidIndex {
                index,
                vertex_count,
                leaf_key: None,
            } => Self::InvalidIndex {
                index,
                vertex_count,
                leaf_key: Some(key),
            },
            Self::MalformedIndexRun {
                len,
                leaf_key: None,
            } => Self::MalformedIndexRun {
                len,
                leaf_key: Some(key),
            },
            other => other,
        }
    }

    /// Returns true for faults caused by corrupted terrain buffers.
    #[must_use]
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidIndex { .. }
                | Self::MalformedIndexRun { .. }
                | Self::LeafRangeOutOfBounds { .. }
        )
    }

    /// Returns the leaf the fault was found in, if known.
    #[must_use]
    pub fn leaf_key(&self) -> Option<u32> {
        match self {
            Self::InvalidIndex { leaf_key, .. } | Self::MalformedIndexRun { leaf_key, .. } => {
                *leaf_key
            }
            Self::LeafRangeOutOfBounds { leaf_key, .. } => Some(*leaf_key),
            Self::UnknownLeaf(key) => Some(*key),
            _ => None,
        }
    }
}

/// A specialized Result type for terrapick operations.
pub type Result<T> = std::result::Result<T, PickError>;
