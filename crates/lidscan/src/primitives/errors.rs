//! Error types for LID scanning.
//!
//! ## Purpose
//!
//! This module defines the single error enum used across the crate. Every
//! fallible operation — input validation, neighbor search, dimensionality
//! fitting, rendering — funnels through [`ScanError`] so callers match on
//! one type.
//!
//! ## Design notes
//!
//! * **Fail-fast**: Errors are fatal to the operation that raised them;
//!   no variant encodes a recoverable or partial state.
//! * **Propagation**: Collaborator errors pass through unmodified; the
//!   engine never substitutes defaults or patches partial rows.
//!
//! ## Key concepts
//!
//! * **Configuration errors**: `InvalidNeighborhoodSize`, `InvalidInput`.
//! * **Collaborator errors**: `InvalidK`, `FitFailure`, `RenderFailure`.

// External dependencies
use thiserror::Error;

/// Errors that can occur during a LID scan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    /// A computed per-pass search neighborhood size fell outside `[1, n-1]`.
    #[error(
        "search neighborhood size {k} for pass {pass} is outside the valid range [1, {max}]"
    )]
    InvalidNeighborhoodSize {
        /// Zero-based pass index at which the schedule became invalid.
        pass: usize,
        /// The computed (possibly negative) neighborhood size.
        k: i64,
        /// The largest admissible size, `n - 1`.
        max: usize,
    },

    /// A neighbor search was requested with k outside `[1, n-1]`.
    #[error("neighbor search requires 1 <= k <= n-1, got k = {k} with n = {n}")]
    InvalidK {
        /// The rejected neighborhood size.
        k: usize,
        /// The number of points in the set.
        n: usize,
    },

    /// The dimensionality fitter could not produce an estimate for a point.
    #[error("dimensionality fit failed for point {point}: {reason}")]
    FitFailure {
        /// Index of the point whose fit did not converge.
        point: usize,
        /// Human-readable cause.
        reason: String,
    },

    /// A scatter sink rejected a frame.
    #[error("scatter sink failed on pass {pass}: {reason}")]
    RenderFailure {
        /// Zero-based pass index of the rejected frame.
        pass: usize,
        /// Human-readable cause.
        reason: String,
    },

    /// The flat point buffer length is not a multiple of the dimension count.
    #[error("point buffer of length {len} is not divisible by {dims} dimensions")]
    MismatchedInputs {
        /// Length of the flat coordinate buffer.
        len: usize,
        /// Declared ambient dimension count.
        dims: usize,
    },

    /// Invalid input data or configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
