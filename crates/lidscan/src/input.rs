//! Input abstractions for LID scanning.
//!
//! ## Purpose
//!
//! This module provides a unified abstraction over point-cloud inputs,
//! allowing the `fit` method to accept multiple data formats (slices,
//! vectors, ndarray) through a single interface.
//!
//! ## Design notes
//!
//! * **Zero-copy where possible**: Provides direct slice access to underlying data buffers.
//! * **Fail-fast validation**: Ensures memory continuity for ndarray types before processing.
//!
//! ## Key concepts
//!
//! * **ScanInput Trait**: The core abstraction requiring a contiguous
//!   row-major slice view of N x dims coordinates.
//!
//! ## Invariants
//!
//! * Returned slices represent all elements in the input container.
//! * Non-contiguous inputs return an error rather than copying silently.
//!
//! ## Non-goals
//!
//! * This module does not perform data cleaning or imputation.
//! * This module does not reshape or reduce the data.

// Feature-gated imports
#[cfg(feature = "cpu")]
use ndarray::{ArrayBase, Data, Ix1, Ix2};

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::ScanError;

/// Trait for types usable as the point-cloud input of a scan.
pub trait ScanInput<T: Float> {
    /// View the input as a contiguous row-major coordinate slice.
    fn as_scan_slice(&self) -> Result<&[T], ScanError>;
}

impl<T: Float> ScanInput<T> for [T] {
    fn as_scan_slice(&self) -> Result<&[T], ScanError> {
        Ok(self)
    }
}

impl<T: Float> ScanInput<T> for Vec<T> {
    fn as_scan_slice(&self) -> Result<&[T], ScanError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "cpu")]
impl<T: Float, S> ScanInput<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn as_scan_slice(&self) -> Result<&[T], ScanError> {
        self.as_slice().ok_or_else(|| {
            ScanError::InvalidInput("ndarray input must be contiguous in memory".to_string())
        })
    }
}

#[cfg(feature = "cpu")]
impl<T: Float, S> ScanInput<T> for ArrayBase<S, Ix2>
where
    S: Data<Elem = T>,
{
    fn as_scan_slice(&self) -> Result<&[T], ScanError> {
        self.as_slice().ok_or_else(|| {
            ScanError::InvalidInput(
                "ndarray input must be contiguous and in standard (row-major) order".to_string(),
            )
        })
    }
}
