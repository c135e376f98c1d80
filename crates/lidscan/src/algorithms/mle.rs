//! Maximum-likelihood local intrinsic dimensionality estimation.
//!
//! ## Purpose
//!
//! This module provides the default [`DimensionFitter`] collaborator: the
//! Levina-Bickel maximum-likelihood estimator of local intrinsic
//! dimensionality from a point's nearest neighbor distances.
//!
//! ## Design notes
//!
//! * **Estimator**: For sorted neighbor distances `R_1 <= ... <= R_k`,
//!
//!   ```text
//!   d = kfac / sum_j ln(R_k / R_j)
//!   ```
//!
//!   with `kfac = k - 1`, or `k - 2` when the unbiased option is set.
//! * **Distance floor**: Distances are floored at a small epsilon so
//!   duplicate points cannot produce `ln(0)`.
//! * **Failure mode**: A non-finite or negative estimate is reported as
//!   [`ScanError::FitFailure`]; the engine propagates it without retry.
//!
//! ## Key concepts
//!
//! * **FitOutcome**: The scalar estimate plus auxiliary fit parameters;
//!   the engine keeps the estimate and discards the rest.
//!
//! ## Invariants
//!
//! * At least 2 neighbor distances are required for a fit.
//! * The returned estimate is finite and non-negative.
//!
//! ## Non-goals
//!
//! * This module does not model measurement noise (the translated-Poisson
//!   noise correction of Haro et al. is out of scope).
//! * This module does not aggregate per-point estimates into a global one.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::ScanError;

// ============================================================================
// Collaborator Contract
// ============================================================================

/// Contract for the per-neighborhood dimensionality collaborator.
///
/// The engine calls `fit` once per point per pass with the point's local
/// sub-cloud (the point itself followed by its `fit_k` nearest neighbors,
/// flat row-major) and, as side context, the point's full neighbor table
/// row from the current search.
pub trait DimensionFitter<T: Float>: Send + Sync {
    /// Estimate the local intrinsic dimensionality of one neighborhood.
    ///
    /// `point` is the index of the query point, used for error attribution.
    #[allow(clippy::too_many_arguments)]
    fn fit(
        &self,
        point: usize,
        local_cloud: &[T],
        dims: usize,
        fit_k: usize,
        neighbor_indices: &[usize],
        neighbor_distances: &[T],
    ) -> Result<FitOutcome<T>, ScanError>;
}

/// Result of fitting one point's neighborhood.
#[derive(Debug, Clone, Copy)]
pub struct FitOutcome<T> {
    /// Estimated local intrinsic dimensionality.
    pub dimension: T,
    /// Auxiliary fit parameters; discarded by the engine after recording.
    pub params: FitParams<T>,
}

/// Auxiliary parameters of a single fit.
#[derive(Debug, Clone, Copy)]
pub struct FitParams<T> {
    /// Number of neighbor distances the estimate was computed from.
    pub neighbors_used: usize,
    /// Distance to the farthest neighbor used.
    pub max_distance: T,
}

// ============================================================================
// MLE Fitter
// ============================================================================

/// Levina-Bickel maximum-likelihood dimensionality fitter.
#[derive(Debug, Clone, Copy)]
pub struct MleFitter {
    /// Use the unbiased normalization `k - 2` instead of `k - 1`.
    unbiased: bool,
    /// Relative floor applied to distances to avoid `ln(0)`.
    epsilon: f64,
}

impl Default for MleFitter {
    fn default() -> Self {
        Self {
            unbiased: false,
            epsilon: 1e-10,
        }
    }
}

impl MleFitter {
    /// Create an MLE fitter with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the unbiased normalization `k - 2` (requires `fit_k >= 3`).
    pub fn unbiased(mut self, unbiased: bool) -> Self {
        self.unbiased = unbiased;
        self
    }

    /// Set the distance floor used to avoid `ln(0)` on duplicate points.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Estimate dimensionality from sorted neighbor distances alone.
    pub fn fit_distances<T: Float>(&self, point: usize, rs: &[T]) -> Result<FitOutcome<T>, ScanError> {
        let k = rs.len();
        let min_k = if self.unbiased { 3 } else { 2 };
        if k < min_k {
            return Err(ScanError::FitFailure {
                point,
                reason: format!("{} neighbor distances are too few for the MLE fit", k),
            });
        }

        let eps = T::from(self.epsilon).unwrap();
        let r_max = rs[k - 1].max(eps);

        let mut log_sum = T::zero();
        for &r in &rs[..k - 1] {
            log_sum = log_sum + (r_max / r.max(eps)).ln();
        }

        let kfac = if self.unbiased { k - 2 } else { k - 1 };
        let dimension = T::from(kfac).unwrap() / log_sum;

        if !dimension.is_finite() || dimension < T::zero() {
            return Err(ScanError::FitFailure {
                point,
                reason: "maximum-likelihood estimate did not converge to a finite value"
                    .to_string(),
            });
        }

        Ok(FitOutcome {
            dimension,
            params: FitParams {
                neighbors_used: k,
                max_distance: rs[k - 1],
            },
        })
    }
}

impl<T: Float> DimensionFitter<T> for MleFitter {
    fn fit(
        &self,
        point: usize,
        _local_cloud: &[T],
        _dims: usize,
        fit_k: usize,
        _neighbor_indices: &[usize],
        neighbor_distances: &[T],
    ) -> Result<FitOutcome<T>, ScanError> {
        // The MLE works on distances only; the local cloud and index context
        // are part of the contract for geometry-aware fitters.
        let used = fit_k.min(neighbor_distances.len());
        self.fit_distances(point, &neighbor_distances[..used])
    }
}

// ============================================================================
// Tests
// ============================================================================
