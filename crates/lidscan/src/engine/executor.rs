//! Shrinking-neighborhood estimation loop.
//!
//! ## Purpose
//!
//! This module is the core of the crate. It orchestrates P passes of
//! per-point local intrinsic dimensionality estimation: each pass runs one
//! neighbor search at a shrinking neighborhood size, fans one fit per point
//! over the search results, appends the completed row to the result matrix,
//! and hands the row to the scatter sink.
//!
//! ## Design notes
//!
//! * **Schedule**: `search_k(pass) = round(b0 * n - step * pass)` with `n`
//!   re-derived from the live point slice each pass. The fit size
//!   `fit_k = round(2 * log2(dims))` is computed once and held constant.
//! * **Fail-fast**: Any collaborator error abandons the pass; no partial
//!   row ever reaches the result matrix and the error propagates unmodified.
//! * **Parallelism**: Per-point fits are independent; the parallel path uses
//!   `rayon` and preserves row order, yielding results identical to the
//!   sequential path.
//! * **Stepping**: Passes run one at a time through [`ScanExecutor::step`],
//!   so a caller can abort between passes and keep completed rows.
//!
//! ## Invariants
//!
//! * Passes execute strictly in order; the sink call for pass p completes
//!   before pass p+1 starts.
//! * Every completed row holds exactly one estimate per point, point order.
//! * The point slice is never mutated.
//!
//! ## Non-goals
//!
//! * This module does not search neighbors or fit models itself (delegated
//!   to the collaborator traits).
//! * This module does not retry failed fits or patch partial rows.

// Feature-gated imports
#[cfg(feature = "cpu")]
use rayon::prelude::*;

// External dependencies
use num_traits::Float;
use std::fmt::Debug;
use std::time::Instant;
use tracing::debug;

// Internal dependencies
use crate::algorithms::mle::DimensionFitter;
use crate::engine::output::ScanResult;
use crate::math::neighborhood::{NeighborSearch, NeighborTable};
use crate::primitives::errors::ScanError;
use crate::render::sink::ScatterSink;

// ============================================================================
// Configuration
// ============================================================================

/// Validated parameters of the estimation loop.
#[derive(Debug, Clone)]
pub struct ScanConfig<T> {
    /// Number of passes to run.
    pub passes: usize,
    /// Initial search neighborhood budget as a fraction of the point count.
    pub initial_fraction: T,
    /// Per-pass search neighborhood decrement, in points.
    pub shrink_step: T,
    /// Override for the fit neighborhood size (default `round(2 log2 dims)`).
    pub fit_k: Option<usize>,
    /// Fan the per-point fits out across threads.
    pub parallel: bool,
}

impl<T: Float> Default for ScanConfig<T> {
    fn default() -> Self {
        Self {
            passes: 2,
            initial_fraction: T::from(0.2).unwrap(),
            shrink_step: T::from(50.0).unwrap(),
            fit_k: None,
            parallel: true,
        }
    }
}

impl<T: Float> ScanConfig<T> {
    /// Check the configuration for validity.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.passes == 0 {
            return Err(ScanError::InvalidInput(
                "pass count must be at least 1".to_string(),
            ));
        }
        if !self.initial_fraction.is_finite()
            || self.initial_fraction <= T::zero()
            || self.initial_fraction > T::one()
        {
            return Err(ScanError::InvalidInput(
                "initial neighborhood fraction must be in (0, 1]".to_string(),
            ));
        }
        if !self.shrink_step.is_finite() || self.shrink_step < T::zero() {
            return Err(ScanError::InvalidInput(
                "shrink step must be finite and non-negative".to_string(),
            ));
        }
        if self.fit_k == Some(0) {
            return Err(ScanError::InvalidInput(
                "fit neighborhood size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The fit neighborhood size derived from the ambient dimension count.
pub fn default_fit_k(dims: usize) -> usize {
    let raw = 2.0 * (dims as f64).log2();
    (raw.round() as usize).max(1)
}

// ============================================================================
// Executor
// ============================================================================

/// Pass-at-a-time driver of the estimation loop.
pub struct ScanExecutor<'a, T: Float> {
    points: &'a [T],
    dims: usize,
    config: ScanConfig<T>,
    search: &'a dyn NeighborSearch<T>,
    fitter: &'a dyn DimensionFitter<T>,
    sink: &'a mut dyn ScatterSink<T>,
    fit_k: usize,
    coords3: Vec<T>,
    next_pass: usize,
    result: ScanResult<T>,
}

impl<'a, T: Float + Debug + Send + Sync + 'static> ScanExecutor<'a, T> {
    /// Validate inputs and prepare a run. Computes `fit_k` exactly once.
    pub fn new(
        points: &'a [T],
        dims: usize,
        config: ScanConfig<T>,
        search: &'a dyn NeighborSearch<T>,
        fitter: &'a dyn DimensionFitter<T>,
        sink: &'a mut dyn ScatterSink<T>,
    ) -> Result<Self, ScanError> {
        config.validate()?;

        if dims == 0 {
            return Err(ScanError::InvalidInput(
                "points must have at least one dimension".to_string(),
            ));
        }
        if points.len() % dims != 0 {
            return Err(ScanError::MismatchedInputs {
                len: points.len(),
                dims,
            });
        }
        let n = points.len() / dims;
        if n < 2 {
            return Err(ScanError::InvalidInput(
                "at least 2 points are required".to_string(),
            ));
        }
        if points.iter().any(|v| !v.is_finite()) {
            return Err(ScanError::InvalidInput(
                "all coordinates must be finite".to_string(),
            ));
        }

        let fit_k = config.fit_k.unwrap_or_else(|| default_fit_k(dims));

        // Sinks always receive three coordinates per point; missing ambient
        // coordinates are zero-padded.
        let mut coords3 = Vec::with_capacity(n * 3);
        for i in 0..n {
            for d in 0..3 {
                coords3.push(if d < dims { points[i * dims + d] } else { T::zero() });
            }
        }

        let passes = config.passes;
        Ok(Self {
            points,
            dims,
            config,
            search,
            fitter,
            sink,
            fit_k,
            coords3,
            next_pass: 0,
            result: ScanResult::new(n, fit_k, passes),
        })
    }

    /// The fit neighborhood size in effect for the whole run.
    pub fn fit_k(&self) -> usize {
        self.fit_k
    }

    /// The search neighborhood size the schedule assigns to `pass`.
    ///
    /// The point count is re-derived from the live slice on every call
    /// rather than cached; the slice never changes, so this is a pure
    /// re-derivation.
    pub fn search_k(&self, pass: usize) -> i64 {
        let n_current = self.points.len() / self.dims;
        let raw = self.config.initial_fraction * T::from(n_current).unwrap()
            - self.config.shrink_step * T::from(pass).unwrap();
        raw.round().to_i64().unwrap_or(i64::MIN)
    }

    /// Rows completed so far.
    pub fn completed(&self) -> &ScanResult<T> {
        &self.result
    }

    /// Run the next pass. Returns `Ok(false)` once all passes are done.
    ///
    /// On error the pass contributes nothing; rows completed by earlier
    /// passes stay in place and remain reachable through [`Self::finish`].
    pub fn step(&mut self) -> Result<bool, ScanError> {
        if self.next_pass >= self.config.passes {
            return Ok(false);
        }
        let pass = self.next_pass;
        let n = self.points.len() / self.dims;

        // Schedule check happens before the search so an invalid pass
        // produces nothing at all.
        let k = self.search_k(pass);
        if k < 1 || k as usize >= n {
            return Err(ScanError::InvalidNeighborhoodSize {
                pass,
                k,
                max: n - 1,
            });
        }
        let search_k = k as usize;

        let started = Instant::now();
        let table = self.search.search(self.points, self.dims, search_k)?;

        let row = if self.config.parallel {
            estimate_row_parallel(self.points, self.dims, self.fit_k, self.fitter, &table)?
        } else {
            estimate_row_sequential(self.points, self.dims, self.fit_k, self.fitter, &table)?
        };

        debug!(
            pass,
            search_k,
            fit_k = self.fit_k,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pass complete"
        );

        // The row is appended and the pass counted before the render so a
        // sink failure cannot discard a fully computed pass, and a retried
        // step cannot duplicate it.
        self.result.push_row(search_k, row);
        self.next_pass += 1;
        let colors = self.result.row(pass);
        self.sink.render(pass, &self.coords3, colors)?;

        Ok(true)
    }

    /// Run every remaining pass and return the result matrix.
    pub fn run(mut self) -> Result<ScanResult<T>, ScanError> {
        while self.step()? {}
        Ok(self.result)
    }

    /// Stop here and keep the rows completed so far.
    pub fn finish(self) -> ScanResult<T> {
        self.result
    }
}

// ============================================================================
// Per-Pass Fan-out
// ============================================================================

/// Copy point `i` and its first `fit_k` neighbors into `cloud`.
fn assemble_cloud<T: Float>(
    points: &[T],
    dims: usize,
    i: usize,
    neighbors: &[usize],
    fit_k: usize,
    cloud: &mut Vec<T>,
) {
    cloud.clear();
    cloud.extend_from_slice(&points[i * dims..(i + 1) * dims]);
    for &j in neighbors.iter().take(fit_k) {
        cloud.extend_from_slice(&points[j * dims..(j + 1) * dims]);
    }
}

fn fit_point<T: Float>(
    points: &[T],
    dims: usize,
    fit_k: usize,
    fitter: &dyn DimensionFitter<T>,
    table: &NeighborTable<T>,
    i: usize,
    cloud: &mut Vec<T>,
) -> Result<T, ScanError> {
    let indices = table.indices_of(i);
    assemble_cloud(points, dims, i, indices, fit_k, cloud);
    let outcome = fitter.fit(i, cloud, dims, fit_k, indices, table.distances_of(i))?;
    Ok(outcome.dimension)
}

fn estimate_row_sequential<T: Float>(
    points: &[T],
    dims: usize,
    fit_k: usize,
    fitter: &dyn DimensionFitter<T>,
    table: &NeighborTable<T>,
) -> Result<Vec<T>, ScanError> {
    let n = table.n();
    let mut cloud = Vec::with_capacity((fit_k + 1) * dims);
    let mut row = Vec::with_capacity(n);
    for i in 0..n {
        row.push(fit_point(points, dims, fit_k, fitter, table, i, &mut cloud)?);
    }
    Ok(row)
}

#[cfg(feature = "cpu")]
fn estimate_row_parallel<T: Float + Send + Sync>(
    points: &[T],
    dims: usize,
    fit_k: usize,
    fitter: &dyn DimensionFitter<T>,
    table: &NeighborTable<T>,
) -> Result<Vec<T>, ScanError> {
    let n = table.n();
    (0..n)
        .into_par_iter()
        .map_init(
            || Vec::with_capacity((fit_k + 1) * dims),
            |cloud, i| fit_point(points, dims, fit_k, fitter, table, i, cloud),
        )
        .collect()
}

#[cfg(not(feature = "cpu"))]
fn estimate_row_parallel<T: Float + Send + Sync>(
    points: &[T],
    dims: usize,
    fit_k: usize,
    fitter: &dyn DimensionFitter<T>,
    table: &NeighborTable<T>,
) -> Result<Vec<T>, ScanError> {
    estimate_row_sequential(points, dims, fit_k, fitter, table)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_k_follows_two_log2_dims() {
        assert_eq!(default_fit_k(1), 1);
        assert_eq!(default_fit_k(2), 2);
        // round(2 * log2(3)) = round(3.17) = 3
        assert_eq!(default_fit_k(3), 3);
        assert_eq!(default_fit_k(4), 4);
        assert_eq!(default_fit_k(8), 6);
    }

    #[test]
    fn config_rejects_bad_parameters() {
        let mut cfg = ScanConfig::<f64>::default();
        cfg.passes = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScanConfig::<f64>::default();
        cfg.initial_fraction = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScanConfig::<f64>::default();
        cfg.initial_fraction = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = ScanConfig::<f64>::default();
        cfg.shrink_step = -1.0;
        assert!(cfg.validate().is_err());

        assert!(ScanConfig::<f64>::default().validate().is_ok());
    }
}
