//! High-level API for LID scanning.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements
//! a fluent builder pattern for configuring the estimation loop and choosing
//! its collaborators, ending in a validated runner whose `fit` executes the
//! scan.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for all parameters.
//! * **Validated**: Parameters are checked when `.build()` is called.
//! * **Pluggable**: Neighbor search, dimensionality fitter, and scatter sink
//!   are trait objects; stubs slot in for testing.
//! * **Type-Safe**: Generic over `Float` types for flexible precision.
//!
//! ## Key concepts
//!
//! * **Configuration Flow**: `Scan::new()` → chained setters → `.build()` →
//!   `.fit(&points, dims)` or `.fit_with_sink(&points, dims, &mut sink)`.
//!
//! ## Invariants
//!
//! * A runner only exists for a configuration that passed validation.

// External dependencies
use num_traits::Float;
use std::fmt::Debug;

// Internal dependencies
use crate::algorithms::mle::{DimensionFitter, MleFitter};
use crate::engine::executor::{ScanConfig, ScanExecutor};
use crate::engine::output::ScanResult;
use crate::input::ScanInput;
use crate::math::neighborhood::{KdTreeSearch, NeighborSearch};
use crate::primitives::errors::ScanError;
use crate::render::sink::{NullSink, ScatterSink};

// ============================================================================
// Entry Point
// ============================================================================

/// Entry point for configuring a LID scan.
#[derive(Debug, Clone, Copy)]
pub struct Scan;

impl Scan {
    /// Start a builder with default parameters.
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T: Float + Debug + Send + Sync + 'static>() -> ScanBuilder<T> {
        ScanBuilder::default()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for a [`ScanRunner`].
pub struct ScanBuilder<T: Float> {
    config: ScanConfig<T>,
    search: Box<dyn NeighborSearch<T>>,
    fitter: Box<dyn DimensionFitter<T>>,
}

impl<T: Float + Debug + Send + Sync + 'static> Default for ScanBuilder<T> {
    fn default() -> Self {
        Self {
            config: ScanConfig::default(),
            search: Box::new(KdTreeSearch::new()),
            fitter: Box::new(MleFitter::new()),
        }
    }
}

impl<T: Float + Debug + Send + Sync + 'static> ScanBuilder<T> {
    /// Set the number of passes (default 2).
    pub fn passes(mut self, passes: usize) -> Self {
        self.config.passes = passes;
        self
    }

    /// Set the initial search budget as a fraction of the point count
    /// (default 0.2).
    pub fn initial_fraction(mut self, fraction: T) -> Self {
        self.config.initial_fraction = fraction;
        self
    }

    /// Set the per-pass search neighborhood decrement in points (default 50).
    pub fn shrink_step(mut self, step: T) -> Self {
        self.config.shrink_step = step;
        self
    }

    /// Override the fit neighborhood size (default `round(2 log2 dims)`).
    pub fn fit_k(mut self, fit_k: usize) -> Self {
        self.config.fit_k = Some(fit_k);
        self
    }

    /// Set parallel execution mode (default true).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Replace the neighbor-search collaborator.
    pub fn neighbor_search(mut self, search: impl NeighborSearch<T> + 'static) -> Self {
        self.search = Box::new(search);
        self
    }

    /// Replace the dimensionality-fitter collaborator.
    pub fn fitter(mut self, fitter: impl DimensionFitter<T> + 'static) -> Self {
        self.fitter = Box::new(fitter);
        self
    }

    /// Validate the configuration and build the runner.
    pub fn build(self) -> Result<ScanRunner<T>, ScanError> {
        self.config.validate()?;
        Ok(ScanRunner {
            config: self.config,
            search: self.search,
            fitter: self.fitter,
        })
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Validated scan, ready to fit point clouds.
pub struct ScanRunner<T: Float> {
    config: ScanConfig<T>,
    search: Box<dyn NeighborSearch<T>>,
    fitter: Box<dyn DimensionFitter<T>>,
}

impl<T: Float + Debug + Send + Sync + 'static> ScanRunner<T> {
    /// Run all passes over `points` (flat row-major, `dims` coordinates per
    /// point), discarding scatter frames.
    pub fn fit<I>(&self, points: &I, dims: usize) -> Result<ScanResult<T>, ScanError>
    where
        I: ScanInput<T> + ?Sized,
    {
        let mut sink = NullSink;
        self.fit_with_sink(points, dims, &mut sink)
    }

    /// Run all passes, delivering one scatter frame per completed pass.
    pub fn fit_with_sink<I>(
        &self,
        points: &I,
        dims: usize,
        sink: &mut dyn ScatterSink<T>,
    ) -> Result<ScanResult<T>, ScanError>
    where
        I: ScanInput<T> + ?Sized,
    {
        let slice = points.as_scan_slice()?;
        ScanExecutor::new(
            slice,
            dims,
            self.config.clone(),
            self.search.as_ref(),
            self.fitter.as_ref(),
            sink,
        )?
        .run()
    }

    /// Build a pass-at-a-time executor over `points`, for callers that want
    /// to abort between passes and keep completed rows.
    pub fn executor<'a>(
        &'a self,
        points: &'a [T],
        dims: usize,
        sink: &'a mut dyn ScatterSink<T>,
    ) -> Result<ScanExecutor<'a, T>, ScanError> {
        ScanExecutor::new(
            points,
            dims,
            self.config.clone(),
            self.search.as_ref(),
            self.fitter.as_ref(),
            sink,
        )
    }
}
