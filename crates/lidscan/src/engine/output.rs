//! Output types for LID scanning.
//!
//! ## Purpose
//!
//! This module defines [`ScanResult`], the result matrix accumulated by the
//! engine: one row of per-point dimensionality estimates per completed pass,
//! plus the realized search schedule and the fit neighborhood size.
//!
//! ## Invariants
//!
//! * Every row holds exactly one estimate per point, in point order.
//! * Rows appear in pass order; a row is either fully present or absent.

// External dependencies
use num_traits::Float;

/// Accumulated per-pass dimensionality estimates.
#[derive(Debug, Clone)]
pub struct ScanResult<T> {
    n_points: usize,
    fit_k: usize,
    search_ks: Vec<usize>,
    rows: Vec<Vec<T>>,
}

impl<T: Float> ScanResult<T> {
    pub(crate) fn new(n_points: usize, fit_k: usize, planned_passes: usize) -> Self {
        Self {
            n_points,
            fit_k,
            search_ks: Vec::with_capacity(planned_passes),
            rows: Vec::with_capacity(planned_passes),
        }
    }

    pub(crate) fn push_row(&mut self, search_k: usize, row: Vec<T>) {
        debug_assert_eq!(row.len(), self.n_points);
        self.search_ks.push(search_k);
        self.rows.push(row);
    }

    /// Number of points each row covers.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Number of completed passes.
    pub fn n_passes(&self) -> usize {
        self.rows.len()
    }

    /// The fit neighborhood size used for every fit in the run.
    pub fn fit_k(&self) -> usize {
        self.fit_k
    }

    /// Realized search neighborhood sizes, one per completed pass.
    pub fn search_schedule(&self) -> &[usize] {
        &self.search_ks
    }

    /// Estimates of pass `pass`, one per point in point order.
    pub fn row(&self, pass: usize) -> &[T] {
        &self.rows[pass]
    }

    /// All completed rows in pass order.
    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }
}
