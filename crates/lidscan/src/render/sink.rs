//! Scatter sinks for per-pass visualization.
//!
//! ## Purpose
//!
//! This module defines the [`ScatterSink`] collaborator: the engine hands it
//! one frame per completed pass — N 3-D coordinate triples from the original
//! point cloud and N scalar color values, both in point order — and the sink
//! turns that into a colored 3-D scatter however it sees fit.
//!
//! ## Design notes
//!
//! * **Pure side effect**: The engine consumes no return value beyond the
//!   error channel; rendering never influences later passes.
//! * **Zero-padding**: Points with fewer than three ambient coordinates
//!   arrive padded with zeros, so sinks always see exactly three per point.
//!
//! ## Key concepts
//!
//! * **Frame**: One pass's coordinates and colors, delivered in pass order.
//!
//! ## Non-goals
//!
//! * This module does not implement plotting; concrete rendering backends
//!   live with the caller.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::ScanError;

/// Contract for the visualization collaborator.
pub trait ScatterSink<T: Float> {
    /// Render one frame: `coords3` holds three coordinates per point,
    /// `colors` one scalar per point, both in point order.
    fn render(&mut self, pass: usize, coords3: &[T], colors: &[T]) -> Result<(), ScanError>;
}

/// Sink that discards every frame. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<T: Float> ScatterSink<T> for NullSink {
    fn render(&mut self, _pass: usize, _coords3: &[T], _colors: &[T]) -> Result<(), ScanError> {
        Ok(())
    }
}

/// One recorded frame.
#[derive(Debug, Clone)]
pub struct ScatterFrame<T> {
    /// Zero-based pass index the frame belongs to.
    pub pass: usize,
    /// Three coordinates per point, point order.
    pub coords3: Vec<T>,
    /// One color value per point, point order.
    pub colors: Vec<T>,
}

/// Sink that records every frame in memory, for inspection and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink<T> {
    frames: Vec<ScatterFrame<T>>,
}

impl<T: Float> MemorySink<T> {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Recorded frames, in pass order.
    pub fn frames(&self) -> &[ScatterFrame<T>] {
        &self.frames
    }

    /// Consume the sink and return its frames.
    pub fn into_frames(self) -> Vec<ScatterFrame<T>> {
        self.frames
    }
}

impl<T: Float> ScatterSink<T> for MemorySink<T> {
    fn render(&mut self, pass: usize, coords3: &[T], colors: &[T]) -> Result<(), ScanError> {
        self.frames.push(ScatterFrame {
            pass,
            coords3: coords3.to_vec(),
            colors: colors.to_vec(),
        });
        Ok(())
    }
}
