//! Layer 4: Render
//!
//! ## Purpose
//!
//! This layer provides the visualization seam: the scatter sink called once
//! per completed pass with the point coordinates and the pass's estimates.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Input
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Render ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Scatter sink trait and built-in sinks.
pub mod sink;
