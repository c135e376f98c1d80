//! Layer 3: Algorithms
//!
//! ## Purpose
//!
//! This layer provides the per-neighborhood statistical model: the
//! dimensionality fitter invoked once per point per pass.
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
//! Layer 4: Render
//!   ↓
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Maximum-likelihood local intrinsic dimensionality estimation.
pub mod mle;
