//! Layer 5: Engine
//!
//! ## Purpose
//!
//! This layer drives the shrinking-neighborhood estimation loop: one
//! neighbor search per pass, one dimensionality fit per point per pass,
//! one result row and one scatter frame per completed pass.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Input
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Render
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// The pass loop and per-point fan-out.
pub mod executor;

/// Scan output types.
pub mod output;
