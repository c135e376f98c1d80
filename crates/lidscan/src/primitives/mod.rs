//! Layer 1: Primitives
//!
//! ## Purpose
//!
//! This layer provides the foundational types shared by every other layer,
//! primarily the crate-wide error enum.
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
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Crate-wide error types.
pub mod errors;
