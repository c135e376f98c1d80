//! Layer 2: Math
//!
//! ## Purpose
//!
//! This layer provides the numerical utilities below the algorithm layer,
//! primarily the KD-tree used for nearest neighbor search.
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
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// nD neighborhood search (KD-tree implementation).
pub mod neighborhood;
