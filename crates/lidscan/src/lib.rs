//! Iterative local intrinsic dimensionality estimation.
//!
//! ## Purpose
//!
//! `lidscan` estimates the local intrinsic dimensionality (LID) of a point
//! cloud embedded in a higher-dimensional space. It repeatedly finds, for
//! every point, its k nearest neighbors under shrinking neighborhood sizes,
//! fits a per-point maximum-likelihood dimensionality estimator to each
//! neighborhood, and collects one estimate per point per pass into a result
//! matrix, handing each completed pass to a scatter sink as a color-coded
//! 3-D scatter of the original coordinates.
//!
//! ## Design notes
//!
//! * **Layered**: Primitives → Math → Algorithms → Render → Engine → Input → API.
//! * **Pluggable**: Neighbor search, dimensionality fitter, and scatter sink
//!   are narrow trait contracts; deterministic stubs slot in for testing.
//! * **Generic**: All numerics are generic over `num_traits::Float`.
//! * **Parallel**: Per-point fits fan out with `rayon` behind the `cpu`
//!   feature; sequential and parallel runs produce identical results.
//!
//! ## Example
//!
//! ```no_run
//! use lidscan::prelude::*;
//!
//! # fn main() -> Result<(), ScanError> {
//! // 500 points in 3-D, flat row-major.
//! let points: Vec<f64> = (0..1500).map(|i| (i as f64 * 0.31).sin()).collect();
//!
//! let result = Scan::new()
//!     .passes(2)
//!     .initial_fraction(0.2)
//!     .shrink_step(50.0)
//!     .build()?
//!     .fit(&points, 3)?;
//!
//! assert_eq!(result.n_passes(), 2);
//! assert_eq!(result.row(0).len(), 500);
//! # Ok(())
//! # }
//! ```

/// Layer 7: Fluent builder entry point.
pub mod api;

/// Layer 6: Input abstractions.
pub mod input;

/// Layer 5: Estimation loop and output types.
pub mod engine;

/// Layer 4: Scatter sinks.
pub mod render;

/// Layer 3: Dimensionality fitting algorithms.
pub mod algorithms;

/// Layer 2: Neighborhood search.
pub mod math;

/// Layer 1: Shared primitives.
pub mod primitives;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::algorithms::mle::{DimensionFitter, FitOutcome, FitParams, MleFitter};
    pub use crate::api::{Scan, ScanBuilder, ScanRunner};
    pub use crate::engine::executor::{default_fit_k, ScanConfig, ScanExecutor};
    pub use crate::engine::output::ScanResult;
    pub use crate::input::ScanInput;
    pub use crate::math::neighborhood::{KdTreeSearch, NeighborSearch, NeighborTable};
    pub use crate::primitives::errors::ScanError;
    pub use crate::render::sink::{MemorySink, NullSink, ScatterFrame, ScatterSink};
}
