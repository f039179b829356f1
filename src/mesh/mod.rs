//! Mesh representation.
//!
//! Only the uniform 1D cell grid used by the finite-volume transport solver.

mod mesh1d;

pub use mesh1d::{BoundaryFace, Mesh1D};
