//! 1D finite-volume transport solver for the moment system.
//!
//! - [`TransportField`]: per-cell moments, multipliers and entropies of one run
//! - [`InitialCondition`]: the standard test profiles
//! - [`MNSolver1D`]: closure, kinetic upwind fluxes, conservative update and
//!   isotropic scattering, one explicit step at a time

mod field;
mod initial;
mod scattering;
mod transport;

pub use field::TransportField;
pub use initial::InitialCondition;
pub use scattering::{apply_scattering, scatter_cell, scatter_vector};
#[cfg(feature = "parallel")]
pub use transport::compute_face_fluxes_parallel;
pub use transport::{
    BoundaryMode, MNSolver1D, StepReport, TransportConfig, compute_face_fluxes,
};
