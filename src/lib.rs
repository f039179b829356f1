//! # mn-rs
//!
//! Minimum-entropy (M_N) moment closures for linear kinetic transport.
//!
//! This crate provides the building blocks of an M_N solver:
//! - Quadrature rules on [-1, 1] and the sphere (Gauss-Legendre products)
//! - Moment bases (monomial, real spherical harmonics) tabulated at the nodes
//! - The Maxwell-Boltzmann entropy and its Legendre dual
//! - A damped Newton solver for the regularized dual problem
//! - Closure providers (Newton, learned surrogate) behind one trait
//! - A 1D finite-volume transport solver with kinetic upwind fluxes and
//!   isotropic scattering
//! - A multi-run simulation driver and field diagnostics

pub mod analysis;
pub mod basis;
pub mod closure;
pub mod entropy;
pub mod error;
pub mod flux;
pub mod mesh;
pub mod optimization;
pub mod polynomial;
pub mod quadrature;
pub mod simulation;
pub mod solver;

// Re-export main types for convenience
pub use analysis::{FieldComparison, FieldDiagnostics};
pub use basis::{BasisKind, MomentBasis, build_quadrature_and_basis};
pub use closure::{
    ClosureBatch, ClosureProvider, DensityPolicy, DivergencePolicy, NewtonClosure,
    NewtonClosureConfig, SurrogateClosure, SurrogateConfig, SurrogateModel,
};
pub use error::{MnError, Result};
pub use flux::{kinetic_upwind_flux, upwind_flux};
pub use mesh::Mesh1D;
pub use optimization::{DualProblem, DualSolution, NewtonConfig, solve_multiplier};
pub use quadrature::QuadratureRule;
pub use simulation::{Simulation, SimulationResult, StepRecord};
pub use solver::{
    BoundaryMode, InitialCondition, MNSolver1D, StepReport, TransportConfig, TransportField,
};
