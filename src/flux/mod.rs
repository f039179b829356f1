//! Numerical flux functions.
//!
//! - Scalar upwind flux for linear advection along one direction
//! - Kinetic upwind flux of the moment system, built from the scalar flux at
//!   every velocity node

mod kinetic;
mod upwind;

pub use kinetic::{kinetic_upwind_flux, kinetic_upwind_flux_into};
pub use upwind::upwind_flux;
