//! Simulation runner.
//!
//! Ties the transport solver to any number of independent fields, each closed
//! by its own [`ClosureProvider`](crate::closure::ClosureProvider), and reports
//! every step to an observer.
//!
//! # Example
//! ```ignore
//! use mn_rs::simulation::Simulation;
//!
//! let mut sim = Simulation::new(solver)
//!     .with_lane("newton", field.clone(), Box::new(newton))?
//!     .with_lane("surrogate", field, Box::new(surrogate))?;
//!
//! let result = sim.run_with_callback(|record| {
//!     println!("{} step {}: min density {:.3e}", record.label, record.report.step, record.report.min_density)
//! });
//! ```

mod runner;

pub use runner::{LaneSummary, Simulation, SimulationConfig, SimulationResult, StepRecord};
