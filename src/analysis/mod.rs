//! Diagnostics for transport runs.
//!
//! - Integral quantities: total density Σ u_0 dx and total entropy Σ h dx
//! - Per-cell realizability ratio (values near 1 flag cells close to the
//!   boundary of the realizable set)
//! - Per-cell comparison of two fields, e.g. a surrogate run against the
//!   Newton reference
//!
//! # Example
//!
//! ```ignore
//! use mn_rs::analysis::{FieldComparison, FieldDiagnostics};
//!
//! let diag = FieldDiagnostics::compute(&field, solver.mesh(), solver.basis());
//! println!("mass {:.6}, entropy {:.6}", diag.total_density, diag.total_entropy);
//!
//! let cmp = FieldComparison::compute(&surrogate_field, &newton_field)?;
//! println!("max error {:.3e} in cell {}", cmp.max_error, cmp.max_error_cell);
//! ```

mod comparison;
mod diagnostics;

pub use comparison::{FieldComparison, field_difference};
pub use diagnostics::{FieldDiagnostics, realizability_map, total_density, total_entropy};
