//! Closure providers: map a batch of moment vectors to multipliers.
//!
//! The transport solver only talks to [`ClosureProvider`]. Two implementations
//! ship with the crate:
//!
//! - [`NewtonClosure`]: solves the dual problem of every cell with Newton's method.
//! - [`SurrogateClosure`]: asks a [`SurrogateModel`] for the multipliers and
//!   evaluates the consistency quantities with the same entropy kernel.
//!
//! Batches are flat, cell-major: cell `i` occupies `moments[i*n..(i+1)*n]`.

mod newton;
mod surrogate;

pub use newton::{NewtonClosure, NewtonClosureConfig};
pub use surrogate::{SurrogateClosure, SurrogateConfig, SurrogateModel};

use crate::error::{MnError, Result};

/// What to do with a moment vector whose density component is not positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DensityPolicy {
    /// Fail the closure call with [`MnError::DegenerateMoment`].
    Reject,
    /// Raise the density to the given floor before closing.
    ClampToFloor(f64),
}

impl DensityPolicy {
    /// Apply the policy to one moment vector in place.
    pub(crate) fn apply(&self, u: &mut [f64]) -> Result<()> {
        match *self {
            Self::Reject => crate::optimization::check_density(u),
            Self::ClampToFloor(floor) => {
                if let Some(u0) = u.first_mut() {
                    if u0.is_finite() && *u0 < floor {
                        *u0 = floor;
                    }
                }
                crate::optimization::check_density(u)
            }
        }
    }

    /// Reject non-positive or non-finite floors.
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            Self::Reject => Ok(()),
            Self::ClampToFloor(floor) if floor > 0.0 && floor.is_finite() => Ok(()),
            Self::ClampToFloor(floor) => Err(MnError::InvalidConfig(format!(
                "density floor must be positive, got {}",
                floor
            ))),
        }
    }
}

/// What to do when the dual solver fails to converge in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DivergencePolicy {
    /// Fail the closure call with [`MnError::OptimizationDivergence`].
    #[default]
    Abort,
    /// Log a warning and keep the warm-start multiplier for that cell.
    RetainPrevious,
}

/// Per-cell closure output for a batch.
#[derive(Clone, Debug, Default)]
pub struct ClosureBatch {
    n_system: usize,
    /// Reconstructed moments, cell-major.
    pub u_reconstructed: Vec<f64>,
    /// Multipliers, cell-major.
    pub alpha: Vec<f64>,
    /// Entropy value h = -J(α) per cell.
    pub entropy: Vec<f64>,
    /// Cells that kept a previous multiplier instead of converging.
    pub failed_cells: Vec<usize>,
    /// Cells whose moments were close to the realizability boundary.
    pub near_boundary_cells: Vec<usize>,
    /// Largest number of Newton steps over all cells (0 for surrogates).
    pub max_iterations: usize,
}

impl ClosureBatch {
    /// Create an empty batch for `n_cells` vectors of length `n_system`.
    pub fn with_capacity(n_system: usize, n_cells: usize) -> Self {
        Self {
            n_system,
            u_reconstructed: Vec::with_capacity(n_system * n_cells),
            alpha: Vec::with_capacity(n_system * n_cells),
            entropy: Vec::with_capacity(n_cells),
            ..Default::default()
        }
    }

    pub(crate) fn push(&mut self, u: &[f64], alpha: &[f64], entropy: f64) {
        self.u_reconstructed.extend_from_slice(u);
        self.alpha.extend_from_slice(alpha);
        self.entropy.push(entropy);
    }

    /// Length of each moment vector.
    pub fn n_system(&self) -> usize {
        self.n_system
    }

    /// Number of cells in the batch.
    pub fn n_cells(&self) -> usize {
        self.entropy.len()
    }

    /// Multiplier of cell `i`.
    pub fn alpha(&self, i: usize) -> &[f64] {
        &self.alpha[i * self.n_system..(i + 1) * self.n_system]
    }

    /// Reconstructed moments of cell `i`.
    pub fn u(&self, i: usize) -> &[f64] {
        &self.u_reconstructed[i * self.n_system..(i + 1) * self.n_system]
    }

    /// True if every cell converged.
    pub fn success(&self) -> bool {
        self.failed_cells.is_empty()
    }
}

/// Anything that can close a batch of moment vectors.
pub trait ClosureProvider: Send + Sync {
    /// Short label for logs and reports.
    fn name(&self) -> &str;

    /// Length of the moment vectors this provider accepts.
    fn basis_size(&self) -> usize;

    /// Close every cell of a flat, cell-major batch.
    ///
    /// `warm_start`, if given, holds one multiplier per cell in the same layout
    /// and seeds the per-cell optimization.
    fn compute_closure(&self, moments: &[f64], warm_start: Option<&[f64]>) -> Result<ClosureBatch>;
}

/// Validate a flat batch and return the number of cells.
pub(crate) fn batch_cells(n_system: usize, moments: &[f64], warm_start: Option<&[f64]>) -> Result<usize> {
    if n_system == 0 || moments.len() % n_system != 0 {
        return Err(MnError::size_mismatch(
            "moment batch (multiple of basis size)",
            n_system,
            moments.len(),
        ));
    }
    if let Some(warm) = warm_start {
        if warm.len() != moments.len() {
            return Err(MnError::size_mismatch(
                "warm-start multipliers",
                moments.len(),
                warm.len(),
            ));
        }
    }
    Ok(moments.len() / n_system)
}
