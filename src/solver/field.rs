//! Moment field storage for the 1D transport solver.

use crate::closure::ClosureBatch;
use crate::error::{MnError, Result};

/// Per-cell state of one transport run.
///
/// Moments and multipliers are stored contiguously with layout
/// [n_cells, n_system]; `cell(i)` and `alpha(i)` return the slice of cell i.
/// Each run owns its field; two runs never share buffers.
#[derive(Clone, Debug)]
pub struct TransportField {
    /// Moments, stored as moments[i * n_system + k] for cell i, component k
    pub moments: Vec<f64>,
    /// Multipliers from the most recent closure, same layout as `moments`
    pub alpha: Vec<f64>,
    /// Entropy value h = -J(α) per cell
    pub entropy: Vec<f64>,
    /// Number of cells
    pub n_cells: usize,
    /// Length of every moment vector
    pub n_system: usize,
}

impl TransportField {
    /// Create a field with all moments, multipliers and entropies at zero.
    pub fn new(n_cells: usize, n_system: usize) -> Self {
        Self {
            moments: vec![0.0; n_cells * n_system],
            alpha: vec![0.0; n_cells * n_system],
            entropy: vec![0.0; n_cells],
            n_cells,
            n_system,
        }
    }

    /// Create a field from flat, cell-major moments.
    pub fn from_moments(n_system: usize, moments: Vec<f64>) -> Result<Self> {
        if n_system == 0 || moments.len() % n_system != 0 {
            return Err(MnError::size_mismatch(
                "moment field (multiple of basis size)",
                n_system,
                moments.len(),
            ));
        }
        let n_cells = moments.len() / n_system;
        Ok(Self {
            alpha: vec![0.0; moments.len()],
            entropy: vec![0.0; n_cells],
            moments,
            n_cells,
            n_system,
        })
    }

    /// Moments of cell i.
    pub fn cell(&self, i: usize) -> &[f64] {
        let start = i * self.n_system;
        &self.moments[start..start + self.n_system]
    }

    /// Mutable moments of cell i.
    pub fn cell_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.n_system;
        &mut self.moments[start..start + self.n_system]
    }

    /// Multiplier of cell i.
    pub fn alpha(&self, i: usize) -> &[f64] {
        let start = i * self.n_system;
        &self.alpha[start..start + self.n_system]
    }

    /// Density component u_0 of every cell.
    pub fn density(&self) -> Vec<f64> {
        self.moments.iter().step_by(self.n_system).copied().collect()
    }

    /// Smallest density over all cells.
    pub fn min_density(&self) -> f64 {
        self.density().into_iter().fold(f64::INFINITY, f64::min)
    }

    /// Store the multipliers and entropies of a closure batch.
    pub fn apply_closure(&mut self, batch: &ClosureBatch) -> Result<()> {
        if batch.alpha.len() != self.alpha.len() {
            return Err(MnError::size_mismatch(
                "closure multipliers",
                self.alpha.len(),
                batch.alpha.len(),
            ));
        }
        if batch.entropy.len() != self.n_cells {
            return Err(MnError::size_mismatch(
                "closure entropies",
                self.n_cells,
                batch.entropy.len(),
            ));
        }
        self.alpha.copy_from_slice(&batch.alpha);
        self.entropy.copy_from_slice(&batch.entropy);
        Ok(())
    }

    /// Maximum absolute moment value.
    pub fn max_abs(&self) -> f64 {
        self.moments.iter().map(|&x| x.abs()).fold(0.0, f64::max)
    }
}
