//! Comparison of two fields on the same mesh.
//!
//! Used to measure how far a surrogate closure drifts from the Newton
//! reference when both are advanced from the same initial data.

use crate::error::{MnError, Result};
use crate::solver::TransportField;

/// Per-cell L2 distance between the moment vectors of two fields.
pub fn field_difference(a: &TransportField, b: &TransportField) -> Result<Vec<f64>> {
    check_shapes(a, b)?;
    Ok(a.moments
        .chunks_exact(a.n_system)
        .zip(b.moments.chunks_exact(b.n_system))
        .map(|(ua, ub)| ua.iter().zip(ub).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt())
        .collect())
}

fn check_shapes(a: &TransportField, b: &TransportField) -> Result<()> {
    if a.n_system != b.n_system {
        return Err(MnError::size_mismatch("compared moment vectors", a.n_system, b.n_system));
    }
    if a.n_cells != b.n_cells {
        return Err(MnError::size_mismatch("compared cells", a.n_cells, b.n_cells));
    }
    Ok(())
}

/// Summary of the per-cell differences between two fields.
#[derive(Clone, Debug)]
pub struct FieldComparison {
    /// ‖u_a - u_b‖ per cell
    pub moment_error: Vec<f64>,
    /// |h_a - h_b| per cell
    pub entropy_error: Vec<f64>,
    /// Largest per-cell moment error
    pub max_error: f64,
    /// Cell attaining `max_error`
    pub max_error_cell: usize,
    /// Root mean square of the per-cell moment error
    pub rms_error: f64,
}

impl FieldComparison {
    /// Compare field `a` against reference `b`.
    pub fn compute(a: &TransportField, b: &TransportField) -> Result<Self> {
        let moment_error = field_difference(a, b)?;
        let entropy_error = a
            .entropy
            .iter()
            .zip(&b.entropy)
            .map(|(x, y)| (x - y).abs())
            .collect();

        let (max_error_cell, max_error) = moment_error
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0), |best, (i, e)| if e > best.1 { (i, e) } else { best });
        let n = moment_error.len().max(1) as f64;
        let rms_error = (moment_error.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

        Ok(Self {
            moment_error,
            entropy_error,
            max_error,
            max_error_cell,
            rms_error,
        })
    }
}
