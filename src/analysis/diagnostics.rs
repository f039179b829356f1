//! Integral and per-cell diagnostics of a single field.

use crate::basis::MomentBasis;
use crate::mesh::Mesh1D;
use crate::solver::TransportField;

/// Total mass Σ u_0 dx.
pub fn total_density(field: &TransportField, mesh: &Mesh1D) -> f64 {
    field.density().iter().sum::<f64>() * mesh.dx
}

/// Total entropy Σ h dx of the most recent closure.
pub fn total_entropy(field: &TransportField, mesh: &Mesh1D) -> f64 {
    field.entropy.iter().sum::<f64>() * mesh.dx
}

/// Normalized realizability ratio of every cell.
///
/// Cells with non-positive density map to infinity.
pub fn realizability_map(field: &TransportField, basis: &MomentBasis) -> Vec<f64> {
    (0..field.n_cells)
        .map(|i| basis.realizability_ratio(field.cell(i)))
        .collect()
}

/// Snapshot of the scalar diagnostics of a field.
#[derive(Clone, Copy, Debug)]
pub struct FieldDiagnostics {
    /// Σ u_0 dx
    pub total_density: f64,
    /// Σ h dx
    pub total_entropy: f64,
    /// Smallest cell density
    pub min_density: f64,
    /// Largest realizability ratio
    pub max_realizability_ratio: f64,
    /// Cell attaining `max_realizability_ratio`
    pub worst_cell: usize,
}

impl FieldDiagnostics {
    pub fn compute(field: &TransportField, mesh: &Mesh1D, basis: &MomentBasis) -> Self {
        let (worst_cell, max_realizability_ratio) = realizability_map(field, basis)
            .into_iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, r)| {
                if r > best.1 { (i, r) } else { best }
            });
        Self {
            total_density: total_density(field, mesh),
            total_entropy: total_entropy(field, mesh),
            min_density: field.min_density(),
            max_realizability_ratio,
            worst_cell,
        }
    }
}
