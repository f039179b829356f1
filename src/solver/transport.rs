//! Explicit finite-volume stepping of the 1D moment system.
//!
//! One step of a field:
//! 1. closure: multipliers and entropies of every cell from the closure provider
//! 2. fluxes: kinetic upwind flux through every face
//! 3. update: u_i += dt/dx (F_i - F_{i+1}), boundary cells pinned for Dirichlet
//! 4. scattering: u_i += dt σ_s (s u_0,i - u_i) in every cell
//!
//! Face i is the left face of cell i. The flux step reads the complete
//! multiplier field of the current step, so it starts only after the closure
//! of all cells has finished.

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::basis::MomentBasis;
use crate::closure::ClosureProvider;
use crate::error::{MnError, Result};
use crate::flux::kinetic_upwind_flux_into;
use crate::mesh::{BoundaryFace, Mesh1D};
use crate::quadrature::QuadratureRule;

use super::field::TransportField;
use super::initial::InitialCondition;
use super::scattering::{apply_scattering, scatter_vector};

/// Treatment of the two ends of the domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryMode {
    /// The last cell neighbours the first.
    Periodic,
    /// The first and last cells are reset every step to isotropic states of the
    /// given densities.
    Dirichlet {
        left_density: f64,
        right_density: f64,
    },
}

impl BoundaryMode {
    /// Inflow of density 1 from the left into a near-vacuum of density 0.01.
    pub fn default_dirichlet() -> Self {
        Self::Dirichlet {
            left_density: 1.0,
            right_density: 0.01,
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic)
    }
}

/// Transport run parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportConfig {
    /// Left end of the domain.
    pub x0: f64,
    /// Right end of the domain.
    pub x1: f64,
    /// Number of cells.
    pub nx: usize,
    /// dt = cfl · dx. Values >= 1 are accepted but unstable.
    pub cfl: f64,
    /// Final time.
    pub t_end: f64,
    /// Maximum number of steps.
    pub max_iter: usize,
    /// Scattering cross section σ_s.
    pub sigma_s: f64,
    /// Boundary treatment.
    pub boundary: BoundaryMode,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            x0: -1.5,
            x1: 1.5,
            nx: 150,
            cfl: 0.3,
            t_end: 1.0,
            max_iter: 100,
            sigma_s: 1.0,
            boundary: BoundaryMode::Periodic,
        }
    }
}

impl TransportConfig {
    /// Set the slab bounds.
    pub fn with_domain(mut self, x0: f64, x1: f64) -> Self {
        self.x0 = x0;
        self.x1 = x1;
        self
    }

    /// Set the number of cells.
    pub fn with_cells(mut self, nx: usize) -> Self {
        self.nx = nx;
        self
    }

    /// Set the CFL number.
    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Set the final time.
    pub fn with_t_end(mut self, t_end: f64) -> Self {
        self.t_end = t_end;
        self
    }

    /// Set the step budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the scattering cross section.
    pub fn with_sigma_s(mut self, sigma_s: f64) -> Self {
        self.sigma_s = sigma_s;
        self
    }

    /// Set the boundary treatment.
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Reject non-positive CFL or final time and inconsistent boundary settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.cfl > 0.0) || !self.cfl.is_finite() {
            return Err(MnError::InvalidConfig(format!("cfl must be positive, got {}", self.cfl)));
        }
        if !(self.sigma_s >= 0.0) || !self.sigma_s.is_finite() {
            return Err(MnError::InvalidConfig(format!(
                "scattering cross section must be non-negative, got {}",
                self.sigma_s
            )));
        }
        if !(self.t_end > 0.0) {
            return Err(MnError::InvalidConfig(format!(
                "final time must be positive, got {}",
                self.t_end
            )));
        }
        if let BoundaryMode::Dirichlet {
            left_density,
            right_density,
        } = self.boundary
        {
            if !(left_density > 0.0 && right_density > 0.0) {
                return Err(MnError::InvalidConfig(
                    "Dirichlet boundary densities must be positive".into(),
                ));
            }
            if self.nx < 2 {
                return Err(MnError::InvalidConfig(
                    "Dirichlet boundaries need at least two cells".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Summary of one step of one field.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// Step index, starting at 0.
    pub step: usize,
    /// Time after the step.
    pub time: f64,
    /// Largest per-cell Newton iteration count of the closure.
    pub max_iterations: usize,
    /// Cells whose closure kept a previous multiplier.
    pub failed_cells: Vec<usize>,
    /// Cells with moments near the realizability boundary.
    pub near_boundary_cells: Vec<usize>,
    /// Smallest density after the update.
    pub min_density: f64,
}

impl StepReport {
    /// True if the closure converged in every cell.
    pub fn success(&self) -> bool {
        self.failed_cells.is_empty()
    }
}

/// Kinetic flux through every face. Face i lies between cell i-1 and cell i;
/// face 0 wraps to the last cell on periodic grids and sees cell 0 on both
/// sides otherwise.
pub fn compute_face_fluxes(
    alpha: &[f64],
    mesh: &Mesh1D,
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
) -> Vec<f64> {
    let n = basis.size();
    let mut fluxes = vec![0.0; mesh.n_cells * n];
    for (i, face) in fluxes.chunks_exact_mut(n).enumerate() {
        let left = mesh.neighbors(i).0.unwrap_or(i);
        kinetic_upwind_flux_into(
            &alpha[left * n..(left + 1) * n],
            &alpha[i * n..(i + 1) * n],
            basis,
            quadrature,
            face,
        );
    }
    fluxes
}

/// Parallel version of [`compute_face_fluxes`].
///
/// Faces are independent once the multiplier field is complete.
#[cfg(feature = "parallel")]
pub fn compute_face_fluxes_parallel(
    alpha: &[f64],
    mesh: &Mesh1D,
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
) -> Vec<f64> {
    let n = basis.size();
    let mut fluxes = vec![0.0; mesh.n_cells * n];
    fluxes
        .par_chunks_exact_mut(n)
        .enumerate()
        .for_each(|(i, face)| {
            let left = mesh.neighbors(i).0.unwrap_or(i);
            kinetic_upwind_flux_into(
                &alpha[left * n..(left + 1) * n],
                &alpha[i * n..(i + 1) * n],
                basis,
                quadrature,
                face,
            );
        });
    fluxes
}

/// 1D finite-volume solver for the moment system.
///
/// The solver holds no field state; the same solver steps any number of
/// independent fields, each with its own closure provider.
#[derive(Clone, Debug)]
pub struct MNSolver1D {
    config: TransportConfig,
    mesh: Mesh1D,
    quadrature: Arc<QuadratureRule>,
    basis: Arc<MomentBasis>,
    scatter: Vec<f64>,
    boundary_states: Option<(Vec<f64>, Vec<f64>)>,
    dt: f64,
}

impl MNSolver1D {
    /// Create a solver for a 1D basis.
    pub fn new(
        config: TransportConfig,
        quadrature: Arc<QuadratureRule>,
        basis: Arc<MomentBasis>,
    ) -> Result<Self> {
        config.validate()?;
        if basis.dimension() != 1 {
            return Err(MnError::InvalidConfig(format!(
                "the transport solver is one-dimensional, got a basis in dimension {}",
                basis.dimension()
            )));
        }
        basis.check_compatible(&quadrature)?;

        let mesh = match config.boundary {
            BoundaryMode::Periodic => Mesh1D::uniform_periodic(config.x0, config.x1, config.nx)?,
            BoundaryMode::Dirichlet { .. } => Mesh1D::uniform(config.x0, config.x1, config.nx)?,
        };
        let boundary_states = match config.boundary {
            BoundaryMode::Periodic => None,
            BoundaryMode::Dirichlet {
                left_density,
                right_density,
            } => Some((
                basis.isotropic_moments(&quadrature, left_density),
                basis.isotropic_moments(&quadrature, right_density),
            )),
        };
        if config.cfl >= 1.0 {
            log::warn!("cfl = {} >= 1, the explicit update is unstable", config.cfl);
        }

        let dt = config.cfl * mesh.dx;
        let scatter = scatter_vector(&basis, &quadrature);
        Ok(Self {
            config,
            mesh,
            quadrature,
            basis,
            scatter,
            boundary_states,
            dt,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn mesh(&self) -> &Mesh1D {
        &self.mesh
    }

    pub fn basis(&self) -> &MomentBasis {
        &self.basis
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.quadrature
    }

    pub fn scatter(&self) -> &[f64] {
        &self.scatter
    }

    /// Time step cfl · dx.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// True while step `step` should still run: step < max_iter and step·dt < t_end.
    pub fn should_continue(&self, step: usize) -> bool {
        step < self.config.max_iter && (step as f64) * self.dt < self.config.t_end
    }

    /// Build the initial field for a condition.
    pub fn initial_field(&self, ic: InitialCondition) -> Result<TransportField> {
        ic.build(&self.mesh, &self.basis, &self.quadrature)
    }

    fn check_field(&self, field: &TransportField) -> Result<()> {
        if field.n_system != self.basis.size() {
            return Err(MnError::size_mismatch("field moment vectors", self.basis.size(), field.n_system));
        }
        if field.n_cells != self.mesh.n_cells {
            return Err(MnError::size_mismatch("field cells", self.mesh.n_cells, field.n_cells));
        }
        Ok(())
    }

    /// Kinetic flux through every face for the current multipliers of `field`.
    pub fn face_fluxes(&self, field: &TransportField) -> Vec<f64> {
        #[cfg(feature = "parallel")]
        {
            compute_face_fluxes_parallel(&field.alpha, &self.mesh, &self.basis, &self.quadrature)
        }
        #[cfg(not(feature = "parallel"))]
        {
            compute_face_fluxes(&field.alpha, &self.mesh, &self.basis, &self.quadrature)
        }
    }

    /// Conservative update from precomputed face fluxes, then scattering.
    pub fn update(&self, field: &mut TransportField, fluxes: &[f64]) {
        let n = field.n_system;
        let nx = field.n_cells;
        let ratio = self.dt / self.mesh.dx;

        for i in 0..nx {
            let pinned = match (&self.boundary_states, self.mesh.boundary_face(i)) {
                (Some((left, _)), Some(BoundaryFace::Left)) => Some(left),
                (Some((_, right)), Some(BoundaryFace::Right)) => Some(right),
                _ => None,
            };
            match pinned {
                Some(state) => field.cell_mut(i).copy_from_slice(state),
                None => {
                    let ip1 = (i + 1) % nx;
                    let (f_in, f_out) = (&fluxes[i * n..(i + 1) * n], &fluxes[ip1 * n..(ip1 + 1) * n]);
                    for (k, u) in field.cell_mut(i).iter_mut().enumerate() {
                        *u += ratio * (f_in[k] - f_out[k]);
                    }
                }
            }
        }

        apply_scattering(field, &self.scatter, self.dt, self.config.sigma_s);
    }

    /// Advance `field` by one step using `closure`.
    ///
    /// Every failure is tagged with the step index; closure failures also carry
    /// the cell index.
    pub fn step(
        &self,
        field: &mut TransportField,
        closure: &dyn ClosureProvider,
        step: usize,
    ) -> Result<StepReport> {
        self.check_field(field).map_err(|e| e.at_step(step))?;
        if closure.basis_size() != field.n_system {
            return Err(
                MnError::size_mismatch("closure basis", field.n_system, closure.basis_size())
                    .at_step(step),
            );
        }

        let batch = closure
            .compute_closure(&field.moments, Some(&field.alpha))
            .map_err(|e| e.at_step(step))?;
        field.apply_closure(&batch).map_err(|e| e.at_step(step))?;

        let fluxes = self.face_fluxes(field);
        self.update(field, &fluxes);

        let report = StepReport {
            step,
            time: (step + 1) as f64 * self.dt,
            max_iterations: batch.max_iterations,
            failed_cells: batch.failed_cells,
            near_boundary_cells: batch.near_boundary_cells,
            min_density: field.min_density(),
        };
        log::debug!(
            "{} step {}: t = {:.4}, max Newton iterations {}, min density {:.3e}",
            closure.name(),
            step,
            report.time,
            report.max_iterations,
            report.min_density
        );
        Ok(report)
    }
}
