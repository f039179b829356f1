//! 1D finite-volume grid.
//!
//! A uniform partition of [x_min, x_max] into cells of width dx. Cell i spans
//! [x_min + i dx, x_min + (i+1) dx]; face i is the left face of cell i.

use crate::error::{MnError, Result};

/// Boundary face identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryFace {
    /// Left boundary (x = x_min)
    Left,
    /// Right boundary (x = x_max)
    Right,
}

/// Uniform 1D cell grid.
#[derive(Clone, Debug)]
pub struct Mesh1D {
    /// Left endpoint of domain
    pub x_min: f64,
    /// Right endpoint of domain
    pub x_max: f64,
    /// Number of cells
    pub n_cells: usize,
    /// Cell width
    pub dx: f64,
    /// Whether the two domain ends are connected
    pub is_periodic: bool,
}

impl Mesh1D {
    /// Create a uniform grid of [x_min, x_max] with `n_cells` cells.
    pub fn uniform(x_min: f64, x_max: f64, n_cells: usize) -> Result<Self> {
        if n_cells == 0 {
            return Err(MnError::InvalidConfig("grid needs at least one cell".into()));
        }
        if !(x_max > x_min) || !x_min.is_finite() || !x_max.is_finite() {
            return Err(MnError::InvalidConfig(format!(
                "invalid domain [{}, {}]",
                x_min, x_max
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            n_cells,
            dx: (x_max - x_min) / n_cells as f64,
            is_periodic: false,
        })
    }

    /// Create a uniform grid whose two ends are connected.
    pub fn uniform_periodic(x_min: f64, x_max: f64, n_cells: usize) -> Result<Self> {
        let mut mesh = Self::uniform(x_min, x_max, n_cells)?;
        mesh.is_periodic = true;
        Ok(mesh)
    }

    /// Center of cell i.
    pub fn cell_center(&self, i: usize) -> f64 {
        self.x_min + (i as f64 + 0.5) * self.dx
    }

    /// All cell centers.
    pub fn cell_centers(&self) -> Vec<f64> {
        (0..self.n_cells).map(|i| self.cell_center(i)).collect()
    }

    /// (left, right) neighbours of cell i, wrapping for periodic grids.
    pub fn neighbors(&self, i: usize) -> (Option<usize>, Option<usize>) {
        let n = self.n_cells;
        let left = match (i, self.is_periodic) {
            (0, true) => Some(n - 1),
            (0, false) => None,
            _ => Some(i - 1),
        };
        let right = match (i + 1 == n, self.is_periodic) {
            (true, true) => Some(0),
            (true, false) => None,
            _ => Some(i + 1),
        };
        (left, right)
    }

    /// Boundary face touched by cell i, if any.
    pub fn boundary_face(&self, i: usize) -> Option<BoundaryFace> {
        if self.is_periodic {
            return None;
        }
        if i == 0 {
            Some(BoundaryFace::Left)
        } else if i + 1 == self.n_cells {
            Some(BoundaryFace::Right)
        } else {
            None
        }
    }

    /// Total domain length.
    pub fn length(&self) -> f64 {
        self.x_max - self.x_min
    }
}
