//! Error types for closure construction, dual optimization and transport stepping.

use thiserror::Error;

use crate::basis::BasisKind;

/// Errors raised by the closure and transport machinery.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MnError {
    /// The requested basis kind has no construction in this dimension.
    #[error("unsupported basis: {kind} in spatial dimension {dimension}")]
    UnsupportedBasis { dimension: usize, kind: BasisKind },

    /// The basis kind exists for this dimension, but not at this degree.
    #[error("unsupported degree {degree} for {kind} basis in spatial dimension {dimension}")]
    UnsupportedDegree {
        dimension: usize,
        kind: BasisKind,
        degree: usize,
    },

    /// Spatial dimension outside 1..=3.
    #[error("invalid spatial dimension {0}, expected 1, 2 or 3")]
    InvalidDimension(usize),

    /// Two collaborating objects disagree on a size.
    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The density component of a moment vector is zero, negative or not finite.
    #[error("degenerate moment vector: density u[0] = {density:e}, u = {moments:?}")]
    DegenerateMoment { density: f64, moments: Vec<f64> },

    /// The dual solver did not reach the gradient tolerance.
    #[error(
        "dual optimization did not converge after {iterations} iterations \
         (|grad J| = {gradient_norm:.3e}), u = {moments:?}"
    )]
    OptimizationDivergence {
        iterations: usize,
        gradient_norm: f64,
        moments: Vec<f64>,
    },

    /// A per-cell failure, tagged with the cell index.
    #[error("cell {cell}: {source}")]
    InCell {
        cell: usize,
        #[source]
        source: Box<MnError>,
    },

    /// A failure during a transport step, tagged with the step index.
    #[error("time step {step}: {source}")]
    AtStep {
        step: usize,
        #[source]
        source: Box<MnError>,
    },
}

impl MnError {
    /// Create a size mismatch error.
    pub fn size_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Attach a cell index.
    pub fn in_cell(self, cell: usize) -> Self {
        Self::InCell {
            cell,
            source: Box::new(self),
        }
    }

    /// Attach a time step index.
    pub fn at_step(self, step: usize) -> Self {
        Self::AtStep {
            step,
            source: Box::new(self),
        }
    }

    /// Cell index of the failure, if one was attached.
    pub fn cell(&self) -> Option<usize> {
        match self {
            Self::InCell { cell, .. } => Some(*cell),
            Self::AtStep { source, .. } => source.cell(),
            _ => None,
        }
    }

    /// Time step of the failure, if one was attached.
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::AtStep { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The innermost error, with cell/step tags removed.
    pub fn root(&self) -> &MnError {
        match self {
            Self::InCell { source, .. } | Self::AtStep { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for configuration errors, which are raised before any stepping.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.root(),
            Self::UnsupportedBasis { .. }
                | Self::UnsupportedDegree { .. }
                | Self::InvalidDimension(_)
                | Self::SizeMismatch { .. }
                | Self::InvalidConfig(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MnError>;
