//! Simulation runner implementation.
//!
//! Drives one or more independent transport runs ("lanes") with a shared solver.
//! Each lane owns its field and its closure provider, so two closure strategies
//! can be compared side by side on identical initial data.

use std::time::Instant;

use crate::closure::ClosureProvider;
use crate::error::{MnError, Result};
use crate::solver::{MNSolver1D, StepReport, TransportField};

// =============================================================================
// Simulation Configuration
// =============================================================================

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Call the observer every this many steps (1 = every step).
    pub callback_interval: usize,
    /// Log progress at info level every this many steps (0 = never).
    pub progress_interval: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            callback_interval: 1,
            progress_interval: 0,
        }
    }
}

// =============================================================================
// Per-step record
// =============================================================================

/// What the observer sees after each step of each lane.
///
/// The field holds the per-cell moments after the update together with the
/// multipliers and entropies the step's closure produced.
#[derive(Debug)]
pub struct StepRecord<'a> {
    /// Lane index.
    pub lane: usize,
    /// Lane label.
    pub label: &'a str,
    /// Field after the step.
    pub field: &'a TransportField,
    /// Summary of the step.
    pub report: &'a StepReport,
}

// =============================================================================
// Simulation Result
// =============================================================================

/// Aggregated statistics of one lane.
#[derive(Clone, Debug, Default)]
pub struct LaneSummary {
    /// Lane label.
    pub label: String,
    /// Largest Newton iteration count over all steps and cells.
    pub max_iterations: usize,
    /// Number of (step, cell) pairs whose closure kept a previous multiplier.
    pub retained_cells: usize,
    /// Smallest density seen after any step.
    pub min_density: f64,
}

/// Result of a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Final simulation time reached.
    pub final_time: f64,
    /// Total number of time steps taken.
    pub n_steps: usize,
    /// Total wall-clock time in seconds.
    pub wall_time: f64,
    /// Whether the simulation completed successfully.
    pub success: bool,
    /// The error that stopped the run, with step and cell attached.
    pub error: Option<MnError>,
    /// Label of the lane that failed.
    pub failed_lane: Option<String>,
    /// Per-lane statistics.
    pub lanes: Vec<LaneSummary>,
}

impl SimulationResult {
    /// Create a successful result.
    pub fn success(final_time: f64, n_steps: usize, wall_time: f64, lanes: Vec<LaneSummary>) -> Self {
        Self {
            final_time,
            n_steps,
            wall_time,
            success: true,
            error: None,
            failed_lane: None,
            lanes,
        }
    }

    /// Create a failed result.
    pub fn failure(
        final_time: f64,
        n_steps: usize,
        wall_time: f64,
        lanes: Vec<LaneSummary>,
        failed_lane: String,
        error: MnError,
    ) -> Self {
        Self {
            final_time,
            n_steps,
            wall_time,
            success: false,
            error: Some(error),
            failed_lane: Some(failed_lane),
            lanes,
        }
    }
}

// =============================================================================
// Simulation Runner
// =============================================================================

struct Lane {
    label: String,
    field: TransportField,
    closure: Box<dyn ClosureProvider>,
    summary: LaneSummary,
}

/// High-level simulation runner.
///
/// Steps every lane once per time step, in insertion order, until
/// `max_iter` steps have run or the time reaches `t_end`.
pub struct Simulation {
    solver: MNSolver1D,
    lanes: Vec<Lane>,
    config: SimulationConfig,
}

impl Simulation {
    /// Create a simulation without lanes.
    pub fn new(solver: MNSolver1D) -> Self {
        Self {
            solver,
            lanes: Vec::new(),
            config: SimulationConfig::default(),
        }
    }

    /// Add a lane: a field advanced with its own closure provider.
    pub fn add_lane(
        &mut self,
        label: impl Into<String>,
        field: TransportField,
        closure: Box<dyn ClosureProvider>,
    ) -> Result<()> {
        let n = self.solver.basis().size();
        if field.n_system != n {
            return Err(MnError::size_mismatch("lane field moment vectors", n, field.n_system));
        }
        if field.n_cells != self.solver.mesh().n_cells {
            return Err(MnError::size_mismatch(
                "lane field cells",
                self.solver.mesh().n_cells,
                field.n_cells,
            ));
        }
        if closure.basis_size() != n {
            return Err(MnError::size_mismatch("lane closure basis", n, closure.basis_size()));
        }
        let label = label.into();
        self.lanes.push(Lane {
            summary: LaneSummary {
                label: label.clone(),
                min_density: f64::INFINITY,
                ..Default::default()
            },
            label,
            field,
            closure,
        });
        Ok(())
    }

    /// Builder form of [`Simulation::add_lane`].
    pub fn with_lane(
        mut self,
        label: impl Into<String>,
        field: TransportField,
        closure: Box<dyn ClosureProvider>,
    ) -> Result<Self> {
        self.add_lane(label, field, closure)?;
        Ok(self)
    }

    /// Set the observer interval in steps.
    pub fn with_callback_interval(mut self, interval: usize) -> Self {
        self.config.callback_interval = interval.max(1);
        self
    }

    /// Log progress every `interval` steps.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.config.progress_interval = interval;
        self
    }

    pub fn solver(&self) -> &MNSolver1D {
        &self.solver
    }

    pub fn n_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Field of lane `lane`.
    pub fn field(&self, lane: usize) -> Option<&TransportField> {
        self.lanes.get(lane).map(|l| &l.field)
    }

    /// Field of the lane with the given label.
    pub fn field_by_label(&self, label: &str) -> Option<&TransportField> {
        self.lanes.iter().find(|l| l.label == label).map(|l| &l.field)
    }

    /// Run to completion without an observer.
    pub fn run(&mut self) -> SimulationResult {
        self.run_with_callback(|_| {})
    }

    /// Run to completion, calling `callback` after each lane step.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> SimulationResult
    where
        F: FnMut(&StepRecord<'_>),
    {
        let start_wall = Instant::now();
        let dt = self.solver.dt();
        let summaries =
            |lanes: &[Lane]| -> Vec<LaneSummary> { lanes.iter().map(|l| l.summary.clone()).collect() };

        log::info!(
            "starting simulation: {} lane(s), {} cells, dt = {:.3e}, t_end = {}, max_iter = {}",
            self.lanes.len(),
            self.solver.mesh().n_cells,
            dt,
            self.solver.config().t_end,
            self.solver.config().max_iter
        );

        let mut n_steps = 0;
        while self.solver.should_continue(n_steps) {
            for (index, lane) in self.lanes.iter_mut().enumerate() {
                let report = match self.solver.step(&mut lane.field, lane.closure.as_ref(), n_steps) {
                    Ok(report) => report,
                    Err(err) => {
                        log::warn!("lane '{}' failed: {}", lane.label, err);
                        let failed = lane.label.clone();
                        return SimulationResult::failure(
                            n_steps as f64 * dt,
                            n_steps,
                            start_wall.elapsed().as_secs_f64(),
                            summaries(&self.lanes),
                            failed,
                            err,
                        );
                    }
                };

                lane.summary.max_iterations = lane.summary.max_iterations.max(report.max_iterations);
                lane.summary.retained_cells += report.failed_cells.len();
                lane.summary.min_density = lane.summary.min_density.min(report.min_density);

                if n_steps % self.config.callback_interval == 0 {
                    callback(&StepRecord {
                        lane: index,
                        label: &lane.label,
                        field: &lane.field,
                        report: &report,
                    });
                }
            }
            n_steps += 1;

            if self.config.progress_interval > 0 && n_steps % self.config.progress_interval == 0 {
                log::info!("step {}: t = {:.4}", n_steps, n_steps as f64 * dt);
            }
        }

        let wall_time = start_wall.elapsed().as_secs_f64();
        log::info!(
            "simulation complete: {} steps, t = {:.4}, wall time {:.2}s",
            n_steps,
            n_steps as f64 * dt,
            wall_time
        );
        SimulationResult::success(n_steps as f64 * dt, n_steps, wall_time, summaries(&self.lanes))
    }
}
