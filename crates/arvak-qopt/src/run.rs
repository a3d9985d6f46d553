//! Per-run bookkeeping shared by the drivers.
//!
//! A [`RunTracker`] lives on the stack of a single driver invocation. It
//! owns the best-so-far candidate and the counters that end up in
//! [`QuantumMetrics`](crate::solution::QuantumMetrics); nothing here is
//! shared between runs.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::problem::Assignment;
use crate::state::{Normalization, QuantumState};

/// An assignment with its energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Variable values.
    pub assignment: Assignment,
    /// Energy under the run's evaluator.
    pub energy: f64,
}

/// Why a driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The configured iteration / step / layer bound was reached.
    IterationsExhausted,
    /// Annealing temperature dropped below its floor.
    TemperatureFloor,
    /// The wall-clock budget ran out between iterations.
    Deadline,
}

/// Counters collected during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Completed iterations (annealing), optimizer steps (QAOA) or steps (walk).
    pub iterations_completed: usize,
    /// Assignments drawn from the statevector or classically.
    pub measurements: usize,
    /// Accepted candidates (annealing only).
    pub accepted: Option<usize>,
    /// Times the degenerate-state recovery path was taken.
    pub degenerate_recoveries: usize,
    /// Best energy after each checkpoint; non-increasing.
    pub energy_history: Vec<f64>,
    /// Temperature when annealing stopped.
    pub final_temperature: Option<f64>,
    /// Tuned QAOA parameters.
    pub optimized_parameters: Option<Vec<f64>>,
    /// Why the run stopped.
    pub termination: Termination,
}

/// Everything a driver hands to the solution assembler.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Best candidate found.
    pub best: Candidate,
    /// Final statevector.
    pub state: QuantumState,
    /// Run counters.
    pub stats: RunStats,
}

/// Wall-clock budget checked between iterations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn after(limit: Option<Duration>) -> Self {
        Self(limit.and_then(|l| Instant::now().checked_add(l)))
    }

    pub(crate) fn expired(&self) -> bool {
        self.0.is_some_and(|d| Instant::now() >= d)
    }
}

/// Best-so-far tracking plus counters.
pub(crate) struct RunTracker {
    best: Candidate,
    stats: RunStats,
}

impl RunTracker {
    /// Start from an initial candidate (counts as one measurement).
    pub(crate) fn new(initial: Candidate) -> Self {
        let stats = RunStats {
            iterations_completed: 0,
            measurements: 1,
            accepted: None,
            degenerate_recoveries: 0,
            energy_history: Vec::new(),
            final_temperature: None,
            optimized_parameters: None,
            termination: Termination::IterationsExhausted,
        };
        Self {
            best: initial,
            stats,
        }
    }

    pub(crate) fn best_energy(&self) -> f64 {
        self.best.energy
    }

    /// Offer a freshly measured candidate; keeps it if strictly better.
    pub(crate) fn offer(&mut self, assignment: Assignment, energy: f64) -> bool {
        self.stats.measurements += 1;
        if energy < self.best.energy {
            self.best = Candidate { assignment, energy };
            true
        } else {
            false
        }
    }

    /// Count measurements drawn outside [`offer`](Self::offer).
    pub(crate) fn add_measurements(&mut self, n: usize) {
        self.stats.measurements += n;
    }

    /// Record the outcome of an operator application.
    pub(crate) fn note(&mut self, outcome: Normalization) {
        if outcome.recovered() {
            self.stats.degenerate_recoveries += 1;
        }
    }

    /// Record the best energy at a checkpoint.
    pub(crate) fn checkpoint(&mut self) {
        self.stats.energy_history.push(self.best.energy);
    }

    pub(crate) fn complete_iteration(&mut self) {
        self.stats.iterations_completed += 1;
    }

    pub(crate) fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    /// Stop early on an expired deadline.
    pub(crate) fn deadline_hit(&mut self, deadline: &Deadline) -> bool {
        if deadline.expired() {
            warn!(
                iterations = self.stats.iterations_completed,
                "time limit reached, returning best-so-far"
            );
            self.stats.termination = Termination::Deadline;
            true
        } else {
            false
        }
    }

    pub(crate) fn finish(self, state: QuantumState) -> RunOutcome {
        RunOutcome {
            best: self.best,
            state,
            stats: self.stats,
        }
    }
}
