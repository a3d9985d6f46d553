//! The solution record handed back to the caller.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Algorithm;
use crate::evaluator::{Evaluator, ObjectiveScorer};
use crate::problem::Assignment;
use crate::run::{RunOutcome, Termination};

/// Result of one optimisation run. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumOptimizationSolution {
    /// Unique solution id (UUID v4).
    pub id: String,
    pub problem_id: String,
    pub algorithm: Algorithm,
    pub solution: SolutionBody,
    pub quantum_metrics: QuantumMetrics,
    /// When the solution was assembled.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock time of the driver run in milliseconds.
    pub computation_time_ms: f64,
}

/// The assignment and its evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionBody {
    pub variables: Assignment,
    /// Each objective re-evaluated on `variables`, keyed by objective id.
    pub objective_values: BTreeMap<String, f64>,
    /// Negated energy: higher is better.
    pub overall_score: f64,
    /// Every constraint has zero violation.
    pub feasible: bool,
    pub confidence: f64,
}

/// Figures measured during the run.
///
/// Everything here is computed from the run itself. Nothing is a
/// physical claim about a quantum device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumMetrics {
    /// Statevector length.
    pub dimensions: usize,
    /// Final probability per slot.
    pub measurement_distribution: Vec<f64>,
    /// L2 norm of the final statevector (1 up to rounding).
    pub final_norm: f64,
    pub iterations_completed: usize,
    /// Assignments drawn, including the initial sample.
    pub measurements: usize,
    /// Accepted / completed iterations (annealing only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,
    pub degenerate_recoveries: usize,
    pub best_energy: f64,
    /// Best energy at each checkpoint; non-increasing.
    pub energy_history: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_parameters: Option<Vec<f64>>,
    pub termination: Termination,
}

impl QuantumOptimizationSolution {
    /// Assemble the record for a finished run.
    ///
    /// The objectives are re-evaluated on the best assignment, so
    /// `objective_values` and `feasible` always agree with the evaluator.
    pub fn assemble<S: ObjectiveScorer + ?Sized>(
        algorithm: Algorithm,
        evaluator: &Evaluator<'_, S>,
        outcome: RunOutcome,
        confidence: f64,
        elapsed: Duration,
    ) -> Self {
        let RunOutcome { best, state, stats } = outcome;
        let problem = evaluator.problem();

        let acceptance_rate = stats.accepted.map(|accepted| {
            if stats.iterations_completed == 0 {
                0.0
            } else {
                accepted as f64 / stats.iterations_completed as f64
            }
        });

        let quantum_metrics = QuantumMetrics {
            dimensions: state.dimensions(),
            measurement_distribution: state.probabilities().to_vec(),
            final_norm: state.total_probability().sqrt(),
            iterations_completed: stats.iterations_completed,
            measurements: stats.measurements,
            acceptance_rate,
            degenerate_recoveries: stats.degenerate_recoveries,
            best_energy: best.energy,
            energy_history: stats.energy_history,
            final_temperature: stats.final_temperature,
            optimized_parameters: stats.optimized_parameters,
            termination: stats.termination,
        };

        let solution = SolutionBody {
            objective_values: evaluator.objective_values(&best.assignment),
            overall_score: -best.energy,
            feasible: evaluator.is_feasible(&best.assignment),
            confidence,
            variables: best.assignment,
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            problem_id: problem.id.clone(),
            algorithm,
            solution,
            quantum_metrics,
            timestamp: Utc::now(),
            computation_time_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Energy of the returned assignment.
    pub fn energy(&self) -> f64 {
        -self.solution.overall_score
    }
}
