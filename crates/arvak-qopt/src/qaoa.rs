//! QAOA analogue.
//!
//! A circuit of `p` layers, each applying the problem-phase operator with
//! `γ_l = θ[2l]` followed by the mixer with `β_l = θ[2l+1]`. The driver:
//!
//! 1. runs the circuit once with the initial parameters, measuring after
//!    every layer and keeping the best assignment;
//! 2. tunes `θ` with [`VariationalOptimizer`], where each cost evaluation
//!    is a fresh short circuit measured once at the end;
//! 3. re-runs the circuit with the tuned parameters on a fresh state and
//!    keeps whichever assignment has the lower energy.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::config::{AlgorithmConfig, NoiseConfig};
use crate::error::{QoptError, QoptResult};
use crate::evaluator::{Evaluator, ObjectiveScorer};
use crate::operators;
use crate::problem::OptimizationProblem;
use crate::run::{Candidate, Deadline, RunOutcome, RunTracker};
use crate::sampler::measure;
use crate::state::{Normalization, QuantumState, resolve_dimensions};
use crate::variational::VariationalOptimizer;

/// QAOA driver.
#[derive(Debug, Clone)]
pub struct QaoaSolver {
    depth: usize,
    initial_params: Vec<f64>,
    optimizer: VariationalOptimizer,
    dimensions: Option<usize>,
    noise: Option<NoiseConfig>,
    time_limit: Option<Duration>,
}

impl QaoaSolver {
    /// Construct a solver with `depth` layers and the given initial
    /// parameters `[γ₀, β₀, γ₁, β₁, …]`.
    pub fn new(depth: usize, initial_params: Vec<f64>) -> QoptResult<Self> {
        if depth == 0 {
            return Err(QoptError::out_of_range(
                "circuit_depth",
                depth,
                "must be at least 1",
            ));
        }
        if initial_params.len() != 2 * depth {
            return Err(QoptError::out_of_range(
                "variational_parameters",
                initial_params.len(),
                "length must equal 2 * circuit_depth",
            ));
        }
        Ok(Self {
            depth,
            initial_params,
            optimizer: VariationalOptimizer::new(),
            dimensions: None,
            noise: None,
            time_limit: None,
        })
    }

    /// Construct from a validated configuration.
    pub fn from_config(config: &AlgorithmConfig) -> QoptResult<Self> {
        config.validate()?;
        let mut solver = Self::new(config.circuit_depth(), config.variational_parameters())?;
        solver.optimizer = solver
            .optimizer
            .with_iterations(config.parameters.iterations);
        solver.dimensions = config.parameters.dimensions;
        solver.noise = config.parameters.noise;
        solver.time_limit = config.time_limit();
        Ok(solver)
    }

    /// Replace the variational optimizer.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: VariationalOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Override the statevector dimension.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Enable the noise model.
    #[must_use]
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Set a wall-clock budget.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Apply every layer of the circuit parameterised by `params` to
    /// `state`. Returns the number of degenerate-state recoveries.
    ///
    /// `params` must hold `2 * depth` values, `[γ₀, β₀, γ₁, β₁, …]`.
    pub fn apply_circuit<R: Rng + ?Sized>(
        &self,
        state: &mut QuantumState,
        problem: &OptimizationProblem,
        params: &[f64],
        rng: &mut R,
    ) -> QoptResult<usize> {
        if params.len() != 2 * self.depth {
            return Err(QoptError::out_of_range(
                "variational_parameters",
                params.len(),
                "length must equal 2 * circuit_depth",
            ));
        }
        Ok((0..self.depth)
            .map(|layer| self.apply_layer(state, problem, params, layer, rng))
            .sum())
    }

    /// Layer `layer` of the circuit; `params` holds at least `2 * (layer + 1)`
    /// values.
    fn apply_layer<R: Rng + ?Sized>(
        &self,
        state: &mut QuantumState,
        problem: &OptimizationProblem,
        params: &[f64],
        layer: usize,
        rng: &mut R,
    ) -> usize {
        let gamma = params[2 * layer];
        let beta = params[2 * layer + 1];
        let mut recoveries = 0;
        if operators::problem_phase(state, &problem.objectives, gamma).recovered() {
            recoveries += 1;
        }
        if operators::mixer(state, beta).recovered() {
            recoveries += 1;
        }
        if let Some(noise) = &self.noise {
            if operators::noise(state, noise, rng).recovered() {
                recoveries += 1;
            }
        }
        recoveries
    }

    /// Run the solver using the given scorer and random number generator.
    pub fn run_with_rng<S, R>(
        &self,
        problem: &OptimizationProblem,
        scorer: &S,
        rng: &mut R,
    ) -> QoptResult<RunOutcome>
    where
        S: ObjectiveScorer + ?Sized,
        R: Rng + ?Sized,
    {
        problem.validate()?;
        let dims = resolve_dimensions(self.dimensions, problem.variables.len());
        let mut state = QuantumState::uniform(dims)?;
        let eval = Evaluator::new(problem, scorer);
        let deadline = Deadline::after(self.time_limit);

        let initial = measure(&state, problem, rng);
        let energy = eval.energy(&initial);
        let mut tracker = RunTracker::new(Candidate {
            assignment: initial,
            energy,
        });

        info!(
            problem = %problem.id,
            dims,
            depth = self.depth,
            steps = self.optimizer.iterations,
            "starting QAOA"
        );

        // Fixed-parameter pass.
        self.run_circuit(&mut state, problem, &eval, &self.initial_params, rng, &mut tracker);
        debug!(best_energy = tracker.best_energy(), "initial circuit pass done");
        if tracker.deadline_hit(&deadline) {
            tracker.stats_mut().optimized_parameters = Some(self.initial_params.clone());
            return Ok(tracker.finish(state));
        }

        // Variational tuning. Each evaluation is an independent short circuit.
        let mut recoveries = 0usize;
        let result = self.optimizer.minimize_until(
            |theta: &[f64]| {
                let Ok(mut trial) = QuantumState::uniform(dims) else {
                    return f64::INFINITY;
                };
                match self.apply_circuit(&mut trial, problem, theta, rng) {
                    Ok(n) => recoveries += n,
                    Err(_) => return f64::INFINITY,
                }
                eval.energy(&measure(&trial, problem, rng))
            },
            self.initial_params.clone(),
            || deadline.expired(),
        );
        tracker.add_measurements(result.num_evaluations);
        for _ in 0..recoveries {
            tracker.note(Normalization::Recovered);
        }
        tracker.stats_mut().iterations_completed = result.num_iterations;
        debug!(
            steps = result.num_iterations,
            evaluations = result.num_evaluations,
            params = ?result.optimal_params,
            "variational tuning done"
        );

        if tracker.deadline_hit(&deadline) {
            tracker.stats_mut().optimized_parameters = Some(result.optimal_params);
            return Ok(tracker.finish(state));
        }

        // Final pass with the tuned parameters on a fresh state.
        let mut tuned = QuantumState::uniform(dims)?;
        self.run_circuit(&mut tuned, problem, &eval, &result.optimal_params, rng, &mut tracker);
        tracker.stats_mut().optimized_parameters = Some(result.optimal_params);

        info!(best_energy = tracker.best_energy(), "QAOA finished");
        Ok(tracker.finish(tuned))
    }

    fn run_circuit<S, R>(
        &self,
        state: &mut QuantumState,
        problem: &OptimizationProblem,
        eval: &Evaluator<'_, S>,
        params: &[f64],
        rng: &mut R,
        tracker: &mut RunTracker,
    ) where
        S: ObjectiveScorer + ?Sized,
        R: Rng + ?Sized,
    {
        for layer in 0..self.depth {
            for _ in 0..self.apply_layer(state, problem, params, layer, rng) {
                tracker.note(Normalization::Recovered);
            }
            let candidate = measure(state, problem, rng);
            let energy = eval.energy(&candidate);
            if tracker.offer(candidate, energy) {
                debug!(layer, energy, "QAOA layer improved best");
            }
            tracker.checkpoint();
        }
    }
}
