//! Discrete-time quantum walk search.
//!
//! Every step applies the coin, then the cyclic shift, then optional noise
//! and finally neighbour interference. Every tenth step the walker is
//! measured and the candidate compared against the best-so-far. The walk
//! stops only when its step budget (or the deadline) is exhausted.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::config::{AlgorithmConfig, NoiseConfig};
use crate::error::QoptResult;
use crate::evaluator::{Evaluator, ObjectiveScorer};
use crate::operators;
use crate::problem::OptimizationProblem;
use crate::run::{Candidate, Deadline, RunOutcome, RunTracker};
use crate::sampler::measure;
use crate::state::{QuantumState, resolve_dimensions};

/// Steps between measurements.
pub const MEASUREMENT_INTERVAL: usize = 10;

/// Quantum walk driver.
#[derive(Debug, Clone)]
pub struct QuantumWalker {
    steps: usize,
    dimensions: Option<usize>,
    noise: Option<NoiseConfig>,
    time_limit: Option<Duration>,
}

impl QuantumWalker {
    pub fn new(steps: usize) -> Self {
        Self {
            steps,
            dimensions: None,
            noise: None,
            time_limit: None,
        }
    }

    /// Construct from a validated configuration.
    pub fn from_config(config: &AlgorithmConfig) -> QoptResult<Self> {
        config.validate()?;
        Ok(Self {
            steps: config.quantum_walk_steps(),
            dimensions: config.parameters.dimensions,
            noise: config.parameters.noise,
            time_limit: config.time_limit(),
        })
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    #[must_use]
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = Some(noise);
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Run the walk using the given scorer and random number generator.
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

        info!(problem = %problem.id, dims, steps = self.steps, "starting quantum walk");

        let mut completed = 0usize;
        for step in 1..=self.steps {
            tracker.note(operators::coin(&mut state));
            tracker.note(operators::shift(&mut state));
            if let Some(noise) = &self.noise {
                tracker.note(operators::noise(&mut state, noise, rng));
            }

            if step % MEASUREMENT_INTERVAL == 0 {
                self.inspect(&state, problem, &eval, rng, &mut tracker, step);
            }

            tracker.note(operators::interference(&mut state));
            tracker.complete_iteration();
            completed = step;
            if tracker.deadline_hit(&deadline) {
                break;
            }
        }

        if completed > 0 && completed % MEASUREMENT_INTERVAL != 0 {
            self.inspect(&state, problem, &eval, rng, &mut tracker, completed);
        }

        info!(best_energy = tracker.best_energy(), steps = completed, "quantum walk finished");
        Ok(tracker.finish(state))
    }

    fn inspect<S, R>(
        &self,
        state: &QuantumState,
        problem: &OptimizationProblem,
        eval: &Evaluator<'_, S>,
        rng: &mut R,
        tracker: &mut RunTracker,
        step: usize,
    ) where
        S: ObjectiveScorer + ?Sized,
        R: Rng + ?Sized,
    {
        let candidate = measure(state, problem, rng);
        let energy = eval.energy(&candidate);
        if tracker.offer(candidate, energy) {
            debug!(step, energy, "quantum walk improved best");
        }
        tracker.checkpoint();
    }
}
