//! Simulated quantum annealing.
//!
//! ```text
//! Init → { Fluctuate → Measure → Evaluate → AcceptOrReject → Cool } → Done
//! ```
//!
//! Each iteration kicks the statevector with temperature-scaled Gaussian
//! noise, measures a candidate and decides whether to accept it. Worse
//! candidates are accepted with the tunnelling probability
//!
//!   P(Δ, T) = max( exp(−Δ/T), 1.2 · exp(−Δ/(0.1·T)) )
//!
//! where Δ is the energy gap to the best-so-far. Accepted candidates pull
//! the statevector toward themselves; the best-so-far only ever improves.
//! The temperature cools geometrically and the run stops when it drops
//! below the floor or the iteration budget is spent.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::config::{AlgorithmConfig, CoolingSchedule, NoiseConfig};
use crate::error::QoptResult;
use crate::evaluator::{Evaluator, ObjectiveScorer};
use crate::operators;
use crate::problem::OptimizationProblem;
use crate::run::{Candidate, Deadline, RunOutcome, RunTracker, Termination};
use crate::sampler::{measure, sample_classical, slots_for};
use crate::state::{QuantumState, resolve_dimensions};

/// Probability of accepting a candidate `delta` above the best energy.
///
/// Always 1 for `delta <= 0`. May exceed 1 for tiny gaps relative to the
/// temperature, which simply means certain acceptance.
pub fn tunneling_probability(delta: f64, temperature: f64) -> f64 {
    if delta <= 0.0 {
        return 1.0;
    }
    let t = temperature.max(f64::MIN_POSITIVE);
    let thermal = (-delta / t).exp();
    let tunnel = 1.2 * (-delta / (0.1 * t)).exp();
    thermal.max(tunnel)
}

/// Quantum annealing driver.
#[derive(Debug, Clone)]
pub struct QuantumAnnealer {
    iterations: usize,
    temperature: f64,
    cooling: CoolingSchedule,
    dimensions: Option<usize>,
    noise: Option<NoiseConfig>,
    time_limit: Option<Duration>,
}

impl QuantumAnnealer {
    /// Construct with the default cooling schedule (×0.95, floor 0.01).
    pub fn new(iterations: usize, temperature: f64) -> Self {
        Self {
            iterations,
            temperature,
            cooling: CoolingSchedule::default(),
            dimensions: None,
            noise: None,
            time_limit: None,
        }
    }

    /// Construct from a validated configuration.
    pub fn from_config(config: &AlgorithmConfig) -> QoptResult<Self> {
        config.validate()?;
        Ok(Self {
            iterations: config.parameters.iterations,
            temperature: config.temperature(),
            cooling: config.cooling_schedule(),
            dimensions: config.parameters.dimensions,
            noise: config.parameters.noise,
            time_limit: config.time_limit(),
        })
    }

    /// Override the cooling schedule.
    #[must_use]
    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
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

    /// Run the annealer using the given scorer and random number generator.
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

        let initial = sample_classical(problem, rng);
        let energy = eval.energy(&initial);
        let mut tracker = RunTracker::new(Candidate {
            assignment: initial,
            energy,
        });
        let mut accepted = 0usize;
        let mut temperature = self.temperature;

        info!(
            problem = %problem.id,
            dims,
            iterations = self.iterations,
            temperature,
            "starting quantum annealing"
        );

        for _ in 0..self.iterations {
            if temperature < self.cooling.final_temperature {
                tracker.stats_mut().termination = Termination::TemperatureFloor;
                break;
            }

            tracker.note(operators::fluctuation(&mut state, temperature, rng));
            if let Some(noise) = &self.noise {
                tracker.note(operators::noise(&mut state, noise, rng));
            }

            let candidate = measure(&state, problem, rng);
            let energy = eval.energy(&candidate);
            let delta = energy - tracker.best_energy();

            let accept = energy < tracker.best_energy()
                || rng.r#gen::<f64>() < tunneling_probability(delta, temperature);
            if accept {
                let slots = slots_for(problem, &candidate, dims);
                tracker.note(operators::reinforce(&mut state, &slots));
                accepted += 1;
            }
            if tracker.offer(candidate, energy) {
                debug!(energy, temperature, "annealing improved best");
            }
            tracker.checkpoint();

            temperature *= self.cooling.rate;
            tracker.complete_iteration();
            if tracker.deadline_hit(&deadline) {
                break;
            }
        }

        let stats = tracker.stats_mut();
        stats.accepted = Some(accepted);
        stats.final_temperature = Some(temperature);

        info!(
            best_energy = tracker.best_energy(),
            accepted,
            final_temperature = temperature,
            "quantum annealing finished"
        );
        Ok(tracker.finish(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunneling_improvement_is_certain() {
        assert_eq!(tunneling_probability(-3.0, 10.0), 1.0);
        assert_eq!(tunneling_probability(0.0, 10.0), 1.0);
    }

    #[test]
    fn test_tunneling_thermal_branch_dominates_large_gaps() {
        let p = tunneling_probability(5.0, 10.0);
        assert!((p - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_tunneling_branch_dominates_tiny_gaps() {
        let p = tunneling_probability(0.001, 10.0);
        assert!((p - 1.2 * (-0.001f64).exp()).abs() < 1e-12);
        assert!(p > 1.0);
    }

    #[test]
    fn test_tunneling_vanishes_when_cold() {
        assert!(tunneling_probability(1.0, 1e-6) < 1e-12);
    }
}
