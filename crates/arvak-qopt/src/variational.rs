//! Finite-difference gradient descent for variational circuit parameters.
//!
//! The gradient is estimated with central differences,
//!
//!   ∂f/∂θ_k ≈ ( f(θ + ε·e_k) − f(θ − ε·e_k) ) / 2ε
//!
//! costing two objective evaluations per parameter per step. The learning
//! rate starts at 0.1 and is multiplied by 0.99 every 10 steps.

use tracing::debug;

/// Result of an optimisation run.
#[derive(Debug, Clone)]
pub struct VariationalResult {
    /// Parameters after the last completed step.
    pub optimal_params: Vec<f64>,
    /// Number of objective evaluations.
    pub num_evaluations: usize,
    /// Number of completed gradient steps.
    pub num_iterations: usize,
    /// Per-step cost estimate: the mean of all finite-difference samples.
    pub history: Vec<f64>,
    /// Whether the stop predicate ended the run before the step budget.
    pub stopped_early: bool,
}

/// Gradient descent configuration.
#[derive(Debug, Clone)]
pub struct VariationalOptimizer {
    /// Maximum number of gradient steps.
    pub iterations: usize,
    /// Initial learning rate.
    pub learning_rate: f64,
    /// Multiplicative decay applied every `decay_interval` steps.
    pub decay: f64,
    /// Steps between decays.
    pub decay_interval: usize,
    /// Finite-difference step.
    pub epsilon: f64,
}

impl Default for VariationalOptimizer {
    fn default() -> Self {
        Self {
            iterations: 100,
            learning_rate: 0.1,
            decay: 0.99,
            decay_interval: 10,
            epsilon: 0.01,
        }
    }
}

impl VariationalOptimizer {
    /// Create an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of gradient steps.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the initial learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Learning rate in effect at `step` (0-based).
    pub fn learning_rate_at(&self, step: usize) -> f64 {
        let interval = self.decay_interval.max(1);
        let decays = i32::try_from(step / interval).unwrap_or(i32::MAX);
        self.learning_rate * self.decay.powi(decays)
    }

    /// Minimise `objective` starting from `initial_params`.
    pub fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> VariationalResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.minimize_until(objective, initial_params, || false)
    }

    /// Minimise `objective`, checking `stop` after every completed step.
    pub fn minimize_until<F, P>(
        &self,
        mut objective: F,
        initial_params: Vec<f64>,
        mut stop: P,
    ) -> VariationalResult
    where
        F: FnMut(&[f64]) -> f64,
        P: FnMut() -> bool,
    {
        let n = initial_params.len();
        let mut params = initial_params;
        let mut shifted = params.clone();
        let mut gradient = vec![0.0; n];
        let mut history = Vec::with_capacity(self.iterations);
        let mut num_evaluations = 0;
        let mut num_iterations = 0;
        let mut stopped_early = false;

        for step in 0..self.iterations {
            let mut cost_sum = 0.0;
            for k in 0..n {
                shifted[k] = params[k] + self.epsilon;
                let f_plus = objective(&shifted);
                shifted[k] = params[k] - self.epsilon;
                let f_minus = objective(&shifted);
                shifted[k] = params[k];

                gradient[k] = (f_plus - f_minus) / (2.0 * self.epsilon);
                cost_sum += f_plus + f_minus;
                num_evaluations += 2;
            }

            let lr = self.learning_rate_at(step);
            for (p, g) in params.iter_mut().zip(&gradient) {
                if g.is_finite() {
                    *p -= lr * g;
                }
            }
            shifted.copy_from_slice(&params);

            if n > 0 {
                history.push(cost_sum / (2 * n) as f64);
            }
            num_iterations += 1;

            if step % 10 == 0 {
                debug!(step, lr, cost = history.last().copied(), "variational step");
            }

            if stop() {
                stopped_early = num_iterations < self.iterations;
                break;
            }
        }

        VariationalResult {
            optimal_params: params,
            num_evaluations,
            num_iterations,
            history,
            stopped_early,
        }
    }
}
