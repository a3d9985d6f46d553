//! `arvak-qopt`: quantum-inspired optimisation on a classical statevector.
//!
//! Three metaheuristics search an [`OptimizationProblem`] by evolving a
//! normalised complex amplitude vector and sampling assignments from it:
//!
//! - **Quantum annealing** with a tunnelling acceptance rule
//! - **QAOA** with finite-difference variational tuning of `γ`/`β`
//! - **Quantum walk** with coin, shift and neighbour interference
//!
//! Every run owns its statevector and draws all randomness from one
//! injected generator, so a seed fully determines the result.
//!
//! # Quick start
//!
//! ```rust
//! use arvak_qopt::{
//!     optimize, Algorithm, AlgorithmConfig, Constraint, Objective, ObjectiveKind,
//!     OptimizationProblem, Variable,
//! };
//!
//! let problem = OptimizationProblem::new("pick-two")
//!     .with_variable(Variable::binary("a"))
//!     .with_variable(Variable::binary("b"))
//!     .with_variable(Variable::binary("c"))
//!     .with_objective(Objective::minimize("sum", ObjectiveKind::GenericSum, 1.0))
//!     .with_constraint(Constraint::at_most(2.0));
//!
//! let config = AlgorithmConfig::new(Algorithm::Annealing)
//!     .with_iterations(200)
//!     .with_temperature(50.0)
//!     .with_seed(7);
//!
//! let solution = optimize(&problem, &config).unwrap();
//! assert!(solution.solution.feasible);
//! ```

pub mod amplitude;
pub mod annealing;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod operators;
pub mod problem;
pub mod qaoa;
pub mod run;
pub mod sampler;
pub mod solution;
pub mod state;
pub mod variational;
pub mod walk;

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub use annealing::{QuantumAnnealer, tunneling_probability};
pub use config::{
    Algorithm, AlgorithmConfig, AlgorithmParameters, ConfigOverrides, CoolingSchedule, NoiseConfig,
};
pub use error::{QoptError, QoptResult};
pub use evaluator::{Evaluator, ObjectiveScorer, StandardScorer};
pub use problem::{
    Assignment, Bounds, Constraint, Direction, Domain, Objective, ObjectiveKind,
    OptimizationProblem, Variable, VariableKind,
};
pub use qaoa::QaoaSolver;
pub use run::{Candidate, RunOutcome, RunStats, Termination};
pub use solution::{QuantumMetrics, QuantumOptimizationSolution, SolutionBody};
pub use state::{Normalization, QuantumState};
pub use variational::{VariationalOptimizer, VariationalResult};
pub use walk::QuantumWalker;

/// Solve `problem` with the driver selected by `config`.
///
/// Uses `config.seed` when present, fresh entropy otherwise.
pub fn optimize(
    problem: &OptimizationProblem,
    config: &AlgorithmConfig,
) -> QoptResult<QuantumOptimizationSolution> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    optimize_with_rng(problem, config, &mut rng)
}

/// Like [`optimize`] with a caller-supplied generator.
pub fn optimize_with_rng<R: Rng + ?Sized>(
    problem: &OptimizationProblem,
    config: &AlgorithmConfig,
    rng: &mut R,
) -> QoptResult<QuantumOptimizationSolution> {
    optimize_with_scorer(problem, config, &StandardScorer, rng)
}

/// Like [`optimize_with_rng`] with a custom objective scorer.
pub fn optimize_with_scorer<S, R>(
    problem: &OptimizationProblem,
    config: &AlgorithmConfig,
    scorer: &S,
    rng: &mut R,
) -> QoptResult<QuantumOptimizationSolution>
where
    S: ObjectiveScorer + ?Sized,
    R: Rng + ?Sized,
{
    problem.validate()?;
    config.validate()?;

    let start = Instant::now();
    let outcome = match config.algorithm {
        Algorithm::Annealing => QuantumAnnealer::from_config(config)?.run_with_rng(problem, scorer, rng)?,
        Algorithm::Qaoa => QaoaSolver::from_config(config)?.run_with_rng(problem, scorer, rng)?,
        Algorithm::QuantumWalk => QuantumWalker::from_config(config)?.run_with_rng(problem, scorer, rng)?,
    };
    let elapsed = start.elapsed();
    debug!(
        algorithm = %config.algorithm,
        elapsed_ms = elapsed.as_millis() as u64,
        "driver returned"
    );

    let evaluator = Evaluator::new(problem, scorer);
    Ok(QuantumOptimizationSolution::assemble(
        config.algorithm,
        &evaluator,
        outcome,
        config.confidence(),
        elapsed,
    ))
}
