//! Tests for the quantum annealing driver.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use arvak_qopt::annealing::QuantumAnnealer;
use arvak_qopt::{
    Algorithm, AlgorithmConfig, Constraint, CoolingSchedule, Evaluator, Objective, ObjectiveKind,
    OptimizationProblem, QoptError, StandardScorer, Termination, Variable, optimize,
};

fn pick_at_most_two() -> OptimizationProblem {
    OptimizationProblem::new("pick-at-most-two")
        .with_variable(Variable::binary("x0"))
        .with_variable(Variable::binary("x1"))
        .with_variable(Variable::binary("x2"))
        .with_objective(Objective::minimize("sum", ObjectiveKind::GenericSum, 1.0))
        .with_constraint(Constraint::at_most(2.0))
}

fn mixed_problem() -> OptimizationProblem {
    OptimizationProblem::new("mixed")
        .with_variable(Variable::continuous("budget", 0.0, 10.0))
        .with_variable(Variable::discrete("slot", vec![1.0, 2.0, 4.0, 8.0]))
        .with_variable(Variable::binary("flag"))
        .with_objective(Objective::minimize(
            "target",
            ObjectiveKind::Target { target: 7.0 },
            1.0,
        ))
        .with_constraint(Constraint::between(2.0, 15.0))
}

// ---------------------------------------------------------------------------
// Example scenario
// ---------------------------------------------------------------------------

#[test]
fn three_binaries_at_most_two_set() {
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_iterations(200)
        .with_temperature(50.0);

    for seed in 0..10 {
        let solution = optimize(&pick_at_most_two(), &config.clone().with_seed(seed)).unwrap();
        assert!(solution.solution.feasible, "seed {seed}");
        let ones = solution
            .solution
            .variables
            .values()
            .filter(|&&v| v == 1.0)
            .count();
        assert!(ones <= 2, "seed {seed}: {ones} variables set");
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn best_energy_history_is_non_increasing() {
    let problem = mixed_problem();
    let mut rng = StdRng::seed_from_u64(42);
    let outcome = QuantumAnnealer::new(300, 80.0)
        .run_with_rng(&problem, &StandardScorer, &mut rng)
        .unwrap();

    let history = &outcome.stats.energy_history;
    assert!(!history.is_empty());
    for pair in history.windows(2) {
        assert!(pair[1] <= pair[0], "{} > {}", pair[1], pair[0]);
    }
    assert_eq!(*history.last().unwrap(), outcome.best.energy);
}

#[test]
fn same_seed_same_assignment() {
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_iterations(150)
        .with_seed(1234);
    let a = optimize(&mixed_problem(), &config).unwrap();
    let b = optimize(&mixed_problem(), &config).unwrap();
    assert_eq!(a.solution.variables, b.solution.variables);
    assert_eq!(a.quantum_metrics.energy_history, b.quantum_metrics.energy_history);
}

#[test]
fn feasible_solution_has_zero_violations() {
    let problem = pick_at_most_two();
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_iterations(200)
        .with_temperature(50.0)
        .with_seed(9);
    let solution = optimize(&problem, &config).unwrap();
    assert!(solution.solution.feasible);

    let eval = Evaluator::new(&problem, &StandardScorer);
    let violations = eval.violations(&solution.solution.variables);
    assert_eq!(violations, vec![0.0]);
}

#[test]
fn feasibility_flag_matches_violations() {
    let problem = mixed_problem();
    let eval = Evaluator::new(&problem, &StandardScorer);
    for seed in 0..10 {
        let config = AlgorithmConfig::new(Algorithm::Annealing)
            .with_iterations(100)
            .with_seed(seed);
        let solution = optimize(&problem, &config).unwrap();
        let clean = eval
            .violations(&solution.solution.variables)
            .iter()
            .all(|&v| v == 0.0);
        assert_eq!(solution.solution.feasible, clean, "seed {seed}");
    }
}

#[test]
fn iteration_bound_is_respected() {
    let problem = mixed_problem();
    let mut rng = StdRng::seed_from_u64(5);
    // Slow cooling so the temperature floor is never reached.
    let outcome = QuantumAnnealer::new(40, 100.0)
        .with_cooling(CoolingSchedule {
            rate: 0.999,
            final_temperature: 0.01,
        })
        .run_with_rng(&problem, &StandardScorer, &mut rng)
        .unwrap();
    assert_eq!(outcome.stats.iterations_completed, 40);
    assert_eq!(outcome.stats.measurements, 41);
    assert_eq!(outcome.stats.termination, Termination::IterationsExhausted);
}

#[test]
fn temperature_floor_stops_early() {
    let problem = pick_at_most_two();
    let mut rng = StdRng::seed_from_u64(5);
    // 1.0 · 0.5^7 < 0.01 after seven iterations.
    let outcome = QuantumAnnealer::new(1000, 1.0)
        .with_cooling(CoolingSchedule {
            rate: 0.5,
            final_temperature: 0.01,
        })
        .run_with_rng(&problem, &StandardScorer, &mut rng)
        .unwrap();
    assert_eq!(outcome.stats.iterations_completed, 7);
    assert_eq!(outcome.stats.termination, Termination::TemperatureFloor);
    assert!(outcome.stats.final_temperature.unwrap() < 0.01);
}

#[test]
fn zero_time_limit_stops_after_one_iteration() {
    let problem = pick_at_most_two();
    let mut rng = StdRng::seed_from_u64(5);
    let outcome = QuantumAnnealer::new(1000, 100.0)
        .with_time_limit(Duration::ZERO)
        .run_with_rng(&problem, &StandardScorer, &mut rng)
        .unwrap();
    assert_eq!(outcome.stats.iterations_completed, 1);
    assert_eq!(outcome.stats.termination, Termination::Deadline);
}

#[test]
fn metrics_reflect_the_run() {
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_iterations(100)
        .with_seed(77);
    let solution = optimize(&pick_at_most_two(), &config).unwrap();
    let m = &solution.quantum_metrics;

    assert_eq!(m.dimensions, 8);
    assert_eq!(m.measurement_distribution.len(), 8);
    assert!((m.final_norm - 1.0).abs() < 1e-6);
    assert!((m.measurement_distribution.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    let rate = m.acceptance_rate.unwrap();
    assert!((0.0..=1.0).contains(&rate));
    assert!(m.final_temperature.is_some());
    assert!(m.optimized_parameters.is_none());
    assert_eq!(m.best_energy, -solution.solution.overall_score);
    assert_eq!(solution.solution.confidence, 0.85);
}

#[test]
fn noisy_run_stays_normalized() {
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_iterations(100)
        .with_noise(0.2, 5.0)
        .with_seed(3);
    let solution = optimize(&mixed_problem(), &config).unwrap();
    assert!((solution.quantum_metrics.final_norm - 1.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn empty_problem_is_rejected() {
    let config = AlgorithmConfig::new(Algorithm::Annealing).with_seed(0);
    let err = optimize(&OptimizationProblem::new("empty"), &config).unwrap_err();
    assert!(matches!(err, QoptError::InvalidProblem(_)));
}

#[test]
fn non_positive_temperature_is_rejected() {
    let config = AlgorithmConfig::new(Algorithm::Annealing)
        .with_temperature(0.0)
        .with_seed(0);
    let err = optimize(&pick_at_most_two(), &config).unwrap_err();
    assert!(matches!(
        err,
        QoptError::ParameterOutOfRange {
            name: "temperature",
            ..
        }
    ));
}
