//! Objective and constraint evaluation.
//!
//! Energy is the single quantity every driver minimises:
//!
//!   E(x) = Σ_o  w_o · (±score_o(x))  +  1000 · Σ_c violation_c(x)
//!
//! with `+` for minimised and `−` for maximised objectives. Constraint
//! violations are measured against the total of all variable values.

use std::collections::BTreeMap;

use crate::problem::{Assignment, Direction, Objective, ObjectiveKind, OptimizationProblem};

/// Energy added per unit of constraint violation.
pub const CONSTRAINT_PENALTY: f64 = 1000.0;

/// Maps an assignment to the raw value of one objective.
///
/// The crate ships [`StandardScorer`]; callers with domain-specific scoring
/// implement this trait and pass it to
/// [`optimize_with_scorer`](crate::optimize_with_scorer).
pub trait ObjectiveScorer {
    /// Raw (unweighted, undirected) value of `objective` at `assignment`.
    fn score(&self, objective: &Objective, assignment: &Assignment) -> f64;
}

/// Built-in scoring rules, one per [`ObjectiveKind`] variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl ObjectiveScorer for StandardScorer {
    fn score(&self, objective: &Objective, assignment: &Assignment) -> f64 {
        let total = total(assignment);
        match &objective.kind {
            ObjectiveKind::GenericSum => total,
            ObjectiveKind::Mean => {
                if assignment.is_empty() {
                    0.0
                } else {
                    total / assignment.len() as f64
                }
            }
            ObjectiveKind::SumOfSquares => assignment.values().map(|v| v * v).sum(),
            ObjectiveKind::Saturating { scale } => {
                1.0 - (-total / scale.abs().max(f64::EPSILON)).exp()
            }
            ObjectiveKind::Target { target } => (total - target).abs(),
        }
    }
}

/// Σ of all values in an assignment.
pub fn total(assignment: &Assignment) -> f64 {
    assignment.values().sum()
}

/// Energy, objective and feasibility evaluation against one problem.
pub struct Evaluator<'a, S: ObjectiveScorer + ?Sized = StandardScorer> {
    problem: &'a OptimizationProblem,
    scorer: &'a S,
}

impl<'a, S: ObjectiveScorer + ?Sized> Evaluator<'a, S> {
    /// Bind a problem and a scorer.
    pub fn new(problem: &'a OptimizationProblem, scorer: &'a S) -> Self {
        Self { problem, scorer }
    }

    /// The bound problem.
    pub fn problem(&self) -> &'a OptimizationProblem {
        self.problem
    }

    /// Raw value of one objective.
    pub fn objective_value(&self, objective: &Objective, assignment: &Assignment) -> f64 {
        self.scorer.score(objective, assignment)
    }

    /// Raw value of every objective, keyed by objective id.
    pub fn objective_values(&self, assignment: &Assignment) -> BTreeMap<String, f64> {
        self.problem
            .objectives
            .iter()
            .map(|o| (o.id.clone(), self.objective_value(o, assignment)))
            .collect()
    }

    /// Violation of every constraint, in declaration order.
    pub fn violations(&self, assignment: &Assignment) -> Vec<f64> {
        let sum = total(assignment);
        self.problem
            .constraints
            .iter()
            .map(|c| c.violation(sum))
            .collect()
    }

    /// True when every constraint has zero violation.
    pub fn is_feasible(&self, assignment: &Assignment) -> bool {
        self.violations(assignment).iter().all(|v| *v == 0.0)
    }

    /// Energy of an assignment; lower is better.
    pub fn energy(&self, assignment: &Assignment) -> f64 {
        let objective: f64 = self
            .problem
            .objectives
            .iter()
            .map(|o| {
                let value = self.objective_value(o, assignment);
                let signed = match o.direction {
                    Direction::Minimize => value,
                    Direction::Maximize => -value,
                };
                o.weight * signed
            })
            .sum();

        let penalty: f64 = self.violations(assignment).iter().sum::<f64>() * CONSTRAINT_PENALTY;

        objective + penalty
    }
}
