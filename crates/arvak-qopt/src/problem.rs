//! Optimisation problem definitions.
//!
//! A problem is a list of decision variables, weighted objectives and
//! bound constraints. It is built by the caller and borrowed read-only for
//! the duration of a run.
//!
//! # Example
//!
//! ```rust
//! use arvak_qopt::problem::{Constraint, Objective, ObjectiveKind, OptimizationProblem, Variable};
//!
//! let problem = OptimizationProblem::new("budget")
//!     .with_variable(Variable::binary("a"))
//!     .with_variable(Variable::binary("b"))
//!     .with_objective(Objective::minimize("spend", ObjectiveKind::GenericSum, 1.0))
//!     .with_constraint(Constraint::at_most(1.0));
//! assert!(problem.validate().is_ok());
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{QoptError, QoptResult};

/// A concrete assignment: variable id → value.
///
/// Ordered so iteration, serialisation and equality are deterministic.
pub type Assignment = BTreeMap<String, f64>;

/// Kind of decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Real-valued within a range.
    Continuous,
    /// Takes one of a finite set of values (or the integers of a range).
    Discrete,
    /// 0 or 1.
    Binary,
}

/// The admissible values of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    /// Closed interval `[min, max]`.
    Range {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// An explicit finite set.
    Values {
        /// The allowed values, in declaration order.
        allowed_values: Vec<f64>,
    },
}

impl Domain {
    /// Midpoint and half-width of a range domain; for a value set, of its
    /// hull.
    pub fn span(&self) -> (f64, f64) {
        let (lo, hi) = match self {
            Domain::Range { min, max } => (*min, *max),
            Domain::Values { allowed_values } => allowed_values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                }),
        };
        ((lo + hi) / 2.0, (hi - lo) / 2.0)
    }

    /// Inclusive integer bounds of a range domain, `None` for a value set
    /// or a range holding no integer.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Domain::Values { .. } => None,
            Domain::Range { min, max } => {
                let (lo, hi) = (min.ceil(), max.floor());
                (lo <= hi).then_some((lo as i64, hi as i64))
            }
        }
    }
}

/// Largest magnitude a discrete range bound may have; every integer up to
/// it is exact in `f64`.
pub const MAX_DISCRETE_BOUND: f64 = 9_007_199_254_740_992.0;

/// A decision variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique id within the problem.
    pub id: String,
    /// Variable kind.
    #[serde(rename = "type")]
    pub kind: VariableKind,
    /// Admissible values. Ignored for binary variables.
    pub domain: Domain,
    /// Whether draws for this variable are weighted by the statevector.
    #[serde(default = "default_true")]
    pub quantum_superposition: bool,
}

impl Variable {
    /// Continuous variable on `[min, max]`.
    pub fn continuous(id: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Continuous,
            domain: Domain::Range { min, max },
            quantum_superposition: true,
        }
    }

    /// Discrete variable over an explicit value set.
    pub fn discrete(id: impl Into<String>, allowed_values: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Discrete,
            domain: Domain::Values { allowed_values },
            quantum_superposition: true,
        }
    }

    /// Binary variable.
    pub fn binary(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Binary,
            domain: Domain::Values {
                allowed_values: vec![0.0, 1.0],
            },
            quantum_superposition: true,
        }
    }

    /// Disable statevector weighting; draws become uniform.
    #[must_use]
    pub fn classical(mut self) -> Self {
        self.quantum_superposition = false;
        self
    }

    fn validate(&self) -> QoptResult<()> {
        let bad = |why: &str| QoptError::InvalidProblem(format!("variable `{}`: {why}", self.id));

        if self.kind == VariableKind::Binary {
            return Ok(());
        }
        match &self.domain {
            Domain::Range { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(bad("domain bounds must be finite"));
                }
                if min > max {
                    return Err(bad("domain min exceeds max"));
                }
                if self.kind == VariableKind::Discrete {
                    if min.abs() > MAX_DISCRETE_BOUND || max.abs() > MAX_DISCRETE_BOUND {
                        return Err(bad("discrete range bounds must lie within ±2^53"));
                    }
                    if min.ceil() > max.floor() {
                        return Err(bad("discrete range contains no integer"));
                    }
                }
            }
            Domain::Values { allowed_values } => {
                if allowed_values.is_empty() {
                    return Err(bad("allowed value set is empty"));
                }
                if allowed_values.iter().any(|v| !v.is_finite()) {
                    return Err(bad("allowed values must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// Optimisation direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lower values are better.
    Minimize,
    /// Higher values are better.
    Maximize,
}

/// Scoring rule selector for an objective.
///
/// Each variant maps the current assignment to a raw objective value; see
/// [`crate::evaluator::StandardScorer`]. New rules are added here as new
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ObjectiveKind {
    /// Σ values.
    GenericSum,
    /// Arithmetic mean of the values.
    Mean,
    /// Σ values².
    SumOfSquares,
    /// `1 − exp(−Σ/scale)`: diminishing returns on the total.
    Saturating {
        /// Total at which ~63% of the ceiling is reached.
        scale: f64,
    },
    /// `|Σ − target|`: distance of the total from a target.
    Target {
        /// Desired total.
        target: f64,
    },
}

impl ObjectiveKind {
    fn validate(&self, id: &str) -> QoptResult<()> {
        let bad = |why: &str| QoptError::InvalidProblem(format!("objective `{id}`: {why}"));
        match self {
            ObjectiveKind::Saturating { scale } => {
                if !scale.is_finite() {
                    return Err(bad("saturating scale must be finite"));
                }
                if *scale == 0.0 {
                    return Err(bad("saturating scale must be non-zero"));
                }
            }
            ObjectiveKind::Target { target } => {
                if !target.is_finite() {
                    return Err(bad("target must be finite"));
                }
            }
            ObjectiveKind::GenericSum | ObjectiveKind::Mean | ObjectiveKind::SumOfSquares => {}
        }
        Ok(())
    }
}

/// A weighted objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Unique id within the problem.
    pub id: String,
    /// Scoring rule.
    #[serde(flatten)]
    pub kind: ObjectiveKind,
    /// Weight in the energy sum.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Whether the raw value is minimised or maximised.
    pub direction: Direction,
}

impl Objective {
    /// An objective to minimise.
    pub fn minimize(id: impl Into<String>, kind: ObjectiveKind, weight: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            weight,
            direction: Direction::Minimize,
        }
    }

    /// An objective to maximise.
    pub fn maximize(id: impl Into<String>, kind: ObjectiveKind, weight: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            weight,
            direction: Direction::Maximize,
        }
    }
}

/// Optional lower/upper bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A bound on the total of all variable values.
///
/// Every constraint sees the same quantity, the sum over the whole
/// assignment. Per-variable constraints are not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Optional label, used in logs and reports.
    #[serde(default)]
    pub id: String,
    /// The bounds.
    pub bounds: Bounds,
}

impl Constraint {
    /// `Σ ≤ max`.
    pub fn at_most(max: f64) -> Self {
        Self {
            id: String::new(),
            bounds: Bounds {
                min: None,
                max: Some(max),
            },
        }
    }

    /// `Σ ≥ min`.
    pub fn at_least(min: f64) -> Self {
        Self {
            id: String::new(),
            bounds: Bounds {
                min: Some(min),
                max: None,
            },
        }
    }

    /// `min ≤ Σ ≤ max`.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            id: String::new(),
            bounds: Bounds {
                min: Some(min),
                max: Some(max),
            },
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn named(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// `max(0, Σ − max) + max(0, min − Σ)`.
    pub fn violation(&self, total: f64) -> f64 {
        let over = self.bounds.max.map_or(0.0, |m| (total - m).max(0.0));
        let under = self.bounds.min.map_or(0.0, |m| (m - total).max(0.0));
        over + under
    }
}

/// A complete problem definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProblem {
    /// Problem id, echoed into the solution record.
    pub id: String,
    /// Decision variables.
    pub variables: Vec<Variable>,
    /// Objectives.
    #[serde(default)]
    pub objectives: Vec<Objective>,
    /// Constraints.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl OptimizationProblem {
    /// An empty problem.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variables: Vec::new(),
            objectives: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a variable.
    #[must_use]
    pub fn with_variable(mut self, v: Variable) -> Self {
        self.variables.push(v);
        self
    }

    /// Add an objective.
    #[must_use]
    pub fn with_objective(mut self, o: Objective) -> Self {
        self.objectives.push(o);
        self
    }

    /// Add a constraint.
    #[must_use]
    pub fn with_constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Structural validation: the only checks this crate performs on the
    /// caller's problem.
    pub fn validate(&self) -> QoptResult<()> {
        if self.variables.is_empty() {
            return Err(QoptError::InvalidProblem(format!(
                "problem `{}` has no variables",
                self.id
            )));
        }

        let mut seen = HashSet::with_capacity(self.variables.len());
        for v in &self.variables {
            if !seen.insert(v.id.as_str()) {
                return Err(QoptError::InvalidProblem(format!(
                    "duplicate variable id `{}`",
                    v.id
                )));
            }
            v.validate()?;
        }

        for o in &self.objectives {
            if !o.weight.is_finite() {
                return Err(QoptError::InvalidProblem(format!(
                    "objective `{}` has a non-finite weight",
                    o.id
                )));
            }
            o.kind.validate(&o.id)?;
        }

        for c in &self.constraints {
            if let (Some(lo), Some(hi)) = (c.bounds.min, c.bounds.max) {
                if lo > hi {
                    return Err(QoptError::InvalidProblem(format!(
                        "constraint `{}` has min {lo} above max {hi}",
                        c.id
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}
