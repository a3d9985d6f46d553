//! Algorithm configuration.
//!
//! Supports loading from:
//! 1. Configuration files (JSON or YAML, chosen by extension)
//! 2. Environment variables (with `ARVAK_QOPT_` prefix)
//!
//! Precedence (highest to lowest): explicit overrides by the caller,
//! environment variables, configuration file, default values.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{QoptError, QoptResult};
use crate::problem::OptimizationProblem;
use crate::state::{MAX_DIMENSIONS, resolve_dimensions};

/// Default confidence reported with a solution.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Explicit overrides supplied by the caller, typically command-line flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Driver to run.
    pub algorithm: Option<Algorithm>,
    /// RNG seed.
    pub seed: Option<u64>,
    /// Iteration count, or step count for the quantum walk.
    pub iterations: Option<usize>,
    /// Wall-clock budget in milliseconds.
    pub time_limit_ms: Option<u64>,
}

/// Which driver to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Simulated quantum annealing.
    Annealing,
    /// QAOA analogue with variational parameter tuning.
    Qaoa,
    /// Coined quantum-walk search.
    QuantumWalk,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Annealing => "annealing",
            Algorithm::Qaoa => "qaoa",
            Algorithm::QuantumWalk => "quantum_walk",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = QoptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "annealing" | "anneal" => Ok(Algorithm::Annealing),
            "qaoa" => Ok(Algorithm::Qaoa),
            "quantum_walk" | "walk" => Ok(Algorithm::QuantumWalk),
            other => Err(QoptError::Config(format!(
                "unknown algorithm '{other}' (expected annealing, qaoa, quantum_walk)"
            ))),
        }
    }
}

/// Geometric cooling schedule for annealing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoolingSchedule {
    /// Multiplier applied to the temperature after every iteration.
    #[serde(default = "default_cooling_rate")]
    pub rate: f64,
    /// Annealing stops once the temperature falls below this.
    #[serde(default = "default_final_temperature")]
    pub final_temperature: f64,
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        Self {
            rate: default_cooling_rate(),
            final_temperature: default_final_temperature(),
        }
    }
}

/// Opt-in noise model applied after every evolution step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Per-amplitude error probability (0.0 to 1.0).
    pub gate_error_rate: f64,
    /// Decoherence time in steps; imaginary parts decay by `exp(-1/t)`.
    pub decoherence_time: f64,
}

/// Parameter bag shared by all drivers. Each driver reads the fields it
/// needs and ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParameters {
    /// Annealing iterations / variational optimizer steps.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Initial annealing temperature.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Annealing cooling schedule.
    #[serde(default)]
    pub cooling_schedule: Option<CoolingSchedule>,

    /// Number of QAOA layers.
    #[serde(default)]
    pub circuit_depth: Option<usize>,

    /// Interleaved `[γ₀, β₀, γ₁, β₁, …]`, length `2 · circuit_depth`.
    #[serde(default)]
    pub variational_parameters: Option<Vec<f64>>,

    /// Quantum walk step count.
    #[serde(default)]
    pub quantum_walk_steps: Option<usize>,

    /// Statevector dimension; defaults to `2^min(variables, 10)`.
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Noise model; disabled when absent.
    #[serde(default)]
    pub noise: Option<NoiseConfig>,
}

impl Default for AlgorithmParameters {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            temperature: None,
            cooling_schedule: None,
            circuit_depth: None,
            variational_parameters: None,
            quantum_walk_steps: None,
            dimensions: None,
            noise: None,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Driver to run.
    pub algorithm: Algorithm,

    /// Driver parameters.
    #[serde(default)]
    pub parameters: AlgorithmParameters,

    /// RNG seed; a run is bit-reproducible given the seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Wall-clock budget. Checked between iterations.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,

    /// Confidence reported with the solution.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AlgorithmConfig {
    /// Default parameters for a driver.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            parameters: AlgorithmParameters::default(),
            seed: None,
            time_limit_ms: None,
            confidence: None,
        }
    }

    /// Set the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.parameters.iterations = iterations;
        self
    }

    /// Set the initial annealing temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.parameters.temperature = Some(temperature);
        self
    }

    /// Set the annealing cooling schedule.
    #[must_use]
    pub fn with_cooling(mut self, rate: f64, final_temperature: f64) -> Self {
        self.parameters.cooling_schedule = Some(CoolingSchedule {
            rate,
            final_temperature,
        });
        self
    }

    /// Set the QAOA depth.
    #[must_use]
    pub fn with_circuit_depth(mut self, depth: usize) -> Self {
        self.parameters.circuit_depth = Some(depth);
        self
    }

    /// Set the initial QAOA parameters.
    #[must_use]
    pub fn with_variational_parameters(mut self, params: Vec<f64>) -> Self {
        self.parameters.variational_parameters = Some(params);
        self
    }

    /// Set the quantum walk step count.
    #[must_use]
    pub fn with_walk_steps(mut self, steps: usize) -> Self {
        self.parameters.quantum_walk_steps = Some(steps);
        self
    }

    /// Override the statevector dimension.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.parameters.dimensions = Some(dimensions);
        self
    }

    /// Enable the noise model.
    #[must_use]
    pub fn with_noise(mut self, gate_error_rate: f64, decoherence_time: f64) -> Self {
        self.parameters.noise = Some(NoiseConfig {
            gate_error_rate,
            decoherence_time,
        });
        self
    }

    /// Fix the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set a wall-clock budget.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Override the reported confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Load configuration from a JSON or YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> QoptResult<Self> {
        let config: AlgorithmConfig = load_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ARVAK_QOPT_*` environment overrides.
    ///
    /// Environment variables:
    /// - `ARVAK_QOPT_ALGORITHM`: `annealing`, `qaoa` or `quantum_walk`
    /// - `ARVAK_QOPT_SEED`: RNG seed
    /// - `ARVAK_QOPT_TIME_LIMIT_MS`: wall-clock budget
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = std::env::var("ARVAK_QOPT_ALGORITHM") {
            if let Ok(algorithm) = name.parse() {
                self.algorithm = algorithm;
            }
        }
        if let Ok(seed) = std::env::var("ARVAK_QOPT_SEED") {
            if let Ok(val) = seed.parse() {
                self.seed = Some(val);
            }
        }
        if let Ok(limit) = std::env::var("ARVAK_QOPT_TIME_LIMIT_MS") {
            if let Ok(val) = limit.parse() {
                self.time_limit_ms = Some(val);
            }
        }
        self
    }

    /// Apply explicit caller overrides on top of the current values.
    ///
    /// `iterations` sets the step count when the resulting algorithm is the
    /// quantum walk and the iteration count otherwise.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(algorithm) = overrides.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(n) = overrides.iterations {
            match self.algorithm {
                Algorithm::QuantumWalk => self.parameters.quantum_walk_steps = Some(n),
                Algorithm::Annealing | Algorithm::Qaoa => self.parameters.iterations = n,
            }
        }
        if let Some(ms) = overrides.time_limit_ms {
            self.time_limit_ms = Some(ms);
        }
        self
    }

    /// Build the effective configuration from every source.
    ///
    /// Precedence: `overrides`, then `ARVAK_QOPT_*` environment variables,
    /// then the file at `path`, then defaults (annealing). The result is
    /// validated.
    pub fn resolve<P: AsRef<Path>>(path: Option<P>, overrides: &ConfigOverrides) -> QoptResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::new(Algorithm::Annealing),
        };
        let config = base.with_env_overrides().with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Effective initial temperature (default 100).
    pub fn temperature(&self) -> f64 {
        self.parameters.temperature.unwrap_or(100.0)
    }

    /// Effective cooling schedule.
    pub fn cooling_schedule(&self) -> CoolingSchedule {
        self.parameters.cooling_schedule.unwrap_or_default()
    }

    /// Effective QAOA depth (default 3).
    pub fn circuit_depth(&self) -> usize {
        self.parameters.circuit_depth.unwrap_or(3)
    }

    /// Effective initial QAOA parameters (default γ = β = 0.5 per layer).
    pub fn variational_parameters(&self) -> Vec<f64> {
        self.parameters
            .variational_parameters
            .clone()
            .unwrap_or_else(|| vec![0.5; 2 * self.circuit_depth()])
    }

    /// Effective quantum walk step count (default 1000).
    pub fn quantum_walk_steps(&self) -> usize {
        self.parameters.quantum_walk_steps.unwrap_or(1000)
    }

    /// Effective statevector dimension for a problem.
    pub fn dimensions_for(&self, problem: &OptimizationProblem) -> usize {
        resolve_dimensions(self.parameters.dimensions, problem.variables.len())
    }

    /// Effective reported confidence.
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }

    /// Wall-clock budget, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Range-check every parameter the selected driver reads.
    pub fn validate(&self) -> QoptResult<()> {
        let p = &self.parameters;

        if let Some(d) = p.dimensions {
            if d == 0 {
                return Err(QoptError::InvalidDimension(0));
            }
            if d > MAX_DIMENSIONS {
                return Err(QoptError::out_of_range(
                    "dimensions",
                    d,
                    "must not exceed 2^20",
                ));
            }
        }

        if let Some(c) = self.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(QoptError::out_of_range("confidence", c, "must lie in [0, 1]"));
            }
        }

        if let Some(noise) = &p.noise {
            if !(0.0..=1.0).contains(&noise.gate_error_rate) {
                return Err(QoptError::out_of_range(
                    "noise.gate_error_rate",
                    noise.gate_error_rate,
                    "must lie in [0, 1]",
                ));
            }
            if !(noise.decoherence_time > 0.0) {
                return Err(QoptError::out_of_range(
                    "noise.decoherence_time",
                    noise.decoherence_time,
                    "must be positive",
                ));
            }
        }

        match self.algorithm {
            Algorithm::Annealing => {
                let t = self.temperature();
                if !t.is_finite() || t <= 0.0 {
                    return Err(QoptError::out_of_range(
                        "temperature",
                        t,
                        "must be positive and finite",
                    ));
                }
                let cooling = self.cooling_schedule();
                if !(cooling.rate > 0.0 && cooling.rate < 1.0) {
                    return Err(QoptError::out_of_range(
                        "cooling_schedule.rate",
                        cooling.rate,
                        "must lie in (0, 1)",
                    ));
                }
                if !cooling.final_temperature.is_finite() || cooling.final_temperature < 0.0 {
                    return Err(QoptError::out_of_range(
                        "cooling_schedule.final_temperature",
                        cooling.final_temperature,
                        "must be non-negative and finite",
                    ));
                }
            }
            Algorithm::Qaoa => {
                let depth = self.circuit_depth();
                if depth == 0 {
                    return Err(QoptError::out_of_range(
                        "circuit_depth",
                        depth,
                        "must be at least 1",
                    ));
                }
                let params = self.variational_parameters();
                if params.len() != 2 * depth {
                    return Err(QoptError::out_of_range(
                        "variational_parameters",
                        params.len(),
                        "length must equal 2 * circuit_depth",
                    ));
                }
                if params.iter().any(|v| !v.is_finite()) {
                    return Err(QoptError::out_of_range(
                        "variational_parameters",
                        "non-finite",
                        "every angle must be finite",
                    ));
                }
            }
            Algorithm::QuantumWalk => {}
        }

        Ok(())
    }
}

/// Load an optimisation problem from a JSON or YAML file and validate it.
pub fn load_problem<P: AsRef<Path>>(path: P) -> QoptResult<OptimizationProblem> {
    let problem: OptimizationProblem = load_file(path.as_ref())?;
    problem.validate()?;
    Ok(problem)
}

fn load_file<T: DeserializeOwned>(path: &Path) -> QoptResult<T> {
    let contents = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&contents)
            .map_err(|e| QoptError::Config(format!("{}: {e}", path.display()))),
        _ => serde_json::from_str(&contents)
            .map_err(|e| QoptError::Config(format!("{}: {e}", path.display()))),
    }
}

// Default value functions
fn default_iterations() -> usize {
    1000
}

fn default_cooling_rate() -> f64 {
    0.95
}

fn default_final_temperature() -> f64 {
    0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = AlgorithmConfig::new(Algorithm::Annealing);
        assert_eq!(c.parameters.iterations, 1000);
        assert_eq!(c.temperature(), 100.0);
        assert_eq!(c.cooling_schedule(), CoolingSchedule { rate: 0.95, final_temperature: 0.01 });
        assert_eq!(c.circuit_depth(), 3);
        assert_eq!(c.variational_parameters().len(), 6);
        assert_eq!(c.quantum_walk_steps(), 1000);
        assert_eq!(c.confidence(), DEFAULT_CONFIDENCE);
        assert!(c.time_limit().is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_dimensions_default_to_register_size() {
        let c = AlgorithmConfig::new(Algorithm::Qaoa);
        let p = OptimizationProblem::new("p")
            .with_variable(crate::problem::Variable::binary("a"))
            .with_variable(crate::problem::Variable::binary("b"))
            .with_variable(crate::problem::Variable::binary("c"));
        assert_eq!(c.dimensions_for(&p), 8);
        assert_eq!(c.with_dimensions(4).dimensions_for(&p), 4);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let c = AlgorithmConfig::new(Algorithm::Qaoa).with_circuit_depth(0);
        assert!(matches!(
            c.validate(),
            Err(QoptError::ParameterOutOfRange { name: "circuit_depth", .. })
        ));
    }

    #[test]
    fn test_parameter_length_mismatch_rejected() {
        let c = AlgorithmConfig::new(Algorithm::Qaoa)
            .with_circuit_depth(2)
            .with_variational_parameters(vec![0.1, 0.2, 0.3]);
        assert!(matches!(
            c.validate(),
            Err(QoptError::ParameterOutOfRange { name: "variational_parameters", .. })
        ));
    }

    #[test]
    fn test_bad_annealing_parameters_rejected() {
        let hot = AlgorithmConfig::new(Algorithm::Annealing).with_temperature(-1.0);
        assert!(hot.validate().is_err());
        let cooling = AlgorithmConfig::new(Algorithm::Annealing).with_cooling(1.5, 0.01);
        assert!(cooling.validate().is_err());
    }

    #[test]
    fn test_bad_noise_rejected() {
        let c = AlgorithmConfig::new(Algorithm::QuantumWalk).with_noise(1.5, 10.0);
        assert!(c.validate().is_err());
        let c = AlgorithmConfig::new(Algorithm::QuantumWalk).with_noise(0.1, 0.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let c = AlgorithmConfig::new(Algorithm::QuantumWalk).with_dimensions(0);
        assert!(matches!(c.validate(), Err(QoptError::InvalidDimension(0))));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let base = AlgorithmConfig::new(Algorithm::Annealing)
            .with_iterations(500)
            .with_seed(1);
        let config = base.clone().with_overrides(&ConfigOverrides {
            seed: Some(2),
            iterations: Some(40),
            time_limit_ms: Some(250),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.seed, Some(2));
        assert_eq!(config.parameters.iterations, 40);
        assert_eq!(config.time_limit_ms, Some(250));

        let untouched = base.clone().with_overrides(&ConfigOverrides::default());
        assert_eq!(untouched, base);
    }

    #[test]
    fn test_iterations_override_targets_walk_steps() {
        let config = AlgorithmConfig::new(Algorithm::Annealing).with_overrides(&ConfigOverrides {
            algorithm: Some(Algorithm::QuantumWalk),
            iterations: Some(64),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.algorithm, Algorithm::QuantumWalk);
        assert_eq!(config.quantum_walk_steps(), 64);
        assert_eq!(config.parameters.iterations, AlgorithmParameters::default().iterations);
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let config = AlgorithmConfig::resolve(
            None::<&Path>,
            &ConfigOverrides {
                algorithm: Some(Algorithm::Qaoa),
                seed: Some(9),
                ..ConfigOverrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.algorithm, Algorithm::Qaoa);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.circuit_depth(), 3);
    }

    #[test]
    fn test_resolve_missing_file_is_io_error() {
        let result = AlgorithmConfig::resolve(
            Some("/nonexistent/arvak-qopt/config.yaml"),
            &ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(QoptError::Io(_))));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let c = AlgorithmConfig::new(Algorithm::QuantumWalk).with_dimensions(usize::MAX / 8);
        assert!(matches!(
            c.validate(),
            Err(QoptError::ParameterOutOfRange { name: "dimensions", .. })
        ));
        let c = AlgorithmConfig::new(Algorithm::Annealing).with_dimensions(MAX_DIMENSIONS);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("qaoa".parse::<Algorithm>().unwrap(), Algorithm::Qaoa);
        assert_eq!("Quantum-Walk".parse::<Algorithm>().unwrap(), Algorithm::QuantumWalk);
        assert!("grover".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::QuantumWalk.to_string(), "quantum_walk");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = "
algorithm: annealing
seed: 7
parameters:
  iterations: 200
  temperature: 50.0
  cooling_schedule:
    rate: 0.9
";
        let c: AlgorithmConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(c.algorithm, Algorithm::Annealing);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.parameters.iterations, 200);
        assert_eq!(c.cooling_schedule().rate, 0.9);
        assert_eq!(c.cooling_schedule().final_temperature, 0.01);
    }

    #[test]
    fn test_negative_iterations_rejected_by_parser() {
        let json = r#"{"algorithm": "annealing", "parameters": {"iterations": -5}}"#;
        assert!(serde_json::from_str::<AlgorithmConfig>(json).is_err());
    }
}
