//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use arvak_qopt::config::load_problem as load_problem_file;
use arvak_qopt::{
    Algorithm, AlgorithmConfig, ConfigOverrides, OptimizationProblem, QuantumOptimizationSolution,
};

/// Output format for solution records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown output format: '{other}'. Available: table, json"),
        }
    }
}

/// Load and validate a problem file.
pub fn load_problem(path: &str) -> Result<OptimizationProblem> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    load_problem_file(path).with_context(|| format!("Failed to load problem: {path}"))
}

/// Parse an `--algorithm` flag value.
pub fn parse_algorithm(name: Option<&str>) -> Result<Option<Algorithm>> {
    name.map(|name| {
        name.parse()
            .map_err(|e| anyhow::anyhow!("Invalid algorithm '{name}': {e}"))
    })
    .transpose()
}

/// Build the effective configuration.
///
/// Precedence: command-line flags, then `ARVAK_QOPT_*` environment
/// variables, then the config file, then built-in defaults.
pub fn resolve_config(path: Option<&str>, overrides: &ConfigOverrides) -> Result<AlgorithmConfig> {
    if let Some(path) = path {
        if !Path::new(path).exists() {
            anyhow::bail!("File not found: {path}");
        }
    }
    let config = AlgorithmConfig::resolve(path, overrides).with_context(|| match path {
        Some(path) => format!("Invalid algorithm configuration: {path}"),
        None => "Invalid algorithm configuration".to_string(),
    })?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

/// Write a solution record to a JSON or YAML file, chosen by extension.
pub fn write_solution(solution: &QuantumOptimizationSolution, path: &str) -> Result<()> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let contents = match ext.as_str() {
        "yaml" | "yml" => serde_yaml_ng::to_string(solution)
            .map_err(|e| anyhow::anyhow!("YAML serialization failed: {e}"))?,
        _ => serde_json::to_string_pretty(solution)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?,
    };

    fs::write(path, contents).with_context(|| format!("Failed to write output file: {path}"))
}

/// Print a solution record as a table.
pub fn print_solution(solution: &QuantumOptimizationSolution) {
    let body = &solution.solution;
    let metrics = &solution.quantum_metrics;

    let verdict = if body.feasible {
        style("feasible").green().bold()
    } else {
        style("infeasible").red().bold()
    };
    println!(
        "\n{} Solution ({}, {}):",
        style("✓").green().bold(),
        style(solution.algorithm).yellow(),
        verdict
    );

    println!("\n  Variables:");
    for (id, value) in &body.variables {
        println!("    {:<20} {:>12.4}", style(id).cyan(), value);
    }

    if !body.objective_values.is_empty() {
        println!("\n  Objectives:");
        for (id, value) in &body.objective_values {
            println!("    {:<20} {:>12.4}", style(id).cyan(), value);
        }
    }

    println!("\n  Overall score:  {}", style(format!("{:.4}", body.overall_score)).yellow());
    println!("  Confidence:     {:.2}", body.confidence);

    println!("\n  Run:");
    println!("    Dimensions:           {}", metrics.dimensions);
    println!("    Iterations completed: {}", metrics.iterations_completed);
    println!("    Measurements:         {}", metrics.measurements);
    if let Some(rate) = metrics.acceptance_rate {
        println!("    Acceptance rate:      {:.1}%", rate * 100.0);
    }
    if let Some(t) = metrics.final_temperature {
        println!("    Final temperature:    {t:.4}");
    }
    if let Some(params) = &metrics.optimized_parameters {
        let rendered: Vec<String> = params.iter().map(|p| format!("{p:.3}")).collect();
        println!("    Parameters:           [{}]", rendered.join(", "));
    }
    if metrics.degenerate_recoveries > 0 {
        println!(
            "    Recoveries:           {}",
            style(metrics.degenerate_recoveries).yellow()
        );
    }
    println!("    Termination:          {:?}", metrics.termination);
    println!(
        "\n  Computation time: {} ms",
        style(format!("{:.2}", solution.computation_time_ms)).yellow()
    );
}
