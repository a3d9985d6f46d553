//! Validate command implementation.
//!
//! Structural checks only: nothing is solved.

use anyhow::Result;
use console::style;

use arvak_qopt::{ConfigOverrides, VariableKind};

use super::common::{load_problem, resolve_config};

/// Execute the validate command.
pub fn execute(problem_path: &str, config_path: Option<&str>) -> Result<()> {
    let problem = load_problem(problem_path)?;

    let count = |kind: VariableKind| problem.variables.iter().filter(|v| v.kind == kind).count();
    println!(
        "{} Problem {} is valid",
        style("✓").green().bold(),
        style(&problem.id).green()
    );
    println!(
        "  Variables: {} ({} continuous, {} discrete, {} binary)",
        problem.variables.len(),
        count(VariableKind::Continuous),
        count(VariableKind::Discrete),
        count(VariableKind::Binary)
    );
    println!("  Objectives: {}", problem.objectives.len());
    println!("  Constraints: {}", problem.constraints.len());

    if let Some(path) = config_path {
        let config = resolve_config(Some(path), &ConfigOverrides::default())?;
        println!(
            "{} Config {} is valid ({}, statevector dimension {})",
            style("✓").green().bold(),
            style(path).green(),
            style(config.algorithm).yellow(),
            config.dimensions_for(&problem)
        );
    }

    Ok(())
}
