//! Solve command implementation.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use arvak_qopt::{ConfigOverrides, optimize};

use super::common::{
    OutputFormat, load_problem, parse_algorithm, print_solution, resolve_config, write_solution,
};

/// Arguments of the solve command.
pub struct SolveArgs<'a> {
    pub problem: &'a str,
    pub config: Option<&'a str>,
    pub algorithm: Option<&'a str>,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub time_limit_ms: Option<u64>,
    pub output: Option<&'a str>,
    pub format: &'a str,
}

/// Execute the solve command.
pub fn execute(args: &SolveArgs<'_>) -> Result<()> {
    let format = OutputFormat::parse(args.format)?;
    let problem = load_problem(args.problem)?;
    let config = resolve_config(
        args.config,
        &ConfigOverrides {
            algorithm: parse_algorithm(args.algorithm)?,
            seed: args.seed,
            iterations: args.iterations,
            time_limit_ms: args.time_limit_ms,
        },
    )?;

    // Keep stdout clean for machine-readable output.
    let chatty = format == OutputFormat::Table;
    if chatty {
        println!(
            "{} Solving {} with {}",
            style("→").cyan().bold(),
            style(&problem.id).green(),
            style(config.algorithm).yellow()
        );
        println!(
            "  Loaded: {} variables, {} objectives, {} constraints",
            problem.variables.len(),
            problem.objectives.len(),
            problem.constraints.len()
        );
        if let Some(seed) = config.seed {
            println!("  Seed: {}", style(seed).dim());
        }
    }

    let spinner = if chatty {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Running {}...", config.algorithm));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = optimize(&problem, &config);
    spinner.finish_and_clear();
    let solution = result.context("Optimisation failed")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&solution)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Table => print_solution(&solution),
    }

    if let Some(path) = args.output {
        write_solution(&solution, path)?;
        if chatty {
            println!(
                "\n{} Solution written to {}",
                style("✓").green().bold(),
                style(path).green()
            );
        }
    }

    Ok(())
}
