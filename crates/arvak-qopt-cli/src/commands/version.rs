//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum-inspired optimisation on a classical statevector",
        style("Arvak QOpt").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Algorithms:");
    println!("  annealing      Simulated quantum annealing with tunnelling acceptance");
    println!("  qaoa           QAOA analogue with variational parameter tuning");
    println!("  quantum_walk   Coined quantum walk with neighbour interference");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/hiq-lab/arvak").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
