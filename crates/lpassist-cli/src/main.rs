use clap::{Parser, Subcommand, ValueEnum};
use lpassist_solver::{ConstraintOp, Method, Model, SolutionStatus, SolveError, SolveOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lpassist")]
#[command(about = "Solve linear programming models described in JSON", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model and print the solution
    Solve {
        /// The JSON model file
        file: PathBuf,
        /// Solution method
        #[arg(short, long, value_enum, default_value_t = MethodArg::Auto)]
        method: MethodArg,
        /// Tolerance for floating point comparisons
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
        /// Pivot limit (derived from the model size when omitted)
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        /// Show shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
    },
    /// Check a model file for errors
    Check {
        /// The JSON model file
        file: PathBuf,
    },
    /// Print the dual of a model as JSON
    Dual {
        /// The JSON model file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Simplex,
    Integer,
    Dual,
    Relaxed,
    Auto,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Simplex => Method::Simplex,
            MethodArg::Integer => Method::Integer,
            MethodArg::Dual => Method::Dual,
            MethodArg::Relaxed => Method::Relaxed,
            MethodArg::Auto => Method::Auto,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Solve {
            file,
            method,
            tolerance,
            max_iterations,
            format,
            analysis,
        } => {
            let model = load_model(&file);

            let mut options = SolveOptions::new()
                .with_tolerance(tolerance)
                .with_method(method.into());
            if let Some(max) = max_iterations {
                options = options.with_max_iterations(max);
            }

            let solution = match lpassist_solver::solve(&model, &options) {
                Ok(s) => s,
                Err(SolveError::Model(e)) => {
                    eprintln!("Invalid model: {}", e);
                    std::process::exit(1);
                }
                Err(SolveError::Internal(e)) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            };

            if format == OutputFormat::Json {
                match serde_json::to_string_pretty(&solution) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing solution: {}", e);
                        std::process::exit(1);
                    }
                }
                if !solution.is_optimal() {
                    std::process::exit(1);
                }
                return;
            }

            println!("Model: {}", file.display());
            println!("Method: {}", solution.method);
            println!("Status: {}", solution.status);

            match solution.status {
                SolutionStatus::Optimal => {
                    if let Some(objective) = solution.objective_value {
                        println!("Objective: {:.4}", objective);
                    }
                    println!();
                    println!("Variables:");
                    if solution.method == Method::Dual {
                        // values of the dual model's variables
                        for (name, value) in solution.values.iter().flatten() {
                            println!("  {:20} {:12.4}", name, value);
                        }
                    } else {
                        for v in &model.variables {
                            if let Some(value) = solution.value(&v.name) {
                                println!("  {:20} {:12.4}", v.name, value);
                            }
                        }
                    }

                    if !solution.binding_constraints.is_empty() && solution.method != Method::Dual {
                        println!();
                        println!("Binding constraints:");
                        for &i in &solution.binding_constraints {
                            println!("  - {}", model.constraints[i].label(i));
                        }
                    }

                    if !solution.violations.is_empty() {
                        println!();
                        println!("Violated constraints:");
                        for v in &solution.violations {
                            println!(
                                "  {:20} required {:.4}, got {:.4} (off by {:.4})",
                                v.name, v.required, v.actual, v.violation_amount
                            );
                        }
                    }

                    if analysis {
                        if let Some(ref analysis) = solution.analysis {
                            println!();
                            println!("Shadow prices:");
                            for sp in &analysis.shadow_prices {
                                println!("  {:20} {:12.4}", sp.name, sp.value);
                            }
                            println!();
                            println!("Reduced costs:");
                            for rc in &analysis.reduced_costs {
                                let marker = if rc.is_basic { " (basic)" } else { "" };
                                println!("  {:20} {:12.4}{}", rc.variable, rc.reduced_cost, marker);
                            }
                        }
                    }

                    if solution.nodes > 0 {
                        println!();
                        println!("Branch-and-bound nodes: {}", solution.nodes);
                    }
                    println!("Simplex iterations: {}", solution.iterations);
                }
                SolutionStatus::Infeasible => {
                    println!("No solution exists that satisfies all constraints.");
                    std::process::exit(1);
                }
                SolutionStatus::Unbounded => {
                    println!("The problem has no finite optimal solution.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let model = load_model(&file);

            match model.validate() {
                Ok(()) => {
                    let integer = model.variables.iter().filter(|v| v.is_integer()).count();
                    let count = |op: ConstraintOp| model.constraints.iter().filter(|c| c.op == op).count();

                    println!("✓ {} is valid", file.display());
                    println!("  {} variables ({} integer)", model.num_variables(), integer);
                    println!(
                        "  {} constraints ({} <=, {} >=, {} =)",
                        model.num_constraints(),
                        count(ConstraintOp::Le),
                        count(ConstraintOp::Ge),
                        count(ConstraintOp::Eq)
                    );
                    println!("  objective: {:?}", model.objective.sense);
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Dual { file } => {
            let model = load_model(&file);

            let dual = match lpassist_solver::dual_model(&model) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Invalid model: {}", e);
                    std::process::exit(1);
                }
            };
            match serde_json::to_string_pretty(&dual) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing dual model: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn load_model(file: &Path) -> Model {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str::<Model>(&source) {
        Ok(model) => {
            log::debug!(
                "loaded {}: {} variables, {} constraints",
                file.display(),
                model.num_variables(),
                model.num_constraints()
            );
            model
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}
