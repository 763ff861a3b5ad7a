//! Depth-first branch-and-bound for models with integer variables.

use log::{debug, info};

use crate::error::SolverInternalError;
use crate::model::{Model, Sense};
use crate::options::{Method, SolveOptions};
use crate::report::optimal_solution;
use crate::solution::{Solution, SolutionStatus};
use crate::solver::solve_lp;

/// A subproblem: the model with tightened bounds on some integer variables.
struct Node {
    model: Model,
    depth: usize,
}

struct Incumbent {
    values: Vec<f64>,
    /// Objective in minimization sense
    key: f64,
}

/// Solve `model` enforcing integrality of its integer variables.
pub(crate) fn branch_and_bound(model: &Model, options: &SolveOptions) -> Result<Solution, SolverInternalError> {
    let sense_sign = match model.objective.sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };
    let integer_tolerance = options.integrality_tolerance;

    let mut stack = vec![Node {
        model: model.clone(),
        depth: 0,
    }];
    let mut incumbent: Option<Incumbent> = None;
    let mut nodes = 0;
    let mut iterations = 0;

    while let Some(node) = stack.pop() {
        if nodes >= options.max_nodes {
            return Err(SolverInternalError::NodeLimit {
                limit: options.max_nodes,
            });
        }
        nodes += 1;

        let relaxation = solve_lp(&node.model, options, Method::Integer)?;
        iterations += relaxation.iterations;

        match relaxation.status {
            SolutionStatus::Optimal => {}
            SolutionStatus::Infeasible => {
                debug!("node {} (depth {}): infeasible", nodes, node.depth);
                continue;
            }
            SolutionStatus::Unbounded => {
                debug!("node {} (depth {}): unbounded relaxation", nodes, node.depth);
                let mut solution = Solution::unbounded(Method::Integer, iterations);
                solution.nodes = nodes;
                return Ok(solution);
            }
        }

        let Some(objective) = relaxation.objective_value else {
            continue;
        };
        let key = sense_sign * objective;
        if let Some(best) = &incumbent {
            if key >= best.key - options.tolerance {
                debug!("node {} (depth {}): pruned by bound {}", nodes, node.depth, objective);
                continue;
            }
        }

        let x: Vec<f64> = model
            .variables
            .iter()
            .map(|v| relaxation.value(&v.name).unwrap_or(0.0))
            .collect();

        match select_branching(model, &x, integer_tolerance) {
            Some(j) => {
                let value = x[j];
                debug!(
                    "node {} (depth {}): branching on {} = {}",
                    nodes, node.depth, model.variables[j].name, value
                );
                let (down, up) = split(&node.model, j, value);
                // Explore the down branch first
                if let Some(up) = up {
                    stack.push(Node {
                        model: up,
                        depth: node.depth + 1,
                    });
                }
                if let Some(down) = down {
                    stack.push(Node {
                        model: down,
                        depth: node.depth + 1,
                    });
                }
            }
            None => {
                let values: Vec<f64> = model
                    .variables
                    .iter()
                    .zip(&x)
                    .map(|(v, &value)| if v.is_integer() { value.round() } else { value })
                    .collect();
                let key = sense_sign * model.objective_value(&values);
                info!("new incumbent at node {}: objective {}", nodes, sense_sign * key);
                incumbent = Some(Incumbent { values, key });
            }
        }
    }

    let mut solution = match incumbent {
        Some(best) => optimal_solution(model, &best.values, options.tolerance, Method::Integer),
        None => Solution::infeasible(Method::Integer, 0),
    };
    solution.iterations = iterations;
    solution.nodes = nodes;
    Ok(solution)
}

/// Integer variable whose value is most fractional (closest to .5); ties go
/// to the lowest index.
fn select_branching(model: &Model, x: &[f64], tolerance: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, v) in model.variables.iter().enumerate() {
        if !v.is_integer() {
            continue;
        }
        let frac = x[j] - x[j].floor();
        let distance = frac.min(1.0 - frac);
        if distance <= tolerance {
            continue;
        }
        if best.is_none_or(|(_, d)| distance > d + tolerance) {
            best = Some((j, distance));
        }
    }
    best.map(|(j, _)| j)
}

/// Children `x[j] <= floor(value)` and `x[j] >= ceil(value)`; a child whose
/// bounds cross is dropped.
fn split(model: &Model, j: usize, value: f64) -> (Option<Model>, Option<Model>) {
    let var = &model.variables[j];
    let floor = value.floor();
    let ceil = value.ceil();

    let down = (var.lower_bound() <= floor).then(|| {
        let mut child = model.clone();
        let upper = child.variables[j].upper_bound().min(floor);
        child.variables[j].upper = Some(upper);
        child
    });
    let up = (var.upper_bound() >= ceil).then(|| {
        let mut child = model.clone();
        let lower = child.variables[j].lower_bound().max(ceil);
        child.variables[j].lower = Some(lower);
        child
    });
    (down, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintOp, Variable};

    #[test]
    fn test_knapsack() {
        // Maximize: 5a + 4b + 3c
        // Subject to:
        //   2a + 3b + c <= 5
        //   4a + b + 2c <= 11
        //   3a + 4b + 2c <= 8
        // Integer optimum: a=2, b=0, c=1, obj=13
        let mut model = Model::new();
        for name in ["a", "b", "c"] {
            model.add_variable(Variable::new(name).integer());
        }
        model.set_objective(Sense::Maximize, [("a", 5.0), ("b", 4.0), ("c", 3.0)]);
        model.add_constraint("r1", [("a", 2.0), ("b", 3.0), ("c", 1.0)], ConstraintOp::Le, 5.0);
        model.add_constraint("r2", [("a", 4.0), ("b", 1.0), ("c", 2.0)], ConstraintOp::Le, 11.0);
        model.add_constraint("r3", [("a", 3.0), ("b", 4.0), ("c", 2.0)], ConstraintOp::Le, 8.0);

        let solution = branch_and_bound(&model, &SolveOptions::default()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 13.0).abs() < 1e-9);
        assert_eq!(solution.value("a"), Some(2.0));
        assert_eq!(solution.value("b"), Some(0.0));
        assert_eq!(solution.value("c"), Some(1.0));
        assert!(solution.nodes >= 1);
    }

    #[test]
    fn test_fractional_relaxation_is_branched() {
        // Maximize: x + y
        // Subject to:
        //   2x + 2y <= 3
        // LP optimum is 1.5, integer optimum 1
        let mut model = Model::new();
        model.add_variable(Variable::new("x").integer());
        model.add_variable(Variable::new("y").integer());
        model.set_objective(Sense::Maximize, [("x", 1.0), ("y", 1.0)]);
        model.add_constraint("cap", [("x", 2.0), ("y", 2.0)], ConstraintOp::Le, 3.0);

        let solution = branch_and_bound(&model, &SolveOptions::default()).unwrap();
        assert!((solution.objective_value.unwrap() - 1.0).abs() < 1e-9);
        for (_, value) in solution.values.unwrap() {
            assert_eq!(value, value.round());
        }
        assert!(solution.nodes > 1);
    }

    #[test]
    fn test_mixed_integer() {
        // Minimize: x + y, x integer, y continuous
        // Subject to:
        //   x + y >= 2.5
        //   x - y >= 0.2
        let mut model = Model::new();
        model.add_variable(Variable::new("x").integer());
        model.add_variable(Variable::new("y"));
        model.set_objective(Sense::Minimize, [("x", 1.0), ("y", 1.0)]);
        model.add_constraint("sum", [("x", 1.0), ("y", 1.0)], ConstraintOp::Ge, 2.5);
        model.add_constraint("gap", [("x", 1.0), ("y", -1.0)], ConstraintOp::Ge, 0.2);

        let solution = branch_and_bound(&model, &SolveOptions::default()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        let x = solution.value("x").unwrap();
        let y = solution.value("y").unwrap();
        assert_eq!(x, x.round());
        assert!((x + y - 2.5).abs() < 1e-9, "x = {}, y = {}", x, y);
        assert!((solution.objective_value.unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_integer_point() {
        // 2x = 1 has no integral solution
        let mut model = Model::new();
        model.add_variable(Variable::new("x").integer());
        model.add_constraint("half", [("x", 2.0)], ConstraintOp::Eq, 1.0);

        let solution = branch_and_bound(&model, &SolveOptions::default()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.nodes, 3);
    }

    #[test]
    fn test_unbounded_root() {
        let mut model = Model::new();
        model.add_variable(Variable::new("x").integer());
        model.set_objective(Sense::Maximize, [("x", 1.0)]);

        let solution = branch_and_bound(&model, &SolveOptions::default()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_node_limit() {
        let mut model = Model::new();
        model.add_variable(Variable::new("x").integer());
        model.add_variable(Variable::new("y").integer());
        model.set_objective(Sense::Maximize, [("x", 1.0), ("y", 1.0)]);
        model.add_constraint("cap", [("x", 2.0), ("y", 2.0)], ConstraintOp::Le, 3.0);

        let err = branch_and_bound(&model, &SolveOptions::default().with_max_nodes(1)).unwrap_err();
        assert_eq!(err, SolverInternalError::NodeLimit { limit: 1 });
    }
}
