//! Elastic relaxation: every constraint may be violated at a penalty.

use std::collections::HashSet;

use log::debug;

use crate::branch::branch_and_bound;
use crate::error::SolverInternalError;
use crate::model::{ConstraintOp, Model, Sense, Variable};
use crate::options::{Method, SolveOptions};
use crate::report::optimal_solution;
use crate::solution::{ConstraintViolation, Solution, SolutionStatus};
use crate::solver::solve_lp;

/// Weight of one unit of constraint violation in the relaxed objective.
fn penalty_weight(model: &Model) -> f64 {
    let total: f64 = model.objective.terms.iter().map(|(_, c)| c.abs()).sum();
    (10.0 * total).max(10.0)
}

/// Copy of `model` where each constraint gains non-negative elastic
/// variables absorbing its violation, penalized in the objective.
fn elastic_model(model: &Model) -> Model {
    let mut elastic = model.clone();
    let mut taken: HashSet<String> = model.variables.iter().map(|v| v.name.clone()).collect();
    let weight = match model.objective.sense {
        Sense::Minimize => penalty_weight(model),
        Sense::Maximize => -penalty_weight(model),
    };

    for (i, constraint) in elastic.constraints.iter_mut().enumerate() {
        let label = constraint.label(i);
        // Slack in the direction that would satisfy the constraint
        let directions: &[f64] = match constraint.op {
            ConstraintOp::Le => &[-1.0],
            ConstraintOp::Ge => &[1.0],
            ConstraintOp::Eq => &[1.0, -1.0],
        };
        for &direction in directions {
            let suffix = if direction > 0.0 { "under" } else { "over" };
            let mut name = format!("{label}_{suffix}");
            while !taken.insert(name.clone()) {
                name.push('_');
            }
            constraint.terms.push((name.clone(), direction));
            elastic.objective.terms.push((name.clone(), weight));
            elastic.variables.push(Variable::new(name));
        }
    }
    elastic
}

/// Solve the elastic relaxation of a validated model and report every
/// constraint it violates, worst first.
pub(crate) fn solve_relaxed(model: &Model, options: &SolveOptions) -> Result<Solution, SolverInternalError> {
    let elastic = elastic_model(model);
    debug!(
        "elastic model: {} variables ({} elastic), penalty weight {}",
        elastic.num_variables(),
        elastic.num_variables() - model.num_variables(),
        penalty_weight(model),
    );

    let inner = if elastic.has_integer_variables() {
        branch_and_bound(&elastic, options)?
    } else {
        solve_lp(&elastic, options, Method::Relaxed)?
    };

    match inner.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Unbounded => return Ok(Solution::unbounded(Method::Relaxed, inner.iterations)),
        // Always feasible; the elastic variables absorb every violation
        SolutionStatus::Infeasible => return Ok(Solution::infeasible(Method::Relaxed, inner.iterations)),
    }

    let x: Vec<f64> = model
        .variables
        .iter()
        .map(|v| inner.value(&v.name).unwrap_or(0.0))
        .collect();

    let mut solution = optimal_solution(model, &x, options.tolerance, Method::Relaxed);
    solution.violations = find_violations(model, &x, options.tolerance);
    // A violated equality does not hold with equality
    solution
        .binding_constraints
        .retain(|i| solution.violations.iter().all(|v| v.constraint != *i));
    solution.iterations = inner.iterations;
    solution.nodes = inner.nodes;
    Ok(solution)
}

/// Find which constraints are violated by a given point
fn find_violations(model: &Model, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for (i, (c, lhs)) in model.constraints.iter().zip(model.activities(values)).enumerate() {
        let scaled = tolerance * c.rhs.abs().max(1.0);

        let violation_amount = match c.op {
            ConstraintOp::Le => lhs - c.rhs,
            ConstraintOp::Ge => c.rhs - lhs,
            ConstraintOp::Eq => (lhs - c.rhs).abs(),
        };

        if violation_amount > scaled {
            violations.push(ConstraintViolation {
                constraint: i,
                name: c.label(i),
                required: c.rhs,
                actual: lhs,
                violation_amount,
            });
        }
    }

    // Sort by violation amount (worst first)
    violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

    violations
}
