//! LP duality: construction of the dual model and the dual solve method.

use std::collections::HashSet;

use log::debug;

use crate::error::{ModelError, SolveResult};
use crate::model::{ConstraintOp, Model, Sense, Variable};
use crate::options::{Method, SolveOptions};
use crate::solution::{Solution, SolutionStatus};
use crate::solver::solve_lp;

/// A primal row: original constraints first, then explicit bound rows.
struct PrimalRow {
    name: String,
    coefficients: Vec<(usize, f64)>,
    op: ConstraintOp,
    rhs: f64,
}

/// Build the LP dual of a model.
///
/// Finite non-zero lower bounds and finite upper bounds become explicit
/// primal rows, so a variable is either sign-restricted (`x >= 0`) or free.
/// Dual variables are named `y_<row>` and are listed in row order: first one
/// per constraint, then `y_<var>_lo` / `y_<var>_up` per bound row. The dual
/// has one constraint per primal variable, named after it. Integrality is
/// ignored.
pub fn dual_model(model: &Model) -> Result<Model, ModelError> {
    model.validate()?;
    let index = model.variable_index();

    let mut rows = Vec::new();
    for (i, c) in model.constraints.iter().enumerate() {
        rows.push(PrimalRow {
            name: c.label(i),
            coefficients: c.terms.iter().map(|(name, coef)| (index[name.as_str()], *coef)).collect(),
            op: c.op,
            rhs: c.rhs,
        });
    }

    let mut sign_restricted = vec![false; model.num_variables()];
    for (j, v) in model.variables.iter().enumerate() {
        let lower = v.lower_bound();
        let upper = v.upper_bound();
        if lower == 0.0 {
            sign_restricted[j] = true;
        } else if lower.is_finite() {
            rows.push(PrimalRow {
                name: format!("{}_lo", v.name),
                coefficients: vec![(j, 1.0)],
                op: ConstraintOp::Ge,
                rhs: lower,
            });
        }
        if upper.is_finite() {
            rows.push(PrimalRow {
                name: format!("{}_up", v.name),
                coefficients: vec![(j, 1.0)],
                op: ConstraintOp::Le,
                rhs: upper,
            });
        }
    }

    // For a minimization primal, >= rows have non-negative duals; maximization
    // mirrors every sign
    let primal_sense = model.objective.sense;
    let mut dual = Model::new();
    let mut taken = HashSet::new();
    let mut dual_names = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = fresh_name(&format!("y_{}", row.name), &mut taken);
        let nonneg = matches!(
            (primal_sense, row.op),
            (Sense::Minimize, ConstraintOp::Ge) | (Sense::Maximize, ConstraintOp::Le)
        );
        let variable = match row.op {
            ConstraintOp::Eq => Variable::free(name.clone()),
            _ if nonneg => Variable::new(name.clone()),
            _ => Variable::free(name.clone()).with_bounds(None, Some(0.0)),
        };
        dual.add_variable(variable);
        dual_names.push(name);
    }

    let dual_sense = match primal_sense {
        Sense::Minimize => Sense::Maximize,
        Sense::Maximize => Sense::Minimize,
    };
    dual.set_objective(
        dual_sense,
        dual_names.iter().cloned().zip(rows.iter().map(|r| r.rhs)),
    );

    let mut costs = vec![0.0; model.num_variables()];
    for (name, coef) in &model.objective.terms {
        costs[index[name.as_str()]] += coef;
    }

    for (j, v) in model.variables.iter().enumerate() {
        let terms: Vec<(String, f64)> = rows
            .iter()
            .zip(&dual_names)
            .flat_map(|(row, y)| {
                row.coefficients
                    .iter()
                    .filter(move |(col, _)| *col == j)
                    .map(move |(_, coef)| (y.clone(), *coef))
            })
            .collect();
        let op = match (sign_restricted[j], primal_sense) {
            (false, _) => ConstraintOp::Eq,
            (true, Sense::Minimize) => ConstraintOp::Le,
            (true, Sense::Maximize) => ConstraintOp::Ge,
        };
        dual.add_constraint(v.name.clone(), terms, op, costs[j]);
    }

    Ok(dual)
}

/// Solve the dual of a validated model.
///
/// On success the solution describes the dual: its values are the dual
/// variables and its binding constraints index the dual's rows. When the dual
/// has no optimum the primal is solved to classify the model, and its
/// status is reported without values.
pub(crate) fn solve_dual(model: &Model, options: &SolveOptions) -> SolveResult<Solution> {
    let continuous = continuous_copy(model);
    let dual = dual_model(&continuous)?;
    debug!(
        "dual model: {} variables, {} constraints",
        dual.num_variables(),
        dual.num_constraints()
    );

    let solution = solve_lp(&dual, options, Method::Dual)?;
    if solution.status == SolutionStatus::Optimal {
        return Ok(solution);
    }

    let primal = solve_lp(&continuous, options, Method::Dual)?;
    let iterations = solution.iterations + primal.iterations;
    Ok(match primal.status {
        SolutionStatus::Unbounded => Solution::unbounded(Method::Dual, iterations),
        _ => Solution::infeasible(Method::Dual, iterations),
    })
}

fn continuous_copy(model: &Model) -> Model {
    let mut copy = model.clone();
    for v in &mut copy.variables {
        v.kind = Default::default();
    }
    copy
}

fn fresh_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut suffix = 2;
    while taken.contains(&name) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    taken.insert(name.clone());
    name
}
