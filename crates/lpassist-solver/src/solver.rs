use log::debug;

use crate::branch::branch_and_bound;
use crate::dual::solve_dual;
use crate::error::{SolveResult, SolverInternalError};
use crate::model::Model;
use crate::options::{Method, SolveOptions};
use crate::relax::solve_relaxed;
use crate::report::report;
use crate::simplex::Simplex;
use crate::solution::Solution;
use crate::standard::standardize;

/// Validate `model` and solve it with `options.method`.
///
/// Infeasible and unbounded models are ordinary results, reported through
/// [`Solution::status`]. Errors are reserved for invalid models and for
/// engine failures such as exhausting the iteration cap.
///
/// `Method::Simplex` solves the continuous relaxation and ignores variable
/// kinds; use `Method::Integer` (or `Method::Auto`) to enforce integrality.
pub fn solve(model: &Model, options: &SolveOptions) -> SolveResult<Solution> {
    model.validate()?;

    let method = options.method.resolve(model.has_integer_variables());
    debug!(
        "solving {} variables, {} constraints with {} method",
        model.num_variables(),
        model.num_constraints(),
        method,
    );

    let solution = match method {
        Method::Integer => branch_and_bound(model, options)?,
        Method::Dual => solve_dual(model, options)?,
        Method::Relaxed => solve_relaxed(model, options)?,
        Method::Simplex | Method::Auto => solve_lp(model, options, Method::Simplex)?,
    };
    Ok(solution)
}

/// Run the standardize → simplex → report pipeline on a validated model.
pub(crate) fn solve_lp(model: &Model, options: &SolveOptions, method: Method) -> Result<Solution, SolverInternalError> {
    let canonical = standardize(model);
    let output = Simplex::new(options, &canonical).solve(&canonical)?;
    Ok(report(model, &canonical, output, options.tolerance, method))
}
