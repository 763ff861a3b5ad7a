//! Translation of engine output back into the original model's terms.

use std::collections::BTreeMap;

use crate::model::{ConstraintOp, Model};
use crate::options::Method;
use crate::simplex::{EngineOutput, Optimum, Verdict};
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution, SolutionStatus};
use crate::standard::{CanonicalModel, ColumnOrigin, RowOrigin};

/// Assemble the [`Solution`] for one LP solve.
pub(crate) fn report(
    model: &Model,
    canonical: &CanonicalModel,
    output: EngineOutput,
    tolerance: f64,
    method: Method,
) -> Solution {
    let optimum = match output.verdict {
        Verdict::Optimal(optimum) => optimum,
        Verdict::Infeasible => return Solution::infeasible(method, output.iterations),
        Verdict::Unbounded => return Solution::unbounded(method, output.iterations),
    };

    let x = recover_values(model, canonical, &optimum, tolerance);
    let analysis = analyze(model, canonical, &optimum, &x, tolerance);

    let mut solution = optimal_solution(model, &x, tolerance, method);
    solution.analysis = Some(analysis);
    solution.iterations = output.iterations;
    solution
}

/// An optimal [`Solution`] for a dense point in the model's column order.
///
/// The objective is evaluated at `x` directly, so it always agrees with the
/// reported values.
pub(crate) fn optimal_solution(model: &Model, x: &[f64], tolerance: f64, method: Method) -> Solution {
    let values: BTreeMap<String, f64> = model
        .variables
        .iter()
        .zip(x)
        .map(|(v, &value)| (v.name.clone(), value))
        .collect();

    Solution {
        status: SolutionStatus::Optimal,
        method,
        objective_value: Some(clean(model.objective_value(x), tolerance)),
        values: Some(values),
        binding_constraints: binding_constraints(model, x, tolerance),
        analysis: None,
        violations: Vec::new(),
        iterations: 0,
        nodes: 0,
    }
}

/// Undo every substitution made by the standardizer.
pub(crate) fn recover_values(model: &Model, canonical: &CanonicalModel, optimum: &Optimum, tolerance: f64) -> Vec<f64> {
    let mut x = vec![0.0; model.num_variables()];
    for (col, origin) in canonical.columns.iter().enumerate() {
        let v = optimum.values[col];
        match *origin {
            ColumnOrigin::Shifted { var, offset } => x[var] = offset + v,
            ColumnOrigin::Mirrored { var, offset } => x[var] = offset - v,
            ColumnOrigin::Positive { var } => x[var] += v,
            ColumnOrigin::Negative { var } => x[var] -= v,
            ColumnOrigin::Slack { .. } | ColumnOrigin::Surplus { .. } | ColumnOrigin::Artificial { .. } => {}
        }
    }
    x.into_iter().map(|v| clean(v, tolerance)).collect()
}

/// Constraints that hold with equality at `x`. Equalities are always binding.
pub(crate) fn binding_constraints(model: &Model, x: &[f64], tolerance: f64) -> Vec<usize> {
    model
        .constraints
        .iter()
        .zip(model.activities(x))
        .enumerate()
        .filter(|(_, (c, lhs))| {
            c.op == ConstraintOp::Eq || (lhs - c.rhs).abs() <= tolerance * c.rhs.abs().max(1.0)
        })
        .map(|(i, _)| i)
        .collect()
}

fn analyze(model: &Model, canonical: &CanonicalModel, optimum: &Optimum, x: &[f64], tolerance: f64) -> Analysis {
    let sense_sign = canonical.sense_sign();

    // Shadow prices: the dual of each canonical row is minus the reduced cost
    // of its seed column, which started as the row's unit vector with zero cost
    let mut shadow_prices = Vec::new();
    for info in &canonical.rows {
        let RowOrigin::Constraint(i) = info.origin else {
            continue;
        };
        let row_sign = if info.negated { -1.0 } else { 1.0 };
        let dual = -optimum.reduced_costs[info.seed];
        shadow_prices.push(ShadowPrice {
            constraint: i,
            name: model.constraints[i].label(i),
            value: clean(sense_sign * row_sign * dual, tolerance),
        });
    }

    // The dual of an upper-bound row is part of its variable's reduced cost
    let mut bound_dual = vec![0.0; model.num_variables()];
    let mut below_bound = vec![true; model.num_variables()];
    for info in &canonical.rows {
        if let RowOrigin::UpperBound(var) = info.origin {
            bound_dual[var] = -optimum.reduced_costs[info.seed];
            below_bound[var] = optimum.is_basic[info.seed];
        }
    }

    let mut reduced = vec![0.0; model.num_variables()];
    let mut is_basic = vec![false; model.num_variables()];
    for (col, origin) in canonical.columns.iter().enumerate() {
        let d = optimum.reduced_costs[col];
        let (var, rc) = match *origin {
            ColumnOrigin::Shifted { var, .. } => {
                reduced[var] = clean(sense_sign * (d + bound_dual[var]), tolerance);
                is_basic[var] = optimum.is_basic[col] && below_bound[var];
                continue;
            }
            ColumnOrigin::Positive { var } => (var, d),
            ColumnOrigin::Mirrored { var, .. } => (var, -d),
            ColumnOrigin::Negative { var } => {
                is_basic[var] |= optimum.is_basic[col];
                continue;
            }
            _ => continue,
        };
        reduced[var] = clean(sense_sign * rc, tolerance);
        is_basic[var] |= optimum.is_basic[col];
    }

    let reduced_costs = model
        .variables
        .iter()
        .enumerate()
        .map(|(j, v)| ReducedCost {
            variable: v.name.clone(),
            value: x[j],
            reduced_cost: reduced[j],
            is_basic: is_basic[j],
        })
        .collect();

    Analysis {
        shadow_prices,
        reduced_costs,
    }
}

/// Snap values within `tolerance` of zero to exactly zero.
pub(crate) fn clean(v: f64, tolerance: f64) -> f64 {
    if v.abs() < tolerance { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sense, Variable};
    use crate::options::SolveOptions;
    use crate::simplex::Simplex;
    use crate::standard::standardize;

    fn solve(model: &Model) -> Solution {
        let options = SolveOptions::default();
        let canonical = standardize(model);
        let output = Simplex::new(&options, &canonical).solve(&canonical).unwrap();
        report(model, &canonical, output, options.tolerance, Method::Simplex)
    }

    #[test]
    fn test_shadow_prices_and_binding() {
        // Maximize 3x + 2y, x + y <= 4 binds with shadow price 3
        let model = Model::from_dense(
            Sense::Maximize,
            &[3.0, 2.0],
            &[vec![1.0, 1.0], vec![1.0, 3.0]],
            &[ConstraintOp::Le, ConstraintOp::Le],
            &[4.0, 6.0],
        )
        .unwrap();
        let solution = solve(&model);

        assert_eq!(solution.binding_constraints, vec![0]);
        let analysis = solution.analysis.unwrap();
        assert!((analysis.shadow_prices[0].value - 3.0).abs() < 1e-9);
        assert_eq!(analysis.shadow_prices[1].value, 0.0);
        assert_eq!(analysis.shadow_prices[1].name, "c2");

        // y is non-basic: raising it by one unit costs 3 - 2 = 1
        let y = &analysis.reduced_costs[1];
        assert!(!y.is_basic);
        assert!((y.reduced_cost + 1.0).abs() < 1e-9, "reduced cost = {}", y.reduced_cost);
        assert!(analysis.reduced_costs[0].is_basic);
    }

    #[test]
    fn test_shadow_price_of_negated_row() {
        // min x s.t. -x <= -2 (i.e. x >= 2); relaxing the rhs by +1 lowers x by 1
        let mut model = Model::new();
        model.add_variable(Variable::new("x"));
        model.set_objective(Sense::Minimize, [("x", 1.0)]);
        model.add_constraint("neg", [("x", -1.0)], ConstraintOp::Le, -2.0);
        let solution = solve(&model);

        assert_eq!(solution.value("x"), Some(2.0));
        let analysis = solution.analysis.unwrap();
        assert!((analysis.shadow_prices[0].value + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovers_substituted_variables() {
        // min a - b + f with a in [2, 5], b <= 4, f free and f >= -3
        let mut model = Model::new();
        model.add_variable(Variable::new("a").with_bounds(Some(2.0), Some(5.0)));
        model.add_variable(Variable::new("b").with_bounds(None, Some(4.0)));
        model.add_variable(Variable::free("f"));
        model.set_objective(Sense::Minimize, [("a", 1.0), ("b", -1.0), ("f", 1.0)]);
        model.add_constraint("f_floor", [("f", 1.0)], ConstraintOp::Ge, -3.0);
        let solution = solve(&model);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.value("a").unwrap() - 2.0).abs() < 1e-9);
        assert!((solution.value("b").unwrap() - 4.0).abs() < 1e-9);
        assert!((solution.value("f").unwrap() + 3.0).abs() < 1e-9);
        assert!((solution.objective_value.unwrap() + 5.0).abs() < 1e-9);
        assert_eq!(solution.binding_constraints, vec![0]);
    }

    #[test]
    fn test_reduced_cost_of_variable_at_upper_bound() {
        // Maximize 3x + 2y with x in [0, 2] and x + y <= 4: x = 2, y = 2.
        // Lifting the bound on x by one unit gains 3 - 2 = 1
        let mut model = Model::new();
        model.add_variable(Variable::new("x").with_bounds(Some(0.0), Some(2.0)));
        model.add_variable(Variable::new("y"));
        model.set_objective(Sense::Maximize, [("x", 3.0), ("y", 2.0)]);
        model.add_constraint("cap", [("x", 1.0), ("y", 1.0)], ConstraintOp::Le, 4.0);
        let solution = solve(&model);

        assert!((solution.objective_value.unwrap() - 10.0).abs() < 1e-9);
        let analysis = solution.analysis.unwrap();
        assert!((analysis.shadow_prices[0].value - 2.0).abs() < 1e-9);

        let x = &analysis.reduced_costs[0];
        assert!((x.value - 2.0).abs() < 1e-9);
        assert!(!x.is_basic);
        assert!((x.reduced_cost - 1.0).abs() < 1e-9, "reduced cost = {}", x.reduced_cost);

        let y = &analysis.reduced_costs[1];
        assert!(y.is_basic);
        assert_eq!(y.reduced_cost, 0.0);
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(1e-12, 1e-9), 0.0);
        assert_eq!(clean(-0.0, 1e-9).to_bits(), 0.0f64.to_bits());
        assert_eq!(clean(0.5, 1e-9), 0.5);
    }
}
