//! Property-based tests for the LP solver
//!
//! Random models are built around a known interior point inside a finite
//! box, so every generated model is feasible and bounded.

use lpassist_solver::{solve, ConstraintOp, Model, Sense, SolutionStatus, SolveOptions, Variable};
use proptest::prelude::*;

const TOL: f64 = 1e-6;

/// A feasible, bounded model together with one point known to satisfy it.
#[derive(Debug, Clone)]
struct Generated {
    model: Model,
    witness: Vec<f64>,
}

fn op_from(tag: u8) -> ConstraintOp {
    match tag {
        0 => ConstraintOp::Le,
        1 => ConstraintOp::Ge,
        _ => ConstraintOp::Eq,
    }
}

fn generated_strategy() -> impl Strategy<Value = Generated> {
    (1usize..5, 0usize..5)
        .prop_flat_map(|(n, m)| {
            (
                prop::collection::vec((-5i32..5, 0i32..10, 0u8..=4), n),
                prop::collection::vec(-5i32..=5, n),
                prop::collection::vec((prop::collection::vec(-5i32..=5, n), 0u8..3, 0i32..5), m),
                any::<bool>(),
            )
        })
        .prop_map(|(vars, objective, rows, maximize)| {
            let mut model = Model::new();
            let mut witness = Vec::new();
            for (j, &(lower, width, quarter)) in vars.iter().enumerate() {
                let lower = f64::from(lower);
                let upper = lower + f64::from(width);
                model.add_variable(Variable::new(format!("v{j}")).with_bounds(Some(lower), Some(upper)));
                witness.push(lower + f64::from(width) * f64::from(quarter) / 4.0);
            }

            let sense = if maximize { Sense::Maximize } else { Sense::Minimize };
            model.set_objective(
                sense,
                objective.iter().enumerate().map(|(j, &c)| (format!("v{j}"), f64::from(c))),
            );

            for (i, (coefficients, tag, slack)) in rows.iter().enumerate() {
                let op = op_from(*tag);
                let activity: f64 = coefficients
                    .iter()
                    .zip(&witness)
                    .map(|(&a, &x)| f64::from(a) * x)
                    .sum();
                let rhs = match op {
                    ConstraintOp::Le => activity + f64::from(*slack),
                    ConstraintOp::Ge => activity - f64::from(*slack),
                    ConstraintOp::Eq => activity,
                };
                model.add_constraint(
                    format!("r{i}"),
                    coefficients.iter().enumerate().map(|(j, &a)| (format!("v{j}"), f64::from(a))),
                    op,
                    rhs,
                );
            }

            Generated { model, witness }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn feasible_bounded_models_are_optimal(generated in generated_strategy()) {
        let model = &generated.model;
        let solution = solve(model, &SolveOptions::default()).unwrap();
        prop_assert_eq!(solution.status, SolutionStatus::Optimal);

        let x: Vec<f64> = model
            .variables
            .iter()
            .map(|v| solution.value(&v.name).unwrap())
            .collect();

        // Bounds
        for (v, &value) in model.variables.iter().zip(&x) {
            prop_assert!(value >= v.lower_bound() - TOL, "{} = {} below {}", v.name, value, v.lower_bound());
            prop_assert!(value <= v.upper_bound() + TOL, "{} = {} above {}", v.name, value, v.upper_bound());
        }

        // Constraints
        for (i, c) in model.constraints.iter().enumerate() {
            let lhs = model.constraint_activity(i, &x);
            prop_assert!(
                c.op.holds(lhs, c.rhs, TOL * (1.0 + c.rhs.abs())),
                "{}: {} {} {} violated",
                c.name, lhs, c.op, c.rhs
            );
        }

        // Objective round-trips and is no worse than the witness
        let objective = solution.objective_value.unwrap();
        prop_assert!((objective - model.objective_value(&x)).abs() < TOL);
        let witness_objective = model.objective_value(&generated.witness);
        match model.objective.sense {
            Sense::Minimize => prop_assert!(objective <= witness_objective + TOL),
            Sense::Maximize => prop_assert!(objective >= witness_objective - TOL),
        }
    }

    #[test]
    fn repeated_solves_are_identical(generated in generated_strategy()) {
        let first = solve(&generated.model, &SolveOptions::default()).unwrap();
        let second = solve(&generated.model, &SolveOptions::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn binding_constraints_hold_with_equality(generated in generated_strategy()) {
        let model = &generated.model;
        let solution = solve(model, &SolveOptions::default()).unwrap();
        let x: Vec<f64> = model
            .variables
            .iter()
            .map(|v| solution.value(&v.name).unwrap())
            .collect();

        for &i in &solution.binding_constraints {
            let c = &model.constraints[i];
            let lhs = model.constraint_activity(i, &x);
            prop_assert!((lhs - c.rhs).abs() <= TOL * (1.0 + c.rhs.abs()));
        }
    }
}
