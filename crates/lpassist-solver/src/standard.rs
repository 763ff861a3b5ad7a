//! Conversion of a [`Model`] into equality standard form.
//!
//! The canonical form minimizes `c·x + offset` subject to `A x = b`, `x >= 0`,
//! `b >= 0`, where every row owns a seed column (a slack or an artificial)
//! that is the identity column for that row. Columns are laid out as
//! structural columns in variable order, then slack/surplus columns in row
//! order, then artificial columns in row order.

use crate::model::{ConstraintOp, Model, Sense};

/// Where a canonical column comes from, and how to map it back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ColumnOrigin {
    /// `x[var] = offset + column`
    Shifted { var: usize, offset: f64 },
    /// `x[var] = offset - column`
    Mirrored { var: usize, offset: f64 },
    /// Positive part of a free variable
    Positive { var: usize },
    /// Negative part of a free variable
    Negative { var: usize },
    Slack { row: usize },
    Surplus { row: usize },
    Artificial { row: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowOrigin {
    /// Index into `Model::constraints`
    Constraint(usize),
    /// Finite upper bound of the variable with this index
    UpperBound(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct RowInfo {
    pub origin: RowOrigin,
    /// The row was multiplied by -1 to make its right-hand side non-negative
    pub negated: bool,
    /// Column holding the identity entry for this row in the initial basis
    pub seed: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct CanonicalModel {
    /// Dense constraint matrix, one row per canonical row
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    /// Minimization costs, zero for slack and artificial columns
    pub c: Vec<f64>,
    /// Constant term of the canonical objective
    pub offset: f64,
    pub columns: Vec<ColumnOrigin>,
    pub rows: Vec<RowInfo>,
    /// Index of the first artificial column (== number of columns when none)
    pub artificial_start: usize,
    pub sense: Sense,
}

impl CanonicalModel {
    pub fn num_rows(&self) -> usize {
        self.a.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn has_artificial(&self) -> bool {
        self.artificial_start < self.columns.len()
    }

    /// +1 for minimization, -1 for maximization.
    pub fn sense_sign(&self) -> f64 {
        match self.sense {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        }
    }
}

/// Expression of an original variable in terms of structural columns.
struct Substitution {
    offset: f64,
    columns: Vec<(usize, f64)>,
}

/// Build the canonical form of a validated model.
pub(crate) fn standardize(model: &Model) -> CanonicalModel {
    let index = model.variable_index();
    let sense_sign = match model.objective.sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };

    // Structural columns
    let mut columns = Vec::new();
    let mut substitutions = Vec::with_capacity(model.num_variables());
    for (j, v) in model.variables.iter().enumerate() {
        let lower = v.lower_bound();
        let upper = v.upper_bound();
        let col = columns.len();
        if lower.is_finite() {
            columns.push(ColumnOrigin::Shifted { var: j, offset: lower });
            substitutions.push(Substitution {
                offset: lower,
                columns: vec![(col, 1.0)],
            });
        } else if upper.is_finite() {
            columns.push(ColumnOrigin::Mirrored { var: j, offset: upper });
            substitutions.push(Substitution {
                offset: upper,
                columns: vec![(col, -1.0)],
            });
        } else {
            columns.push(ColumnOrigin::Positive { var: j });
            columns.push(ColumnOrigin::Negative { var: j });
            substitutions.push(Substitution {
                offset: 0.0,
                columns: vec![(col, 1.0), (col + 1, -1.0)],
            });
        }
    }
    let n_structural = columns.len();

    // Rows over structural columns, before slacks
    let mut rows: Vec<(RowOrigin, ConstraintOp, Vec<f64>, f64)> = Vec::new();
    for (i, constraint) in model.constraints.iter().enumerate() {
        let mut coefficients = vec![0.0; n_structural];
        let mut rhs = constraint.rhs;
        for (name, coef) in &constraint.terms {
            let sub = &substitutions[index[name.as_str()]];
            for &(col, sign) in &sub.columns {
                coefficients[col] += coef * sign;
            }
            rhs -= coef * sub.offset;
        }
        rows.push((RowOrigin::Constraint(i), constraint.op, coefficients, rhs));
    }
    for (j, v) in model.variables.iter().enumerate() {
        let lower = v.lower_bound();
        let upper = v.upper_bound();
        if lower.is_finite() && upper.is_finite() {
            let mut coefficients = vec![0.0; n_structural];
            coefficients[substitutions[j].columns[0].0] = 1.0;
            rows.push((RowOrigin::UpperBound(j), ConstraintOp::Le, coefficients, upper - lower));
        }
    }

    // Objective
    let mut c = vec![0.0; n_structural];
    let mut offset = 0.0;
    for (name, coef) in &model.objective.terms {
        let sub = &substitutions[index[name.as_str()]];
        for &(col, sign) in &sub.columns {
            c[col] += sense_sign * coef * sign;
        }
        offset += sense_sign * coef * sub.offset;
    }

    // Slack and surplus columns
    let mut slack_of_row = vec![None; rows.len()];
    for (r, (_, op, _, _)) in rows.iter().enumerate() {
        match op {
            ConstraintOp::Le => {
                slack_of_row[r] = Some((columns.len(), 1.0));
                columns.push(ColumnOrigin::Slack { row: r });
            }
            ConstraintOp::Ge => {
                slack_of_row[r] = Some((columns.len(), -1.0));
                columns.push(ColumnOrigin::Surplus { row: r });
            }
            ConstraintOp::Eq => {}
        }
    }
    let artificial_start = columns.len();

    // Sign normalization, then artificials for rows without an identity column
    let mut negated = vec![false; rows.len()];
    let mut seeds = vec![0; rows.len()];
    for (r, (_, _, _, rhs)) in rows.iter().enumerate() {
        negated[r] = *rhs < 0.0;
        let sign = if negated[r] { -1.0 } else { 1.0 };
        match slack_of_row[r] {
            Some((col, coef)) if coef * sign > 0.0 => seeds[r] = col,
            _ => {
                seeds[r] = columns.len();
                columns.push(ColumnOrigin::Artificial { row: r });
            }
        }
    }

    let n_cols = columns.len();
    c.resize(n_cols, 0.0);

    let mut a = Vec::with_capacity(rows.len());
    let mut b = Vec::with_capacity(rows.len());
    let mut infos = Vec::with_capacity(rows.len());
    for (r, (origin, _, coefficients, rhs)) in rows.into_iter().enumerate() {
        let sign = if negated[r] { -1.0 } else { 1.0 };
        let mut row = vec![0.0; n_cols];
        for (col, coef) in coefficients.into_iter().enumerate() {
            row[col] = sign * coef;
        }
        if let Some((col, coef)) = slack_of_row[r] {
            row[col] = sign * coef;
        }
        if seeds[r] >= artificial_start {
            row[seeds[r]] = 1.0;
        }
        a.push(row);
        b.push(sign * rhs);
        infos.push(RowInfo {
            origin,
            negated: negated[r],
            seed: seeds[r],
        });
    }

    CanonicalModel {
        a,
        b,
        c,
        offset,
        columns,
        rows: infos,
        artificial_start,
        sense: model.objective.sense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    #[test]
    fn test_le_rows_use_slack_seeds() {
        let model = Model::from_dense(
            Sense::Maximize,
            &[3.0, 2.0],
            &[vec![1.0, 1.0], vec![1.0, 3.0]],
            &[ConstraintOp::Le, ConstraintOp::Le],
            &[4.0, 6.0],
        )
        .unwrap();
        let canonical = standardize(&model);

        assert_eq!(canonical.num_rows(), 2);
        assert_eq!(canonical.num_columns(), 4);
        assert!(!canonical.has_artificial());
        assert_eq!(canonical.c, vec![-3.0, -2.0, 0.0, 0.0]);
        assert_eq!(canonical.rows[0].seed, 2);
        assert_eq!(canonical.rows[1].seed, 3);
        assert_eq!(canonical.a[1], vec![1.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ge_and_eq_rows_get_artificials() {
        let mut model = Model::new();
        model.add_variable(Variable::new("x"));
        model.add_variable(Variable::new("y"));
        model.set_objective(Sense::Minimize, [("x", 1.0), ("y", 1.0)]);
        model.add_constraint("ge", [("x", 1.0), ("y", 1.0)], ConstraintOp::Ge, 10.0);
        model.add_constraint("eq", [("x", 1.0)], ConstraintOp::Eq, 2.0);
        let canonical = standardize(&model);

        // x, y, surplus, two artificials
        assert_eq!(canonical.num_columns(), 5);
        assert_eq!(canonical.artificial_start, 3);
        assert_eq!(canonical.a[0], vec![1.0, 1.0, -1.0, 1.0, 0.0]);
        assert_eq!(canonical.a[1], vec![1.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(canonical.columns[4], ColumnOrigin::Artificial { row: 1 });
    }

    #[test]
    fn test_negative_rhs_flips_row() {
        let mut model = Model::new();
        model.add_variable(Variable::new("x"));
        model.add_constraint("neg", [("x", -1.0)], ConstraintOp::Ge, -3.0);
        let canonical = standardize(&model);

        // -x - s = -3 becomes x + s = 3, so the surplus is an identity column
        assert!(canonical.rows[0].negated);
        assert!(!canonical.has_artificial());
        assert_eq!(canonical.a[0], vec![1.0, 1.0]);
        assert_eq!(canonical.b[0], 3.0);
        assert_eq!(canonical.rows[0].seed, 1);
    }

    #[test]
    fn test_bound_substitutions() {
        let mut model = Model::new();
        model.add_variable(Variable::new("shifted").with_bounds(Some(2.0), Some(5.0)));
        model.add_variable(Variable::new("mirrored").with_bounds(None, Some(4.0)));
        model.add_variable(Variable::free("free"));
        model.set_objective(Sense::Minimize, [("shifted", 1.0), ("mirrored", 1.0), ("free", 1.0)]);
        model.add_constraint(
            "row",
            [("shifted", 1.0), ("mirrored", 1.0), ("free", 1.0)],
            ConstraintOp::Le,
            10.0,
        );
        let canonical = standardize(&model);

        assert_eq!(canonical.columns[0], ColumnOrigin::Shifted { var: 0, offset: 2.0 });
        assert_eq!(canonical.columns[1], ColumnOrigin::Mirrored { var: 1, offset: 4.0 });
        assert_eq!(canonical.columns[2], ColumnOrigin::Positive { var: 2 });
        assert_eq!(canonical.columns[3], ColumnOrigin::Negative { var: 2 });

        // 10 - 2 - 4 moved to the right-hand side
        assert_eq!(canonical.b[0], 4.0);
        assert_eq!(&canonical.a[0][..4], &[1.0, -1.0, 1.0, -1.0]);
        assert_eq!(canonical.offset, 6.0);

        // upper bound row for the shifted variable
        assert_eq!(canonical.rows[1].origin, RowOrigin::UpperBound(0));
        assert_eq!(canonical.b[1], 3.0);
    }

    #[test]
    fn test_duplicate_terms_accumulate() {
        let mut model = Model::new();
        model.add_variable(Variable::new("x"));
        model.add_constraint("dup", [("x", 1.0), ("x", 2.0)], ConstraintOp::Le, 6.0);
        let canonical = standardize(&model);
        assert_eq!(canonical.a[0][0], 3.0);
    }
}
