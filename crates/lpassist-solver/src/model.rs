use std::collections::{HashMap, HashSet};

use crate::error::ModelError;

/// A linear programming model: objective, constraints and bounded variables.
///
/// Variables are referenced by name everywhere; names are resolved to column
/// indices only when the model is standardized.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    /// Declared variables, in column order
    pub variables: Vec<Variable>,
    /// Objective function
    #[cfg_attr(feature = "serde", serde(default))]
    pub objective: Objective,
    /// Constraints, in report order
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Lower bound; `None` means unbounded below
    #[cfg_attr(feature = "serde", serde(default = "default_lower"))]
    pub lower: Option<f64>,
    /// Upper bound; `None` means unbounded above
    #[cfg_attr(feature = "serde", serde(default))]
    pub upper: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: VarKind,
}

#[cfg(feature = "serde")]
fn default_lower() -> Option<f64> {
    Some(0.0)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarKind {
    #[default]
    Continuous,
    Integer,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    #[cfg_attr(feature = "serde", serde(default))]
    pub sense: Sense,
    /// (variable, coefficient) pairs
    #[cfg_attr(feature = "serde", serde(default))]
    pub terms: Vec<(String, f64)>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics); may be empty
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// (variable, coefficient) pairs; unmentioned variables have coefficient 0
    pub terms: Vec<(String, f64)>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl ConstraintOp {
    /// Whether `lhs op rhs` holds within `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintOp::Le => lhs <= rhs + tolerance,
            ConstraintOp::Ge => lhs >= rhs - tolerance,
            ConstraintOp::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

impl std::fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintOp::Le => write!(f, "<="),
            ConstraintOp::Ge => write!(f, ">="),
            ConstraintOp::Eq => write!(f, "="),
        }
    }
}

impl Variable {
    /// A continuous variable bounded below by zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: Some(0.0),
            upper: None,
            kind: VarKind::Continuous,
        }
    }

    /// A continuous variable with no bounds at all.
    pub fn free(name: impl Into<String>) -> Self {
        Self {
            lower: None,
            ..Self::new(name)
        }
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn integer(mut self) -> Self {
        self.kind = VarKind::Integer;
        self
    }

    /// Lower bound as a float, `-inf` when unbounded.
    pub fn lower_bound(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper bound as a float, `+inf` when unbounded.
    pub fn upper_bound(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    pub fn is_integer(&self) -> bool {
        self.kind == VarKind::Integer
    }
}

impl Constraint {
    /// The constraint's name, or a positional `c<n>` label when unnamed.
    pub fn label(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("c{}", index + 1)
        } else {
            self.name.clone()
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub fn set_objective<S: Into<String>>(&mut self, sense: Sense, terms: impl IntoIterator<Item = (S, f64)>) {
        self.objective = Objective {
            sense,
            terms: terms.into_iter().map(|(v, c)| (v.into(), c)).collect(),
        };
    }

    pub fn add_constraint<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (S, f64)>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms: terms.into_iter().map(|(v, c)| (v.into(), c)).collect(),
            op,
            rhs,
        });
    }

    /// Build a model from dense coefficient lists.
    ///
    /// Variables are named `x1..xn` with the default `[0, +inf)` bounds and
    /// constraints `c1..cm`. Every row must have as many coefficients as the
    /// objective, and the row, operator and right-hand side lists must agree.
    pub fn from_dense(
        sense: Sense,
        objective: &[f64],
        rows: &[Vec<f64>],
        ops: &[ConstraintOp],
        rhs: &[f64],
    ) -> Result<Self, ModelError> {
        if ops.len() != rows.len() {
            return Err(ModelError::ShapeMismatch {
                what: "constraint operators",
                expected: rows.len(),
                found: ops.len(),
            });
        }
        if rhs.len() != rows.len() {
            return Err(ModelError::ShapeMismatch {
                what: "right-hand sides",
                expected: rows.len(),
                found: rhs.len(),
            });
        }

        let names: Vec<String> = (1..=objective.len()).map(|j| format!("x{j}")).collect();
        let mut model = Model::new();
        for name in &names {
            model.add_variable(Variable::new(name.clone()));
        }
        model.set_objective(sense, names.iter().cloned().zip(objective.iter().copied()));

        for (i, ((row, &op), &b)) in rows.iter().zip(ops).zip(rhs).enumerate() {
            if row.len() != names.len() {
                return Err(ModelError::ShapeMismatch {
                    what: "constraint coefficients",
                    expected: names.len(),
                    found: row.len(),
                });
            }
            model.add_constraint(
                format!("c{}", i + 1),
                names.iter().cloned().zip(row.iter().copied()),
                op,
                b,
            );
        }
        Ok(model)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(Variable::is_integer)
    }

    /// Map from variable name to its column position.
    pub fn variable_index(&self) -> HashMap<&str, usize> {
        self.variables
            .iter()
            .enumerate()
            .map(|(j, v)| (v.name.as_str(), j))
            .collect()
    }

    /// Left-hand side of constraint `i` at a dense point in column order.
    pub fn constraint_activity(&self, i: usize, values: &[f64]) -> f64 {
        let index = self.variable_index();
        dot(&self.constraints[i].terms, &index, values)
    }

    /// Left-hand sides of every constraint at a dense point in column order.
    pub fn activities(&self, values: &[f64]) -> Vec<f64> {
        let index = self.variable_index();
        self.constraints
            .iter()
            .map(|c| dot(&c.terms, &index, values))
            .collect()
    }

    /// Objective value at a dense point in column order.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        let index = self.variable_index();
        dot(&self.objective.terms, &index, values)
    }

    /// Check the structural invariants of the model.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.variables.is_empty() {
            return Err(ModelError::NoVariables);
        }

        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.name.as_str()) {
                return Err(ModelError::DuplicateVariable(v.name.clone()));
            }
            let lower = v.lower_bound();
            let upper = v.upper_bound();
            if lower.is_nan() || upper.is_nan() || lower == f64::INFINITY || upper == f64::NEG_INFINITY {
                return Err(ModelError::InvalidBound(v.name.clone()));
            }
            if lower.is_finite() && upper.is_finite() && lower > upper {
                return Err(ModelError::InconsistentBounds {
                    name: v.name.clone(),
                    lower,
                    upper,
                });
            }
        }

        check_terms(&self.objective.terms, &seen, || "objective".to_string())?;

        for (i, c) in self.constraints.iter().enumerate() {
            let location = || format!("constraint {}", c.label(i));
            check_terms(&c.terms, &seen, location)?;
            if !c.rhs.is_finite() {
                return Err(ModelError::NonFiniteRhs(c.label(i)));
            }
        }

        Ok(())
    }
}

fn check_terms(
    terms: &[(String, f64)],
    declared: &HashSet<&str>,
    location: impl Fn() -> String,
) -> Result<(), ModelError> {
    for (name, coef) in terms {
        if !declared.contains(name.as_str()) {
            return Err(ModelError::UnknownVariable {
                variable: name.clone(),
                location: location(),
            });
        }
        if !coef.is_finite() {
            return Err(ModelError::NonFiniteCoefficient {
                variable: name.clone(),
                location: location(),
            });
        }
    }
    Ok(())
}

fn dot(terms: &[(String, f64)], index: &HashMap<&str, usize>, values: &[f64]) -> f64 {
    terms
        .iter()
        .filter_map(|(name, coef)| index.get(name.as_str()).map(|&j| coef * values[j]))
        .sum()
}
