use std::collections::BTreeMap;

use crate::options::Method;

/// The result of solving an LP model
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Method that produced this solution (never `Auto`)
    pub method: Method,
    /// Optimal objective value, in the model's own sense
    pub objective_value: Option<f64>,
    /// Optimal value for each variable, keyed by name
    pub values: Option<BTreeMap<String, f64>>,
    /// Indices of constraints that hold with equality at the optimum
    pub binding_constraints: Vec<usize>,
    /// Sensitivity analysis (pure LP solves only)
    pub analysis: Option<Analysis>,
    /// Constraint violations (populated by the elastic relaxation only)
    pub violations: Vec<ConstraintViolation>,
    /// Simplex pivots performed, summed over every LP solved
    pub iterations: usize,
    /// Branch-and-bound nodes explored
    pub nodes: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

/// Detailed analysis of the optimal solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Analysis {
    /// Shadow prices (dual values) for each constraint
    /// Indicates how much the objective would change per unit increase of the RHS
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPrice {
    /// Constraint index
    pub constraint: usize,
    /// Constraint label
    pub name: String,
    /// Shadow price value
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost, in the model's objective sense
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint index
    pub constraint: usize,
    /// Constraint label
    pub name: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
}

impl Solution {
    pub fn infeasible(method: Method, iterations: usize) -> Self {
        Self::without_values(SolutionStatus::Infeasible, method, iterations)
    }

    pub fn unbounded(method: Method, iterations: usize) -> Self {
        Self::without_values(SolutionStatus::Unbounded, method, iterations)
    }

    fn without_values(status: SolutionStatus, method: Method, iterations: usize) -> Self {
        Self {
            status,
            method,
            objective_value: None,
            values: None,
            binding_constraints: Vec::new(),
            analysis: None,
            violations: Vec::new(),
            iterations,
            nodes: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Value of a variable in an optimal solution.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.as_ref()?.get(name).copied()
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "OPTIMAL"),
            SolutionStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolutionStatus::Unbounded => write!(f, "UNBOUNDED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_optimal_solutions_carry_no_values() {
        let solution = Solution::infeasible(Method::Simplex, 3);
        assert!(!solution.is_optimal());
        assert_eq!(solution.objective_value, None);
        assert_eq!(solution.value("x"), None);
        assert_eq!(solution.iterations, 3);

        let solution = Solution::unbounded(Method::Integer, 0);
        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.values.is_none());
        assert!(solution.analysis.is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolutionStatus::Optimal.to_string(), "OPTIMAL");
        assert_eq!(SolutionStatus::Infeasible.to_string(), "INFEASIBLE");
    }
}
