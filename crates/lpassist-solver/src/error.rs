use thiserror::Error;

/// Structural problems with a model, detected before any solving starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model declares no variables")]
    NoVariables,
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
    #[error("Unknown variable '{variable}' referenced in {location}")]
    UnknownVariable { variable: String, location: String },
    #[error("Constraint {0} has a non-finite right-hand side")]
    NonFiniteRhs(String),
    #[error("Non-finite coefficient for '{variable}' in {location}")]
    NonFiniteCoefficient { variable: String, location: String },
    #[error("Variable '{name}' has lower bound {lower} above upper bound {upper}")]
    InconsistentBounds { name: String, lower: f64, upper: f64 },
    #[error("Variable '{0}' has an invalid bound")]
    InvalidBound(String),
    #[error("Expected {expected} {what}, got {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Which stage of the solve hit the iteration cap.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Feasibility search over the artificial variables
    One,
    /// Optimization of the true objective
    Two,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::One => write!(f, "phase 1"),
            Phase::Two => write!(f, "phase 2"),
        }
    }
}

/// Engine failures that say nothing about the model itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverInternalError {
    #[error("Iteration limit of {limit} pivots exceeded in {phase}")]
    IterationLimit { phase: Phase, limit: usize },
    #[error("Branch-and-bound node limit of {limit} exceeded")]
    NodeLimit { limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Solver internal error: {0}")]
    Internal(#[from] SolverInternalError),
}

pub type SolveResult<T> = Result<T, SolveError>;
