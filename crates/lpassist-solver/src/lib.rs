mod branch;
mod dual;
mod error;
mod model;
mod options;
mod relax;
mod report;
mod simplex;
mod solution;
mod solver;
mod standard;

pub use dual::dual_model;
pub use error::{ModelError, Phase, SolveError, SolveResult, SolverInternalError};
pub use model::{Constraint, ConstraintOp, Model, Objective, Sense, VarKind, Variable};
pub use options::{Method, SolveOptions};
pub use solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};
pub use solver::solve;
