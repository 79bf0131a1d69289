mod branch;
mod problem;
mod simplex;
mod solution;

pub use branch::{Solver, SolverOptions};
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ProblemError};
pub use simplex::Simplex;
pub use solution::{Solution, SolutionStatus};
