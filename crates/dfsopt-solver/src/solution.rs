use std::fmt;

/// The result of solving an LP or 0-1 problem
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Objective value at `values`
    pub objective_value: f64,
    /// Branch-and-bound nodes explored (zero for a plain LP solve)
    pub nodes: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Simplex stopped before reaching an optimal basis
    IterationLimit,
    /// Branch-and-bound stopped before proving optimality
    NodeLimit,
    /// Branch-and-bound ran out of wall-clock time
    TimeLimit,
}

impl SolutionStatus {
    pub fn is_optimal(self) -> bool {
        self == SolutionStatus::Optimal
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::IterationLimit => "Iteration limit reached",
            SolutionStatus::NodeLimit => "Node limit reached",
            SolutionStatus::TimeLimit => "Time limit reached",
        };
        f.write_str(text)
    }
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            nodes: 0,
        }
    }

    /// A terminal non-optimal outcome; no values are reported
    pub fn without_values(status: SolutionStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes: 0,
        }
    }

    pub fn infeasible() -> Self {
        Self::without_values(SolutionStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::without_values(SolutionStatus::Unbounded)
    }
}
