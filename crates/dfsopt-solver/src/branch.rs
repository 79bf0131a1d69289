use std::time::{Duration, Instant};

use tracing::debug;

use crate::problem::{Constraint, ConstraintOp, LpProblem};
use crate::simplex::Simplex;
use crate::solution::{Solution, SolutionStatus};

/// Options for branch-and-bound over binary variables
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum number of nodes to explore
    pub max_nodes: usize,
    /// Wall-clock budget for the whole search
    pub time_limit: Option<Duration>,
    /// Distance from 0 or 1 under which a relaxed value counts as integral
    pub integrality_tolerance: f64,
    /// Simplex pivot limit per relaxation
    pub lp_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_nodes: 100_000,
            time_limit: None,
            integrality_tolerance: 1e-6,
            lp_iterations: 50_000,
        }
    }
}

/// Depth-first branch-and-bound solver for problems with binary variables.
///
/// Continuous variables are left to the LP relaxation. Each node fixes a
/// subset of binaries and solves the relaxation of what remains.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolverOptions,
}

struct Incumbent {
    values: Vec<f64>,
    score: f64,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let simplex = Simplex::new().with_max_iterations(self.options.lp_iterations);
        let start = Instant::now();
        // Scores are compared as a maximisation
        let sense = if problem.objective.minimize { -1.0 } else { 1.0 };

        let mut incumbent: Option<Incumbent> = None;
        let mut nodes = 0;
        let mut stack: Vec<Vec<Option<bool>>> = vec![vec![None; problem.num_variables()]];

        while let Some(fixed) = stack.pop() {
            if nodes >= self.options.max_nodes {
                return self.finish(SolutionStatus::NodeLimit, nodes);
            }
            if self.options.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                return self.finish(SolutionStatus::TimeLimit, nodes);
            }
            nodes += 1;

            let node = NodeProblem::restrict(problem, &fixed);
            let relaxed = simplex.solve(&node.problem);
            match relaxed.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => continue,
                status => return self.finish(status, nodes),
            }

            let bound = sense * (relaxed.objective_value + node.offset);
            if let Some(best) = &incumbent {
                if bound <= best.score + self.options.integrality_tolerance {
                    continue;
                }
            }

            match self.most_fractional(problem, &node, &relaxed.values) {
                Some(j) => {
                    let mut down = fixed.clone();
                    down[j] = Some(false);
                    let mut up = fixed;
                    up[j] = Some(true);
                    // Popped first: selecting tends to reach full rosters sooner
                    stack.push(down);
                    stack.push(up);
                }
                None => {
                    let values = node.expand(problem, &fixed, &relaxed.values);
                    let score = sense * problem.objective_value(&values);
                    debug!(nodes, objective = sense * score, "new incumbent");
                    incumbent = Some(Incumbent { values, score });
                }
            }
        }

        match incumbent {
            Some(best) => {
                let objective_value = problem.objective_value(&best.values);
                debug!(nodes, objective_value, "branch and bound finished");
                let mut solution = Solution::optimal(best.values, objective_value);
                solution.nodes = nodes;
                solution
            }
            None => self.finish(SolutionStatus::Infeasible, nodes),
        }
    }

    fn finish(&self, status: SolutionStatus, nodes: usize) -> Solution {
        debug!(nodes, %status, "branch and bound stopped without a proven optimum");
        let mut solution = Solution::without_values(status);
        solution.nodes = nodes;
        solution
    }

    /// Binary variable whose relaxed value is furthest from integral
    fn most_fractional(&self, problem: &LpProblem, node: &NodeProblem, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (k, &j) in node.free.iter().enumerate() {
            if !problem.binary[j] {
                continue;
            }
            let v = values[k];
            let distance = (v - v.round()).abs();
            if distance <= self.options.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, d)| distance > d) {
                best = Some((j, distance));
            }
        }
        best.map(|(j, _)| j)
    }
}

/// A node's relaxation with its fixed binaries substituted out
struct NodeProblem {
    problem: LpProblem,
    /// Original index of each remaining variable
    free: Vec<usize>,
    /// Objective contribution of variables fixed to one
    offset: f64,
}

impl NodeProblem {
    fn restrict(problem: &LpProblem, fixed: &[Option<bool>]) -> Self {
        let free: Vec<usize> = (0..problem.num_variables()).filter(|&j| fixed[j].is_none()).collect();
        let ones: Vec<usize> = (0..problem.num_variables()).filter(|&j| fixed[j] == Some(true)).collect();

        let mut node = LpProblem::new(free.iter().map(|&j| problem.variables[j].clone()).collect());
        let coefficients = free.iter().map(|&j| problem.objective.coefficients[j]).collect();
        node.set_objective(coefficients, problem.objective.minimize);
        let offset = ones.iter().map(|&j| problem.objective.coefficients[j]).sum();

        for c in &problem.constraints {
            let rhs = c.rhs - ones.iter().map(|&j| c.coefficients[j]).sum::<f64>();
            node.constraints.push(Constraint {
                name: c.name.clone(),
                coefficients: free.iter().map(|&j| c.coefficients[j]).collect(),
                op: c.op,
                rhs,
            });
        }

        for (k, &j) in free.iter().enumerate() {
            if problem.binary[j] {
                let mut coefficients = vec![0.0; free.len()];
                coefficients[k] = 1.0;
                node.constraints.push(Constraint {
                    name: format!("{}_ub", problem.variables[j]),
                    coefficients,
                    op: ConstraintOp::Le,
                    rhs: 1.0,
                });
            }
        }

        Self {
            problem: node,
            free,
            offset,
        }
    }

    /// Full assignment with binaries snapped to exactly 0 or 1
    fn expand(&self, problem: &LpProblem, fixed: &[Option<bool>], values: &[f64]) -> Vec<f64> {
        let mut full: Vec<f64> = fixed
            .iter()
            .map(|f| if *f == Some(true) { 1.0 } else { 0.0 })
            .collect();
        for (k, &j) in self.free.iter().enumerate() {
            full[j] = if problem.binary[j] { values[k].round() } else { values[k] };
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> LpProblem {
        // Maximize 10a + 13b + 7c + 8d, weights 4, 6, 3, 5, capacity 10
        // Relaxation is fractional; the 0-1 optimum is a + b = 23.
        let names = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let mut problem = LpProblem::binary(names);
        problem.set_objective(vec![10.0, 13.0, 7.0, 8.0], false);
        problem
            .add_constraint("weight", vec![4.0, 6.0, 3.0, 5.0], ConstraintOp::Le, 10.0)
            .unwrap();
        problem
    }

    #[test]
    fn test_knapsack_optimum() {
        let solution = Solver::new().solve(&knapsack());

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(solution.objective_value, 23.0);
        assert!(solution.nodes >= 1);
    }

    #[test]
    fn test_values_are_exactly_binary() {
        let mut problem = knapsack();
        problem
            .add_constraint("pick_two", vec![1.0, 1.0, 1.0, 1.0], ConstraintOp::Eq, 2.0)
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.values.iter().all(|v| *v == 0.0 || *v == 1.0));
        assert_eq!(solution.values.iter().sum::<f64>(), 2.0);
        assert_eq!(solution.objective_value, 23.0);
    }

    #[test]
    fn test_binary_infeasible() {
        // Three binaries cannot sum to four
        let names = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut problem = LpProblem::binary(names);
        problem.set_objective(vec![1.0, 1.0, 1.0], false);
        problem
            .add_constraint("count", vec![1.0, 1.0, 1.0], ConstraintOp::Eq, 4.0)
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_integrality_gap_infeasible() {
        // 2a + 2b = 3 has a relaxed solution but no 0-1 one
        let names = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut problem = LpProblem::binary(names);
        problem.set_objective(vec![1.0, 1.0], false);
        problem
            .add_constraint("odd", vec![2.0, 2.0], ConstraintOp::Eq, 3.0)
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_node_limit() {
        let options = SolverOptions {
            max_nodes: 0,
            ..SolverOptions::default()
        };
        let solution = Solver::with_options(options).solve(&knapsack());

        assert_eq!(solution.status, SolutionStatus::NodeLimit);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_time_limit() {
        let options = SolverOptions {
            time_limit: Some(Duration::ZERO),
            ..SolverOptions::default()
        };
        let solution = Solver::with_options(options).solve(&knapsack());

        assert_eq!(solution.status, SolutionStatus::TimeLimit);
    }

    #[test]
    fn test_minimization() {
        // Cover at least 7 units at minimum cost: b (4 units, cost 5) + c (3 units, cost 4)
        let names = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut problem = LpProblem::binary(names);
        problem.set_objective(vec![6.0, 5.0, 4.0], true);
        problem
            .add_constraint("cover", vec![5.0, 4.0, 3.0], ConstraintOp::Ge, 7.0)
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![0.0, 1.0, 1.0]);
        assert_eq!(solution.objective_value, 9.0);
    }
}
