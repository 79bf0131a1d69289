use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Solution, SolutionStatus};

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_STREAK_LIMIT: usize = 50;

/// Two-phase simplex solver for the continuous relaxation of a problem.
///
/// Binary flags on the problem are ignored here; only `x >= 0` is implied.
#[derive(Debug, Clone)]
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
        }
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let mut tableau = self.build_tableau(problem);

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible | SimplexResult::Unbounded => {
                    return Solution::infeasible();
                }
                SimplexResult::IterationLimit => {
                    return Solution::without_values(SolutionStatus::IterationLimit);
                }
            }
        }

        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Solution::unbounded(),
            SimplexResult::Infeasible => return Solution::infeasible(),
            SimplexResult::IterationLimit => {
                return Solution::without_values(SolutionStatus::IterationLimit);
            }
        }

        let values = self.extract_values(&tableau, problem.num_variables());
        let objective_value = problem.objective_value(&values);
        Solution::optimal(values, objective_value)
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();

        // Normalise every row to a non-negative RHS; a `>= 0` row becomes `<= 0`
        // so it can start with its slack basic instead of an artificial.
        let rows: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                let flip = c.rhs < 0.0 || (c.rhs == 0.0 && c.op == ConstraintOp::Ge);
                if !flip {
                    return (c.coefficients.clone(), c.op, c.rhs);
                }
                let op = match c.op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
                let coefficients = c.coefficients.iter().map(|x| -x).collect();
                (coefficients, op, -c.rhs)
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let n_constraints = rows.len();
        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs)) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(coefficients);
            tableau.data[i][total_cols - 1] = *rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // The objective row holds reduced costs of a maximisation
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Maximise -sum(artificials)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[n_constraints].clone();

        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Make the objective row canonical for the basic artificials
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            // The phase-1 objective is bounded by zero
            SimplexResult::Unbounded | SimplexResult::Infeasible => return SimplexResult::Infeasible,
            SimplexResult::IterationLimit => return SimplexResult::IterationLimit,
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        self.drive_out_artificials(tableau);

        // Restore the phase 2 objective and adjust for basic variables
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    /// Pivot zero-valued artificials out of the basis. Rows where no structural
    /// or slack column is available are redundant and keep their artificial.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let n_constraints = tableau.data.len() - 1;
        let art_start = tableau.art_start();

        for i in 0..n_constraints {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let replacement = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            if let Some(col) = replacement {
                self.pivot(tableau, i, col);
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from)
    }

    /// Pivot until no column below `col_limit` can improve the objective
    fn iterate(&self, tableau: &mut Tableau, col_limit: usize) -> SimplexResult {
        let mut degenerate_streak = 0;

        for _ in 0..self.max_iterations {
            let bland = degenerate_streak > DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, col_limit, bland) else {
                return SimplexResult::Optimal;
            };
            let Some((pivot_row, ratio)) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if ratio <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            self.pivot(tableau, pivot_row, pivot_col);
        }
        SimplexResult::IterationLimit
    }

    /// Dantzig's rule, or Bland's (lowest improving index) to escape cycling
    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let row = &tableau.data[obj_row];

        if bland {
            return (0..col_limit).find(|&j| row[j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &value) in row.iter().enumerate().take(col_limit) {
            if value > max_val {
                max_val = value;
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Minimum ratio test; ties go to the lowest basic variable index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<(usize, f64)> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut best: Option<(usize, f64)> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min_ratio)) => {
                    if ratio < min_ratio - self.tolerance
                        || (ratio <= min_ratio + self.tolerance
                            && tableau.basic_vars[i] < tableau.basic_vars[row])
                    {
                        Some((i, ratio))
                    } else {
                        Some((row, min_ratio))
                    }
                }
            };
        }

        best
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = tableau.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for (cell, &p) in tableau.data[i].iter_mut().zip(&pivot_row) {
                *cell -= factor * p;
            }
        }
    }

    fn extract_values(&self, tableau: &Tableau, n_vars: usize) -> Vec<f64> {
        let rhs_col = tableau.data[0].len() - 1;
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col].max(0.0);
            }
        }
        values
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
