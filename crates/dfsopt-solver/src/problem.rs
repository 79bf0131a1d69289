use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Constraint {name} has {found} coefficients but the problem has {expected} variables")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),
}

/// Represents a linear program whose variables may be flagged as binary
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Variables restricted to {0, 1}
    pub binary: Vec<bool>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints, in insertion order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Unique name within the problem
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Constraint {
    /// Non-zero terms as `(variable index, coefficient)` pairs
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(j, c)| (j, *c))
    }

    /// Left-hand side evaluated at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }
}

impl LpProblem {
    /// Continuous problem: every variable is only bounded below by zero
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            binary: vec![false; n],
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Problem in which every variable is binary
    pub fn binary(variables: Vec<String>) -> Self {
        let mut problem = Self::new(variables);
        problem.binary.iter_mut().for_each(|b| *b = true);
        problem
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    /// Append a constraint without checking for an existing one of the same name
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Result<(), ProblemError> {
        let constraint = self.checked(name.into(), coefficients, op, rhs)?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Insert a constraint, replacing any constraint with the same name in place
    pub fn set_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Result<(), ProblemError> {
        let constraint = self.checked(name.into(), coefficients, op, rhs)?;
        match self.constraints.iter_mut().find(|c| c.name == constraint.name) {
            Some(existing) => *existing = constraint,
            None => self.constraints.push(constraint),
        }
        Ok(())
    }

    fn checked(
        &self,
        name: String,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Result<Constraint, ProblemError> {
        if coefficients.len() != self.num_variables() {
            return Err(ProblemError::DimensionMismatch {
                name,
                expected: self.num_variables(),
                found: coefficients.len(),
            });
        }
        Ok(Constraint {
            name,
            coefficients,
            op,
            rhs,
        })
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Left-hand side of the named constraint at `values`
    pub fn activity(&self, name: &str, values: &[f64]) -> Result<f64, ProblemError> {
        self.constraint(name)
            .map(|c| c.activity(values))
            .ok_or_else(|| ProblemError::UnknownConstraint(name.to_string()))
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}
