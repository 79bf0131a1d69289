use std::collections::BTreeSet;

use dfsopt_solver::{ConstraintOp, LpProblem, ProblemError, SolutionStatus, Solver, SolverOptions};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::lineup::{Lineup, OptimizeResult};
use crate::player::{Attribute, Player, PlayerPool};
use crate::rules::RosterRules;

/// Salary cap constraint
pub const LINEUP_COST: &str = "lineup_cost";
/// Exact roster size constraint, present only with utility slots
pub const UTILITY_CONSTRAINT: &str = "utility_constraint";
/// Keeps players without a roster slot out when there are no utility slots
pub const UNROSTERED_CONSTRAINT: &str = "unrostered_positions";
pub const IGNORE_PLAYER_PREFIX: &str = "ignore_";
pub const REQUIRE_PLAYER_PREFIX: &str = "require_";
pub const IGNORE_TEAM_PREFIX: &str = "team_ignore_";
pub const TEAM_MAX_PREFIX: &str = "team_max_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Player {player} is missing required attribute {attribute}")]
    MissingAttribute { player: String, attribute: Attribute },
    #[error("Player {player} has invalid {attribute}: {value}")]
    InvalidAttribute {
        player: String,
        attribute: Attribute,
        value: f64,
    },
    #[error("Invalid budget: {0}")]
    InvalidBudget(f64),
    #[error("Flex group {0} accepts no positions")]
    EmptyFlexGroup(String),
    #[error("Flex group {flex} references position {position} which has no base requirement")]
    UnknownFlexPosition { flex: String, position: String },
    #[error("Position {position} appears in flex groups {first} and {second}")]
    OverlappingFlexGroups {
        position: String,
        first: String,
        second: String,
    },
    #[error("Constraint name {0} is used more than once")]
    DuplicateConstraintName(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Lineup could not be optimized: {0}")]
    NotOptimal(SolutionStatus),
    #[error("Player {player} resolved to non-binary value {value}")]
    NonBinaryAssignment { player: String, value: f64 },
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Integer program selecting the highest-projected roster under a salary cap.
///
/// One binary variable per player, in player id order. The variable set is
/// fixed at construction; constraints may be added or replaced by name.
#[derive(Debug, Clone)]
pub struct RosterOptimizer {
    players: Vec<Player>,
    rules: RosterRules,
    model: LpProblem,
    solver: Solver,
}

impl RosterOptimizer {
    pub fn new(pool: &PlayerPool, rules: RosterRules) -> Result<Self, BuildError> {
        rules.validate()?;

        let players = pool
            .iter()
            .map(|(id, record)| Player::from_record(id, record))
            .collect::<Result<Vec<_>, _>>()?;

        let mut model = LpProblem::binary(players.iter().map(|p| p.id.clone()).collect());
        model.set_objective(players.iter().map(|p| p.points_projection).collect(), false);

        let mut optimizer = Self {
            players,
            rules,
            model,
            solver: Solver::new(),
        };
        optimizer.add_position_constraints()?;
        optimizer.add_flex_constraints()?;
        optimizer.add_utility_constraint()?;
        optimizer.add_budget_constraint()?;

        debug!(
            players = optimizer.players.len(),
            constraints = optimizer.model.num_constraints(),
            roster_size = optimizer.rules.roster_size(),
            "built roster model"
        );

        Ok(optimizer)
    }

    pub fn with_solver_options(mut self, options: SolverOptions) -> Self {
        self.solver = Solver::with_options(options);
        self
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    pub fn model(&self) -> &LpProblem {
        &self.model
    }

    fn has_utility(&self) -> bool {
        self.rules.utility > 0
    }

    /// Indicator row over the players matching `select`
    fn selection(&self, select: impl Fn(&Player) -> bool) -> Vec<f64> {
        self.players
            .iter()
            .map(|p| if select(p) { 1.0 } else { 0.0 })
            .collect()
    }

    fn add_position_constraints(&mut self) -> Result<(), BuildError> {
        for (position, &required) in &self.rules.positions {
            // Flex and utility slots let usage exceed the base requirement
            let op = if self.has_utility() || self.rules.flex_group_of(position).is_some() {
                ConstraintOp::Ge
            } else {
                ConstraintOp::Eq
            };
            let coefficients = self.selection(|p| &p.position == position);
            self.model.add_constraint(position.clone(), coefficients, op, required as f64)?;
        }

        if !self.has_utility() {
            let coefficients = self.selection(|p| !self.rules.positions.contains_key(&p.position));
            if coefficients.iter().any(|c| *c != 0.0) {
                self.model
                    .add_constraint(UNROSTERED_CONSTRAINT, coefficients, ConstraintOp::Eq, 0.0)?;
            }
        }
        Ok(())
    }

    fn add_flex_constraints(&mut self) -> Result<(), BuildError> {
        let op = if self.has_utility() { ConstraintOp::Ge } else { ConstraintOp::Eq };
        for (name, group) in &self.rules.flex {
            let required = self.rules.flex_base(group) + group.count;
            let coefficients = self.selection(|p| group.positions.contains(&p.position));
            self.model.add_constraint(name.clone(), coefficients, op, required as f64)?;
        }
        Ok(())
    }

    fn add_utility_constraint(&mut self) -> Result<(), BuildError> {
        if !self.has_utility() {
            return Ok(());
        }
        let coefficients = vec![1.0; self.players.len()];
        let size = self.rules.roster_size() as f64;
        self.model.add_constraint(UTILITY_CONSTRAINT, coefficients, ConstraintOp::Eq, size)?;
        Ok(())
    }

    fn add_budget_constraint(&mut self) -> Result<(), BuildError> {
        let coefficients = self.players.iter().map(|p| p.salary).collect();
        self.model
            .add_constraint(LINEUP_COST, coefficients, ConstraintOp::Le, self.rules.budget)?;
        Ok(())
    }

    /// Insert or replace a selection-count constraint; returns how many players it covers
    fn put_selection(
        &mut self,
        name: String,
        select: impl Fn(&Player) -> bool,
        op: ConstraintOp,
        rhs: f64,
    ) -> Result<usize, BuildError> {
        let coefficients = self.selection(select);
        let matched = coefficients.iter().filter(|c| **c != 0.0).count();
        if matched == 0 {
            warn!(constraint = %name, "constraint matches no players");
        } else {
            debug!(constraint = %name, matched, "setting constraint");
        }
        self.model.set_constraint(name, coefficients, op, rhs)?;
        Ok(matched)
    }

    fn filtered_name(prefix: &str, name: &str, position: Option<&str>, team: Option<&str>) -> String {
        format!(
            "{prefix}{name}{}{}",
            position.unwrap_or_default(),
            team.unwrap_or_default()
        )
    }

    fn matches(player: &Player, name: &str, position: Option<&str>, team: Option<&str>) -> bool {
        player.is_named(name)
            && position.is_none_or(|pos| player.position == pos)
            && team.is_none_or(|t| player.is_on(t))
    }

    /// Exclude every player with this name (optionally narrowed by position and
    /// team). Returns the number of players matched.
    pub fn ignore_player(
        &mut self,
        name: &str,
        position: Option<&str>,
        team: Option<&str>,
    ) -> Result<usize, BuildError> {
        let constraint = Self::filtered_name(IGNORE_PLAYER_PREFIX, name, position, team);
        self.put_selection(
            constraint,
            |p| Self::matches(p, name, position, team),
            ConstraintOp::Eq,
            0.0,
        )
    }

    /// Select exactly one of the players with this name (optionally narrowed by
    /// position and team). Returns the number of players matched.
    pub fn require_player(
        &mut self,
        name: &str,
        position: Option<&str>,
        team: Option<&str>,
    ) -> Result<usize, BuildError> {
        let constraint = Self::filtered_name(REQUIRE_PLAYER_PREFIX, name, position, team);
        self.put_selection(
            constraint,
            |p| Self::matches(p, name, position, team),
            ConstraintOp::Eq,
            1.0,
        )
    }

    pub fn ignore_team(&mut self, team: &str) -> Result<usize, BuildError> {
        self.put_selection(
            format!("{IGNORE_TEAM_PREFIX}{team}"),
            |p| p.is_on(team),
            ConstraintOp::Eq,
            0.0,
        )
    }

    /// Cap the number of selected players from any single team
    pub fn set_max_players_from_same_team(&mut self, maximum: u32) -> Result<(), BuildError> {
        let teams: BTreeSet<String> = self.players.iter().filter_map(|p| p.team.clone()).collect();
        for team in &teams {
            self.put_selection(
                format!("{TEAM_MAX_PREFIX}{team}"),
                |p| p.is_on(team),
                ConstraintOp::Le,
                maximum as f64,
            )?;
        }
        Ok(())
    }

    /// Solve the current model once
    pub fn optimize(&self) -> Result<OptimizeResult, SolveError> {
        let solution = self.solver.solve(&self.model);
        if solution.status != SolutionStatus::Optimal {
            debug!(status = %solution.status, nodes = solution.nodes, "no optimal lineup");
            return Err(SolveError::NotOptimal(solution.status));
        }

        let mut players = BTreeSet::new();
        for (player, &value) in self.players.iter().zip(&solution.values) {
            if value == 1.0 {
                players.insert(player.id.clone());
            } else if value != 0.0 {
                error!(player = %player.id, value, "decision variable is not binary");
                return Err(SolveError::NonBinaryAssignment {
                    player: player.id.clone(),
                    value,
                });
            }
        }

        let salary = self.model.activity(LINEUP_COST, &solution.values)?;
        let points = solution.objective_value;
        info!(salary, points, players = players.len(), nodes = solution.nodes, "optimal lineup found");

        Ok(OptimizeResult {
            status: solution.status,
            salary,
            points,
            players,
        })
    }

    /// Solve and group the selected players by position. With `display`, the
    /// lineup is also printed as sorted-key JSON.
    pub fn generate_lineup(&self, display: bool) -> Result<Lineup, SolveError> {
        let result = self.optimize()?;
        let lineup = Lineup::from_players(self.players.iter().filter(|p| result.players.contains(&p.id)));

        if display {
            match lineup.to_json_pretty() {
                Ok(json) => println!("{json}"),
                Err(e) => warn!(error = %e, "could not render lineup"),
            }
        }

        Ok(lineup)
    }
}
