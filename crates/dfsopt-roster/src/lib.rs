pub mod defaults;
pub mod lineup;
pub mod optimizer;
pub mod player;
pub mod rules;

pub use defaults::{site_defaults, League, Site, SiteDefaults};
pub use dfsopt_solver::{SolutionStatus, SolverOptions};
pub use lineup::{Lineup, LineupEntry, OptimizeResult};
pub use optimizer::{BuildError, RosterOptimizer, SolveError};
pub use player::{exclude_injury_statuses, Attribute, Player, PlayerPool, PlayerRecord};
pub use rules::{FlexGroup, RosterRules};
