use std::collections::{BTreeMap, BTreeSet};

use dfsopt_solver::SolutionStatus;
use serde::Serialize;

use crate::player::Player;

/// Raw outcome of an optimal solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeResult {
    pub status: SolutionStatus,
    /// Activity of the salary cap constraint
    pub salary: f64,
    /// Objective value
    pub points: f64,
    /// Ids of the selected players
    pub players: BTreeSet<String>,
}

/// Display record for one selected player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupEntry {
    pub name: Option<String>,
    pub points_projection: f64,
    pub opponent: Option<String>,
    pub game_time: Option<String>,
    pub salary: f64,
    pub injury_status: Option<String>,
    pub team: Option<String>,
}

impl From<&Player> for LineupEntry {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            points_projection: player.points_projection,
            opponent: player.opponent.clone(),
            game_time: player.game_time.clone(),
            salary: player.salary,
            injury_status: player.injury_status.clone(),
            team: player.team.clone(),
        }
    }
}

/// Selected players grouped by position
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Lineup {
    slots: BTreeMap<String, Vec<LineupEntry>>,
}

impl Lineup {
    pub fn from_players<'a>(players: impl IntoIterator<Item = &'a Player>) -> Self {
        let mut slots: BTreeMap<String, Vec<LineupEntry>> = BTreeMap::new();
        for player in players {
            slots.entry(player.position.clone()).or_default().push(player.into());
        }
        Self { slots }
    }

    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn get(&self, position: &str) -> &[LineupEntry] {
        self.slots.get(position).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LineupEntry])> {
        self.slots.iter().map(|(p, entries)| (p.as_str(), entries.as_slice()))
    }

    /// Number of selected players
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_salary(&self) -> f64 {
        self.slots.values().flatten().map(|e| e.salary).sum()
    }

    pub fn total_points(&self) -> f64 {
        self.slots.values().flatten().map(|e| e.points_projection).sum()
    }

    /// Indented JSON with keys sorted at every level
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let value = serde_json::to_value(self)?;
        serde_json::to_string_pretty(&value)
    }
}
