use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::optimizer::BuildError;

/// Player table keyed by player id, as handed over by a loader
pub type PlayerPool = BTreeMap<String, PlayerRecord>;

/// A loosely-typed player row. Every field is optional here; the optimizer
/// checks the required ones when it is constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    pub name: Option<String>,
    pub position: Option<String>,
    pub points_projection: Option<f64>,
    pub salary: Option<f64>,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub game_time: Option<String>,
    pub injury_status: Option<String>,
}

impl PlayerRecord {
    pub fn new(position: impl Into<String>, points_projection: f64, salary: f64) -> Self {
        Self {
            position: Some(position.into()),
            points_projection: Some(points_projection),
            salary: Some(salary),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_opponent(mut self, opponent: impl Into<String>) -> Self {
        self.opponent = Some(opponent.into());
        self
    }

    pub fn with_game_time(mut self, game_time: impl Into<String>) -> Self {
        self.game_time = Some(game_time.into());
        self
    }

    pub fn with_injury_status(mut self, status: impl Into<String>) -> Self {
        self.injury_status = Some(status.into());
        self
    }
}

/// Attributes every player must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    PointsProjection,
    Salary,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::PointsProjection => "points_projection",
            Attribute::Salary => "salary",
        })
    }
}

/// A validated player held by the optimizer
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: Option<String>,
    pub position: String,
    pub points_projection: f64,
    pub salary: f64,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub game_time: Option<String>,
    pub injury_status: Option<String>,
}

impl Player {
    pub fn from_record(id: &str, record: &PlayerRecord) -> Result<Self, BuildError> {
        let missing = |attribute| BuildError::MissingAttribute {
            player: id.to_string(),
            attribute,
        };

        let position = record.position.clone().ok_or_else(|| missing(Attribute::Position))?;
        let points_projection = record
            .points_projection
            .ok_or_else(|| missing(Attribute::PointsProjection))?;
        let salary = record.salary.ok_or_else(|| missing(Attribute::Salary))?;

        for (attribute, value) in [
            (Attribute::PointsProjection, points_projection),
            (Attribute::Salary, salary),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BuildError::InvalidAttribute {
                    player: id.to_string(),
                    attribute,
                    value,
                });
            }
        }

        Ok(Self {
            id: id.to_string(),
            name: record.name.clone(),
            position,
            points_projection,
            salary,
            team: record.team.clone(),
            opponent: record.opponent.clone(),
            game_time: record.game_time.clone(),
            injury_status: record.injury_status.clone(),
        })
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn is_on(&self, team: &str) -> bool {
        self.team.as_deref() == Some(team)
    }
}

/// Drop players whose injury status is in `statuses`; returns how many were removed
pub fn exclude_injury_statuses(pool: &mut PlayerPool, statuses: &[&str]) -> usize {
    let before = pool.len();
    pool.retain(|_, record| {
        record
            .injury_status
            .as_deref()
            .is_none_or(|status| !statuses.contains(&status))
    });
    before - pool.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record_requires_attributes() {
        let cases = [
            (PlayerRecord { position: None, ..PlayerRecord::new("QB", 1.0, 1.0) }, Attribute::Position),
            (
                PlayerRecord { points_projection: None, ..PlayerRecord::new("QB", 1.0, 1.0) },
                Attribute::PointsProjection,
            ),
            (PlayerRecord { salary: None, ..PlayerRecord::new("QB", 1.0, 1.0) }, Attribute::Salary),
        ];

        for (record, expected) in cases {
            match Player::from_record("p1", &record) {
                Err(BuildError::MissingAttribute { player, attribute }) => {
                    assert_eq!(player, "p1");
                    assert_eq!(attribute, expected);
                }
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_from_record_rejects_negative_salary() {
        let record = PlayerRecord::new("QB", 10.0, -1.0);
        assert!(matches!(
            Player::from_record("p1", &record),
            Err(BuildError::InvalidAttribute { attribute: Attribute::Salary, .. })
        ));

        let record = PlayerRecord::new("QB", f64::NAN, 1.0);
        assert!(matches!(
            Player::from_record("p1", &record),
            Err(BuildError::InvalidAttribute { attribute: Attribute::PointsProjection, .. })
        ));
    }

    #[test]
    fn test_record_deserializes_with_missing_fields() {
        let record: PlayerRecord =
            serde_json::from_str(r#"{"name": "Tom", "position": "QB", "salary": 30}"#).unwrap();
        assert_eq!(record.name.as_deref(), Some("Tom"));
        assert_eq!(record.salary, Some(30.0));
        assert_eq!(record.points_projection, None);
        assert_eq!(record.team, None);
    }

    #[test]
    fn test_exclude_injury_statuses() {
        let mut pool = PlayerPool::new();
        pool.insert("a".into(), PlayerRecord::new("QB", 1.0, 1.0).with_injury_status("O"));
        pool.insert("b".into(), PlayerRecord::new("QB", 1.0, 1.0).with_injury_status("Q"));
        pool.insert("c".into(), PlayerRecord::new("QB", 1.0, 1.0));
        pool.insert("d".into(), PlayerRecord::new("QB", 1.0, 1.0).with_injury_status("IR"));

        let removed = exclude_injury_statuses(&mut pool, &["O", "IR", "D"]);

        assert_eq!(removed, 2);
        assert_eq!(pool.keys().cloned().collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
