use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::optimizer::{BuildError, LINEUP_COST, UTILITY_CONSTRAINT};

/// A slot accepting any of several base positions, on top of their base counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexGroup {
    pub positions: BTreeSet<String>,
    pub count: u32,
}

/// Roster slots and salary cap for one contest format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRules {
    /// Base requirement per position
    pub positions: BTreeMap<String, u32>,
    /// Salary cap
    pub budget: f64,
    /// Flex groups keyed by slot name
    #[serde(default)]
    pub flex: BTreeMap<String, FlexGroup>,
    /// Slots open to any position
    #[serde(default)]
    pub utility: u32,
}

impl RosterRules {
    pub fn new<P, S>(positions: P, budget: f64) -> Self
    where
        P: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            positions: positions.into_iter().map(|(p, n)| (p.into(), n)).collect(),
            budget,
            flex: BTreeMap::new(),
            utility: 0,
        }
    }

    pub fn with_flex<I, S>(mut self, name: impl Into<String>, positions: I, count: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let positions = positions.into_iter().map(Into::into).collect();
        self.flex.insert(name.into(), FlexGroup { positions, count });
        self
    }

    pub fn with_utility(mut self, count: u32) -> Self {
        self.utility = count;
        self
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Total roster size: base slots, flex slots and utility slots
    pub fn roster_size(&self) -> u32 {
        self.positions.values().sum::<u32>()
            + self.flex.values().map(|g| g.count).sum::<u32>()
            + self.utility
    }

    /// Name of the flex group that accepts `position`, if any
    pub fn flex_group_of(&self, position: &str) -> Option<&str> {
        self.flex
            .iter()
            .find(|(_, group)| group.positions.contains(position))
            .map(|(name, _)| name.as_str())
    }

    /// Sum of the base requirements of a flex group's members
    pub fn flex_base(&self, group: &FlexGroup) -> u32 {
        group
            .positions
            .iter()
            .filter_map(|p| self.positions.get(p))
            .sum()
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(BuildError::InvalidBudget(self.budget));
        }

        let mut names: BTreeSet<&str> = [LINEUP_COST, UTILITY_CONSTRAINT].into_iter().collect();
        for name in self.positions.keys().chain(self.flex.keys()) {
            if !names.insert(name) {
                return Err(BuildError::DuplicateConstraintName(name.clone()));
            }
        }

        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for (flex, group) in &self.flex {
            if group.positions.is_empty() {
                return Err(BuildError::EmptyFlexGroup(flex.clone()));
            }
            for position in &group.positions {
                if !self.positions.contains_key(position) {
                    return Err(BuildError::UnknownFlexPosition {
                        flex: flex.clone(),
                        position: position.clone(),
                    });
                }
                if let Some(first) = owner.insert(position, flex) {
                    return Err(BuildError::OverlappingFlexGroups {
                        position: position.clone(),
                        first: first.to_string(),
                        second: flex.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nba_like() -> RosterRules {
        RosterRules::new([("PG", 1), ("SG", 1), ("SF", 1), ("PF", 1), ("C", 1)], 200.0)
            .with_flex("G", ["PG", "SG"], 1)
            .with_flex("F", ["SF", "PF"], 1)
            .with_utility(1)
    }

    #[test]
    fn test_roster_size_and_flex_lookup() {
        let rules = nba_like();
        assert_eq!(rules.roster_size(), 8);
        assert_eq!(rules.flex_group_of("SG"), Some("G"));
        assert_eq!(rules.flex_group_of("C"), None);
        assert_eq!(rules.flex_base(&rules.flex["F"]), 2);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults_flex_and_utility() {
        let rules = RosterRules::from_json(r#"{"positions": {"QB": 1, "RB": 2}, "budget": 200}"#).unwrap();
        assert_eq!(rules.positions["RB"], 2);
        assert_eq!(rules.budget, 200.0);
        assert!(rules.flex.is_empty());
        assert_eq!(rules.utility, 0);

        let rules = RosterRules::from_json(
            r#"{
                "positions": {"RB": 2, "WR": 3},
                "budget": 100,
                "flex": {"FLEX": {"positions": ["RB", "WR"], "count": 1}},
                "utility": 2
            }"#,
        )
        .unwrap();
        assert_eq!(rules.flex["FLEX"].count, 1);
        assert_eq!(rules.utility, 2);
        assert_eq!(rules.roster_size(), 8);
    }

    #[test]
    fn test_validate_rejects_bad_flex() {
        let rules = RosterRules::new([("RB", 2)], 100.0).with_flex("FLEX", ["RB", "TE"], 1);
        assert!(matches!(
            rules.validate(),
            Err(BuildError::UnknownFlexPosition { ref position, .. }) if position == "TE"
        ));

        let rules = RosterRules::new([("RB", 2)], 100.0).with_flex("FLEX", Vec::<String>::new(), 1);
        assert!(matches!(rules.validate(), Err(BuildError::EmptyFlexGroup(ref f)) if f == "FLEX"));

        let rules = RosterRules::new([("RB", 2), ("WR", 3)], 100.0)
            .with_flex("A", ["RB"], 1)
            .with_flex("B", ["RB", "WR"], 1);
        assert!(matches!(
            rules.validate(),
            Err(BuildError::OverlappingFlexGroups { ref position, .. }) if position == "RB"
        ));
    }

    #[test]
    fn test_validate_rejects_name_collisions() {
        let rules = RosterRules::new([("RB", 2), ("WR", 3)], 100.0).with_flex("RB", ["WR"], 1);
        assert!(matches!(rules.validate(), Err(BuildError::DuplicateConstraintName(ref n)) if n == "RB"));

        let rules = RosterRules::new([(LINEUP_COST, 1)], 100.0);
        assert!(matches!(rules.validate(), Err(BuildError::DuplicateConstraintName(_))));
    }

    #[test]
    fn test_validate_rejects_bad_budget() {
        assert!(matches!(
            RosterRules::new([("QB", 1)], -5.0).validate(),
            Err(BuildError::InvalidBudget(_))
        ));
        assert!(matches!(
            RosterRules::new([("QB", 1)], f64::INFINITY).validate(),
            Err(BuildError::InvalidBudget(_))
        ));
    }
}
