use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::RosterRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Yahoo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    Nfl,
    Nba,
    Mlb,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Site::Yahoo => "Yahoo",
        })
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            League::Nfl => "NFL",
            League::Nba => "NBA",
            League::Mlb => "MLB",
        })
    }
}

/// Contest format a site uses for a league
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDefaults {
    pub rules: RosterRules,
    /// Injury statuses whose players should be dropped before optimizing
    pub excluded_injury_statuses: &'static [&'static str],
}

/// Default rules for a site and league, if that combination is supported
pub fn site_defaults(site: Site, league: League) -> Option<SiteDefaults> {
    match (site, league) {
        (Site::Yahoo, League::Nfl) => Some(SiteDefaults {
            rules: RosterRules::new([("QB", 1), ("RB", 2), ("WR", 3), ("TE", 1), ("DEF", 1)], 200.0)
                .with_flex("FLEX", ["RB", "WR", "TE"], 1),
            excluded_injury_statuses: &["O", "IR", "D"],
        }),
        (Site::Yahoo, League::Nba) => Some(SiteDefaults {
            rules: RosterRules::new([("PG", 1), ("SG", 1), ("SF", 1), ("PF", 1), ("C", 1)], 200.0)
                .with_flex("G", ["PG", "SG"], 1)
                .with_flex("F", ["SF", "PF"], 1)
                .with_utility(1),
            excluded_injury_statuses: &["O", "INJ", "OFS"],
        }),
        (Site::Yahoo, League::Mlb) => None,
    }
}
