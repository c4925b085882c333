use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::stat::StatBlock;

/// One of the three independent SP tracks of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    A,
    B,
    C,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::A, Branch::B, Branch::C];

    pub const fn letter(self) -> char {
        match self {
            Branch::A => 'A',
            Branch::B => 'B',
            Branch::C => 'C',
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A tier of an SP branch. Tiers are not assumed to be listed in threshold order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpTier {
    pub branch: Branch,
    pub tier: u32,
    pub required_sp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default)]
    pub stats: StatBlock,
    #[serde(default)]
    pub resistances: BTreeMap<String, f64>,
}

fn default_max_level() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    #[serde(default)]
    pub base_stats: StatBlock,
    /// Added once per character level.
    #[serde(default)]
    pub growth: StatBlock,
    /// Job percent bonuses applied in the percent stage.
    #[serde(default)]
    pub percent_bonus: StatBlock,
    /// Usable weapon types; empty means any.
    #[serde(default)]
    pub weapon_types: Vec<String>,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub sp_tiers: Vec<SpTier>,
    /// Job-specific base damage formulas keyed by weapon type. When present for
    /// the equipped weapon type they replace the shared formula entirely.
    #[serde(default)]
    pub weapon_overrides: BTreeMap<String, String>,
    /// Multiplicative damage correction formula ("Bonus").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_bonus: Option<String>,
}

impl JobDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_stats: StatBlock::new(),
            growth: StatBlock::new(),
            percent_bonus: StatBlock::new(),
            weapon_types: Vec::new(),
            max_level: default_max_level(),
            sp_tiers: Vec::new(),
            weapon_overrides: BTreeMap::new(),
            damage_bonus: None,
        }
    }

    pub fn with_weapon_types<I, S>(mut self, weapon_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weapon_types = weapon_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn can_use_weapon(&self, weapon_type: &str) -> bool {
        self.weapon_types.is_empty() || self.weapon_types.iter().any(|t| t == weapon_type)
    }

    /// Job contribution at a level: base + growth × level.
    pub fn stats_at(&self, level: u32) -> StatBlock {
        self.base_stats.plus(&self.growth.scaled(f64::from(level)))
    }
}
