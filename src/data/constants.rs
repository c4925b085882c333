//! Balance constants. Every field falls back to the documented default when the
//! constants catalog omits it, so a partial catalog only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::data::item::Rank;
use crate::data::stat::StatKind;

/// One value per rank, indexed by [`Rank::index`].
pub type RankTable = [f64; 9];

pub fn rank_value(table: &RankTable, rank: Rank) -> f64 {
    table[rank.index()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConstants {
    pub rank_attack: RankTable,
    pub rank_crit_rate: RankTable,
    pub rank_crit_damage: RankTable,
    pub alchemy_attack: RankTable,
    pub alchemy_crit_rate: RankTable,
    pub alchemy_crit_damage: RankTable,
    pub reinforce_attack: f64,
    pub reinforce_crit_rate: f64,
    pub reinforce_crit_damage: f64,
    pub forge_attack: f64,
    pub forge_crit_rate: f64,
    pub forge_crit_damage: f64,
    pub max_reinforcement: u32,
}

impl Default for WeaponConstants {
    fn default() -> Self {
        Self {
            rank_attack: [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0],
            rank_crit_rate: [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0],
            rank_crit_damage: [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0],
            alchemy_attack: [0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 16.0, 20.0],
            alchemy_crit_rate: [0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.6, 2.0],
            alchemy_crit_damage: [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0],
            reinforce_attack: 2.0,
            reinforce_crit_rate: 0.1,
            reinforce_crit_damage: 0.2,
            forge_attack: 3.0,
            forge_crit_rate: 0.5,
            forge_crit_damage: 1.0,
            max_reinforcement: 80,
        }
    }
}

impl WeaponConstants {
    /// The three stats weapon upgrades act on.
    pub const UPGRADED: [StatKind; 3] = [StatKind::AttackPower, StatKind::CritRate, StatKind::CritDamage];

    pub fn rank_bonus(&self, kind: StatKind, rank: Rank) -> f64 {
        match kind {
            StatKind::AttackPower => rank_value(&self.rank_attack, rank),
            StatKind::CritRate => rank_value(&self.rank_crit_rate, rank),
            StatKind::CritDamage => rank_value(&self.rank_crit_damage, rank),
            _ => 0.0,
        }
    }

    pub fn alchemy_bonus(&self, kind: StatKind, rank: Rank) -> f64 {
        match kind {
            StatKind::AttackPower => rank_value(&self.alchemy_attack, rank),
            StatKind::CritRate => rank_value(&self.alchemy_crit_rate, rank),
            StatKind::CritDamage => rank_value(&self.alchemy_crit_damage, rank),
            _ => 0.0,
        }
    }

    pub fn reinforce_per_level(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::AttackPower => self.reinforce_attack,
            StatKind::CritRate => self.reinforce_crit_rate,
            StatKind::CritDamage => self.reinforce_crit_damage,
            _ => 0.0,
        }
    }

    pub fn forge_per_count(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::AttackPower => self.forge_attack,
            StatKind::CritRate => self.forge_crit_rate,
            StatKind::CritDamage => self.forge_crit_damage,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorConstants {
    pub rank_coefficients: RankTable,
    pub reinforce_defense: f64,
    pub reinforce_other: f64,
    pub forge_defense: f64,
    pub forge_other: f64,
    pub max_reinforcement: u32,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        Self {
            rank_coefficients: [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0],
            reinforce_defense: 2.0,
            reinforce_other: 1.0,
            forge_defense: 2.0,
            forge_other: 1.0,
            max_reinforcement: 40,
        }
    }
}

impl ArmorConstants {
    pub fn reinforce_per_level(&self, kind: StatKind) -> f64 {
        if kind == StatKind::Defense {
            self.reinforce_defense
        } else {
            self.reinforce_other
        }
    }

    pub fn forge_per_count(&self, kind: StatKind) -> f64 {
        if kind == StatKind::Defense {
            self.forge_defense
        } else {
            self.forge_other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryConstants {
    pub rank_coefficients: RankTable,
    pub rank_divisor: f64,
}

impl Default for AccessoryConstants {
    fn default() -> Self {
        Self {
            rank_coefficients: [0.0, 10.0, 20.0, 30.0, 40.0, 55.0, 70.0, 85.0, 100.0],
            rank_divisor: 550.0,
        }
    }
}

/// Grouping of EX-selectable stats into the three EX bonus tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExCategory {
    Vital,
    Primary,
    Secondary,
}

impl ExCategory {
    pub fn of(kind: StatKind) -> Option<ExCategory> {
        match kind {
            StatKind::Hp | StatKind::Mp => Some(ExCategory::Vital),
            StatKind::Power | StatKind::Magic | StatKind::Defense | StatKind::MagicDefense => {
                Some(ExCategory::Primary)
            }
            StatKind::Agility
            | StatKind::Dexterity
            | StatKind::Critical
            | StatKind::Hit
            | StatKind::Flee
            | StatKind::Luck => Some(ExCategory::Secondary),
            StatKind::AttackPower | StatKind::CritRate | StatKind::CritDamage => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExConstants {
    pub vital: RankTable,
    pub primary: RankTable,
    pub secondary: RankTable,
    pub max_selections: usize,
}

impl Default for ExConstants {
    fn default() -> Self {
        Self {
            vital: [0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.2, 1.4, 1.6],
            primary: [0.1, 0.12, 0.14, 0.16, 0.18, 0.2, 0.24, 0.28, 0.32],
            secondary: [0.05, 0.06, 0.07, 0.08, 0.09, 0.1, 0.12, 0.14, 0.16],
            max_selections: 2,
        }
    }
}

impl ExConstants {
    pub fn coefficient(&self, category: ExCategory, rank: Rank) -> f64 {
        let table = match category {
            ExCategory::Vital => &self.vital,
            ExCategory::Primary => &self.primary,
            ExCategory::Secondary => &self.secondary,
        };
        rank_value(table, rank)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    pub weapon: WeaponConstants,
    pub armor: ArmorConstants,
    pub accessory: AccessoryConstants,
    pub ex: ExConstants,
    /// Shared cap on the sum of per-parameter forge counts of one item.
    pub forge_cap: u32,
    pub ring_base: f64,
    pub ring_multiplier: f64,
    /// Share of the Critical stat that turns into crit rate.
    pub crit_rate_from_critical: f64,
    /// Critical hits deal this many percent extra before weapon crit damage.
    pub critical_damage_base: f64,
    pub max_convergence_iterations: u32,
    pub max_sp_per_branch: u32,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            weapon: WeaponConstants::default(),
            armor: ArmorConstants::default(),
            accessory: AccessoryConstants::default(),
            ex: ExConstants::default(),
            forge_cap: 12,
            ring_base: 40.0,
            ring_multiplier: 0.1,
            crit_rate_from_critical: 0.3,
            critical_damage_base: 50.0,
            max_convergence_iterations: 100,
            max_sp_per_branch: 200,
        }
    }
}
