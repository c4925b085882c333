//! The character build being calculated and per-slot equipment configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::item::{ItemSlot, Rank};
use crate::data::job::Branch;
use crate::data::stat::{StatBlock, StatKind};
use crate::error::RangeError;

/// Equipment slots of a character. Both accessory slots take accessory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Weapon,
    Head,
    Body,
    Leg,
    Accessory1,
    Accessory2,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::Weapon,
        EquipSlot::Head,
        EquipSlot::Body,
        EquipSlot::Leg,
        EquipSlot::Accessory1,
        EquipSlot::Accessory2,
    ];

    pub const fn item_slot(self) -> ItemSlot {
        match self {
            EquipSlot::Weapon => ItemSlot::Weapon,
            EquipSlot::Head => ItemSlot::Head,
            EquipSlot::Body => ItemSlot::Body,
            EquipSlot::Leg => ItemSlot::Leg,
            EquipSlot::Accessory1 | EquipSlot::Accessory2 => ItemSlot::Accessory,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Head => "head",
            EquipSlot::Body => "body",
            EquipSlot::Leg => "leg",
            EquipSlot::Accessory1 => "accessory1",
            EquipSlot::Accessory2 => "accessory2",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upgrades applied to one equipped item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentConfiguration {
    pub rank: Rank,
    pub reinforcement: u32,
    /// Per-parameter forge counts. Their sum is capped per item.
    pub forge: BTreeMap<StatKind, u32>,
    /// Weapons only.
    pub alchemy: bool,
    /// Armor and accessories only, at most two.
    pub ex: Vec<StatKind>,
}

impl EquipmentConfiguration {
    pub fn at_rank(rank: Rank) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }

    /// Sum of every forge count, widened so hostile maps cannot wrap.
    pub fn forge_total(&self) -> u64 {
        self.forge.values().map(|count| u64::from(*count)).sum()
    }

    /// Set one parameter's forge count, refusing updates that would push the
    /// item's total past `cap`.
    pub fn set_forge(&mut self, kind: StatKind, count: u32, cap: u32) -> Result<(), RangeError> {
        let others: u64 = self
            .forge
            .iter()
            .filter(|(k, _)| **k != kind)
            .map(|(_, v)| u64::from(*v))
            .sum();
        if others + u64::from(count) > u64::from(cap) {
            let remaining = u64::from(cap).saturating_sub(others);
            return Err(RangeError::Forge {
                stat: kind.to_string(),
                value: count,
                cap: u32::try_from(remaining).unwrap_or(cap),
            });
        }
        if count == 0 {
            self.forge.remove(&kind);
        } else {
            self.forge.insert(kind, count);
        }
        Ok(())
    }

    pub fn with_reinforcement(mut self, level: u32) -> Self {
        self.reinforcement = level;
        self
    }

    pub fn with_alchemy(mut self, alchemy: bool) -> Self {
        self.alchemy = alchemy;
        self
    }

    pub fn with_ex(mut self, ex: Vec<StatKind>) -> Self {
        self.ex = ex;
        self
    }
}

/// An item placed in a slot, referenced by catalog display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub item: String,
    #[serde(default)]
    pub config: EquipmentConfiguration,
}

impl EquippedItem {
    pub fn new(item: impl Into<String>, config: EquipmentConfiguration) -> Self {
        Self {
            item: item.into(),
            config,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpAllocation {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl SpAllocation {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn get(&self, branch: Branch) -> u32 {
        match branch {
            Branch::A => self.a,
            Branch::B => self.b,
            Branch::C => self.c,
        }
    }

    pub fn validate(&self, max_per_branch: u32) -> Result<(), RangeError> {
        for branch in Branch::ALL {
            let value = self.get(branch);
            if value > max_per_branch {
                return Err(RangeError::SpBranch {
                    branch: branch.letter(),
                    value,
                    max: max_per_branch,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingBuff {
    pub enabled: bool,
    pub target: Option<StatKind>,
}

/// How critical hits enter the damage number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritMode {
    Always,
    Never,
    #[default]
    Expected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBuild {
    pub job: String,
    pub level: u32,
    #[serde(default)]
    pub equipment: BTreeMap<EquipSlot, EquippedItem>,
    #[serde(default)]
    pub sp: SpAllocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<String>,
    #[serde(default)]
    pub runes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emblem: Option<String>,
    #[serde(default)]
    pub ring: RingBuff,
    /// Flat manual adjustments.
    #[serde(default)]
    pub manual: StatBlock,
    /// User percent bonuses (stage 3).
    #[serde(default)]
    pub user_percent: StatBlock,
    /// Apply user percent as a fixed point instead of a single pass.
    #[serde(default)]
    pub recursive_percent: bool,
    #[serde(default)]
    pub crit_mode: CritMode,
}

impl CharacterBuild {
    pub fn new(job: impl Into<String>, level: u32) -> Self {
        Self {
            job: job.into(),
            level,
            equipment: BTreeMap::new(),
            sp: SpAllocation::default(),
            food: None,
            runes: Vec::new(),
            emblem: None,
            ring: RingBuff::default(),
            manual: StatBlock::new(),
            user_percent: StatBlock::new(),
            recursive_percent: false,
            crit_mode: CritMode::default(),
        }
    }

    pub fn equip(mut self, slot: EquipSlot, item: impl Into<String>, config: EquipmentConfiguration) -> Self {
        self.equipment.insert(slot, EquippedItem::new(item, config));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_cap_holds_across_incremental_updates() {
        let mut config = EquipmentConfiguration::default();
        config.set_forge(StatKind::AttackPower, 8, 12).unwrap();
        config.set_forge(StatKind::CritRate, 4, 12).unwrap();
        let err = config.set_forge(StatKind::CritDamage, 1, 12).unwrap_err();
        assert_eq!(
            err,
            RangeError::Forge {
                stat: "CritDamage".to_string(),
                value: 1,
                cap: 0
            }
        );
        // Lowering one parameter frees room for another.
        config.set_forge(StatKind::AttackPower, 5, 12).unwrap();
        config.set_forge(StatKind::CritDamage, 3, 12).unwrap();
        assert_eq!(config.forge_total(), 12);
    }

    #[test]
    fn sp_validation_names_branch_and_bound() {
        let err = SpAllocation::new(10, 250, 0).validate(200).unwrap_err();
        assert_eq!(
            err,
            RangeError::SpBranch {
                branch: 'B',
                value: 250,
                max: 200
            }
        );
        assert!(SpAllocation::new(200, 0, 5).validate(200).is_ok());
    }

    #[test]
    fn build_round_trips_through_yaml() {
        let yaml = r#"
job: Knight
level: 30
equipment:
  weapon: { item: Iron Sword, config: { rank: A, reinforcement: 5, forge: { AttackPower: 3 } } }
  accessory1: { item: Ring }
sp: { a: 10 }
ring: { enabled: true, target: Power }
"#;
        let build: CharacterBuild = serde_yaml::from_str(yaml).unwrap();
        let weapon = &build.equipment[&EquipSlot::Weapon];
        assert_eq!(weapon.config.rank, Rank::A);
        assert_eq!(weapon.config.forge[&StatKind::AttackPower], 3);
        assert_eq!(build.equipment[&EquipSlot::Accessory1].config.rank, Rank::F);
        assert_eq!(build.ring.target, Some(StatKind::Power));
        assert_eq!(build.crit_mode, CritMode::Expected);
    }
}
