//! The immutable catalog handle threaded through every calculation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::damage::extra_attack::ExtraAttack;
use crate::data::constants::Constants;
use crate::data::item::{EquipmentItem, ItemSlot, SlotClass};
use crate::data::job::JobDefinition;
use crate::data::stat::StatBlock;
use crate::error::LookupError;
use crate::formula::FormulaCache;

/// A consumable or passive buff row (emblem, rune, food).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffRow {
    pub name: String,
    #[serde(default)]
    pub stats: StatBlock,
    /// Percent bonuses; only emblems feed them into the percent stage.
    #[serde(default)]
    pub percent: StatBlock,
}

impl BuffRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: StatBlock::new(),
            percent: StatBlock::new(),
        }
    }
}

/// Formula set of one skill. Absent entries fall back to the skill defaults,
/// then to multiplier 1, 1 hit, no MP cost, no cooldown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillFormulas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    #[serde(default, flatten)]
    pub defaults: SkillFormulas,
    /// Weapon-type specific overrides, consulted before `defaults`.
    #[serde(default)]
    pub weapon_types: BTreeMap<String, SkillFormulas>,
}

impl SkillDefinition {
    /// Effective formulas for a weapon type: per-type entries win field by field.
    pub fn formulas_for(&self, weapon_type: &str) -> SkillFormulas {
        let defaults = self.defaults.clone();
        let Some(specific) = self.weapon_types.get(weapon_type) else {
            return defaults;
        };
        SkillFormulas {
            multiplier: specific.multiplier.clone().or(defaults.multiplier),
            hits: specific.hits.clone().or(defaults.hits),
            mp_cost: specific.mp_cost.clone().or(defaults.mp_cost),
            cooldown: specific.cooldown.clone().or(defaults.cooldown),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaTable {
    /// Stage-1 BaseStatus formula. Variables: Equip, Job, SP, Food, Manual, Rune, Level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_status: Option<String>,
    /// Base damage formula per weapon type.
    pub weapon_damage: BTreeMap<String, String>,
    /// Critical hit damage. Variables: Damage, CritDamage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_damage: Option<String>,
    pub skills: BTreeMap<String, SkillDefinition>,
    /// Additional-attack behaviors keyed by weapon name, layered over the builtin table.
    pub extra_attacks: BTreeMap<String, ExtraAttack>,
}

/// Every read-only table a calculation needs. Loaded once, then shared by
/// reference; nothing in the core mutates it.
#[derive(Debug, Default)]
pub struct Catalogs {
    pub weapons: Vec<EquipmentItem>,
    pub armors: Vec<EquipmentItem>,
    pub accessories: Vec<EquipmentItem>,
    pub emblems: Vec<BuffRow>,
    pub runes: Vec<BuffRow>,
    pub foods: Vec<BuffRow>,
    pub jobs: Vec<JobDefinition>,
    pub formulas: FormulaTable,
    pub constants: Constants,
    cache: FormulaCache,
}

impl Catalogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an item in the table matching its slot class.
    pub fn add_item(&mut self, item: EquipmentItem) {
        match item.class() {
            SlotClass::Weapon => self.weapons.push(item),
            SlotClass::Armor => self.armors.push(item),
            SlotClass::Accessory => self.accessories.push(item),
        }
    }

    pub fn with_item(mut self, item: EquipmentItem) -> Self {
        self.add_item(item);
        self
    }

    pub fn with_job(mut self, job: JobDefinition) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn cache(&self) -> &FormulaCache {
        &self.cache
    }

    pub fn items(&self, class: SlotClass) -> &[EquipmentItem] {
        match class {
            SlotClass::Weapon => &self.weapons,
            SlotClass::Armor => &self.armors,
            SlotClass::Accessory => &self.accessories,
        }
    }

    pub fn all_items(&self) -> impl Iterator<Item = &EquipmentItem> {
        self.weapons
            .iter()
            .chain(self.armors.iter())
            .chain(self.accessories.iter())
    }

    /// Look up an item for a slot by display name.
    pub fn item(&self, slot: ItemSlot, name: &str) -> Result<&EquipmentItem, LookupError> {
        self.items(slot.class())
            .iter()
            .find(|item| item.slot == slot && item.name == name)
            .ok_or_else(|| LookupError::Item(name.to_string()))
    }

    pub fn job(&self, name: &str) -> Result<&JobDefinition, LookupError> {
        self.jobs
            .iter()
            .find(|job| job.name == name)
            .ok_or_else(|| LookupError::Job(name.to_string()))
    }

    pub fn food(&self, name: &str) -> Result<&BuffRow, LookupError> {
        find_row(&self.foods, name).ok_or_else(|| LookupError::Food(name.to_string()))
    }

    pub fn rune(&self, name: &str) -> Result<&BuffRow, LookupError> {
        find_row(&self.runes, name).ok_or_else(|| LookupError::Rune(name.to_string()))
    }

    pub fn emblem(&self, name: &str) -> Result<&BuffRow, LookupError> {
        find_row(&self.emblems, name).ok_or_else(|| LookupError::Emblem(name.to_string()))
    }

    pub fn skill(&self, name: &str) -> Result<&SkillDefinition, LookupError> {
        self.formulas
            .skills
            .get(name)
            .ok_or_else(|| LookupError::Skill(name.to_string()))
    }

    pub fn weapon_formula(&self, weapon_type: &str) -> Result<&str, LookupError> {
        self.formulas
            .weapon_damage
            .get(weapon_type)
            .map(String::as_str)
            .ok_or_else(|| LookupError::WeaponType(weapon_type.to_string()))
    }
}

fn find_row<'a>(rows: &'a [BuffRow], name: &str) -> Option<&'a BuffRow> {
    rows.iter().find(|row| row.name == name)
}
