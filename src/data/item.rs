use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::stat::{StatBlock, StatKind};

/// Nine-step quality tier, `F` lowest to `SSS` highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    #[default]
    F,
    E,
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

impl Rank {
    pub const ALL: [Rank; 9] = [
        Rank::F,
        Rank::E,
        Rank::D,
        Rank::C,
        Rank::B,
        Rank::A,
        Rank::S,
        Rank::SS,
        Rank::SSS,
    ];

    /// Parse a rank name; anything unrecognized clamps to `SSS`.
    pub fn parse(raw: &str) -> Rank {
        match raw.trim().to_ascii_uppercase().as_str() {
            "F" => Rank::F,
            "E" => Rank::E,
            "D" => Rank::D,
            "C" => Rank::C,
            "B" => Rank::B,
            "A" => Rank::A,
            "S" => Rank::S,
            "SS" => Rank::SS,
            _ => Rank::SSS,
        }
    }

    /// Position in the per-rank coefficient tables (F = 0).
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Rank::F => "F",
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
            Rank::SS => "SS",
            Rank::SSS => "SSS",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Rank::parse(&raw))
    }
}

/// Catalog slot of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSlot {
    Weapon,
    Head,
    Body,
    Leg,
    Accessory,
}

/// Resolver family; each class has its own bonus algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    Weapon,
    Armor,
    Accessory,
}

impl SlotClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            SlotClass::Weapon => "weapon",
            SlotClass::Armor => "armor",
            SlotClass::Accessory => "accessory",
        }
    }
}

impl ItemSlot {
    pub const fn class(self) -> SlotClass {
        match self {
            ItemSlot::Weapon => SlotClass::Weapon,
            ItemSlot::Head | ItemSlot::Body | ItemSlot::Leg => SlotClass::Armor,
            ItemSlot::Accessory => SlotClass::Accessory,
        }
    }
}

fn default_required_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub name: String,
    pub slot: ItemSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<String>,
    /// Flat stats as listed in the catalog (at `min_rank` for weapons).
    #[serde(default)]
    pub stats: StatBlock,
    #[serde(default)]
    pub percent_stats: StatBlock,
    #[serde(default = "default_required_level")]
    pub required_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_job: Option<String>,
    /// Lowest rank the item drops at.
    #[serde(default)]
    pub min_rank: Rank,
    /// Remaining catalog columns, kept for presentation and export.
    #[serde(flatten)]
    pub raw: BTreeMap<String, serde_json::Value>,
}

impl EquipmentItem {
    pub fn new(name: impl Into<String>, slot: ItemSlot) -> Self {
        Self {
            name: name.into(),
            slot,
            weapon_type: None,
            stats: StatBlock::new(),
            percent_stats: StatBlock::new(),
            required_level: default_required_level(),
            required_job: None,
            min_rank: Rank::F,
            raw: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, kind: StatKind, value: f64) -> Self {
        self.stats.add(kind, value);
        self
    }

    pub fn with_percent_stat(mut self, kind: StatKind, value: f64) -> Self {
        self.percent_stats.add(kind, value);
        self
    }

    pub fn with_weapon_type(mut self, weapon_type: impl Into<String>) -> Self {
        self.weapon_type = Some(weapon_type.into());
        self
    }

    pub fn with_required_level(mut self, level: u32) -> Self {
        self.required_level = level;
        self
    }

    pub fn with_min_rank(mut self, rank: Rank) -> Self {
        self.min_rank = rank;
        self
    }

    pub fn class(&self) -> SlotClass {
        self.slot.class()
    }

    /// Verification-event items: catalog names carry a marker and the item
    /// cannot be reinforced or forged.
    pub fn is_verification(&self) -> bool {
        self.name.contains("検証") || self.name.to_lowercase().contains("verification")
    }
}
