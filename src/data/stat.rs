use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::formula::variables::canonical_name;

/// Every stat the calculator knows about. Serializes as the canonical formula
/// variable name and deserializes from any alias the variable mapper knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKind {
    Hp,
    Mp,
    Power,
    Magic,
    Defense,
    MagicDefense,
    Agility,
    Dexterity,
    Critical,
    Hit,
    Flee,
    Luck,
    /// Weapon attack power.
    AttackPower,
    /// Weapon critical rate (percent points).
    CritRate,
    /// Weapon critical damage (percent points).
    CritDamage,
}

impl StatKind {
    pub const ALL: [StatKind; 15] = [
        StatKind::Hp,
        StatKind::Mp,
        StatKind::Power,
        StatKind::Magic,
        StatKind::Defense,
        StatKind::MagicDefense,
        StatKind::Agility,
        StatKind::Dexterity,
        StatKind::Critical,
        StatKind::Hit,
        StatKind::Flee,
        StatKind::Luck,
        StatKind::AttackPower,
        StatKind::CritRate,
        StatKind::CritDamage,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Mp => "MP",
            Self::Power => "Power",
            Self::Magic => "Magic",
            Self::Defense => "Defense",
            Self::MagicDefense => "MagicDefense",
            Self::Agility => "Agility",
            Self::Dexterity => "Dex",
            Self::Critical => "Critical",
            Self::Hit => "Hit",
            Self::Flee => "Flee",
            Self::Luck => "Luck",
            Self::AttackPower => "AttackPower",
            Self::CritRate => "CritRate",
            Self::CritDamage => "CritDamage",
        }
    }

    /// Stats that only exist on weapons.
    pub const fn is_weapon_stat(self) -> bool {
        matches!(self, Self::AttackPower | Self::CritRate | Self::CritDamage)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for StatKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for StatKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        canonical_name(&raw).ok_or_else(|| D::Error::custom(format!("unknown stat '{raw}'")))
    }
}

/// Sparse stat-kind → amount mapping. Absent kinds read as 0.
///
/// Operations return new blocks; nothing mutates a block another stage holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatBlock {
    values: BTreeMap<StatKind, f64>,
}

impl StatBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (StatKind, f64)>,
    {
        let mut block = Self::new();
        for (kind, value) in pairs {
            block.add(kind, value);
        }
        block
    }

    pub fn get(&self, kind: StatKind) -> f64 {
        self.values.get(&kind).copied().unwrap_or(0.0)
    }

    /// True when the kind has an explicit non-zero entry.
    pub fn has(&self, kind: StatKind) -> bool {
        self.values.get(&kind).is_some_and(|value| *value != 0.0)
    }

    pub fn set(&mut self, kind: StatKind, value: f64) {
        self.values.insert(kind, value);
    }

    pub fn add(&mut self, kind: StatKind, value: f64) {
        *self.values.entry(kind).or_insert(0.0) += value;
    }

    pub fn with(mut self, kind: StatKind, value: f64) -> Self {
        self.set(kind, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKind, f64)> + '_ {
        self.values.iter().map(|(kind, value)| (*kind, *value))
    }

    pub fn kinds(&self) -> impl Iterator<Item = StatKind> + '_ {
        self.values.keys().copied()
    }

    /// Element-wise sum.
    pub fn plus(&self, other: &StatBlock) -> StatBlock {
        let mut out = self.clone();
        for (kind, value) in other.iter() {
            out.add(kind, value);
        }
        out
    }

    pub fn scaled(&self, factor: f64) -> StatBlock {
        StatBlock {
            values: self
                .values
                .iter()
                .map(|(kind, value)| (*kind, value * factor))
                .collect(),
        }
    }

    pub fn map_values<F>(&self, mut f: F) -> StatBlock
    where
        F: FnMut(StatKind, f64) -> f64,
    {
        StatBlock {
            values: self
                .values
                .iter()
                .map(|(kind, value)| (*kind, f(*kind, *value)))
                .collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn sum<'a, I>(blocks: I) -> StatBlock
    where
        I: IntoIterator<Item = &'a StatBlock>,
    {
        blocks
            .into_iter()
            .fold(StatBlock::new(), |acc, block| acc.plus(block))
    }
}

/// Catalog rows spell stat keys many ways; unknown keys are dropped with a warning.
impl<'de> Deserialize<'de> for StatBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        let mut block = StatBlock::new();
        for (key, value) in raw {
            match canonical_name(&key) {
                Some(kind) => block.add(kind, value),
                None => tracing::warn!(key = %key, "ignoring unknown stat key"),
            }
        }
        Ok(block)
    }
}

impl FromIterator<(StatKind, f64)> for StatBlock {
    fn from_iter<T: IntoIterator<Item = (StatKind, f64)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_kinds_read_as_zero() {
        let block = StatBlock::new().with(StatKind::Hp, 10.0);
        assert_eq!(block.get(StatKind::Hp), 10.0);
        assert_eq!(block.get(StatKind::Mp), 0.0);
        assert!(!block.has(StatKind::Mp));
    }

    #[test]
    fn plus_does_not_touch_operands() {
        let a = StatBlock::from_pairs([(StatKind::Power, 5.0)]);
        let b = StatBlock::from_pairs([(StatKind::Power, 7.0), (StatKind::Luck, 1.0)]);
        let c = a.plus(&b);
        assert_eq!(c.get(StatKind::Power), 12.0);
        assert_eq!(c.get(StatKind::Luck), 1.0);
        assert_eq!(a.get(StatKind::Power), 5.0);
    }

    #[test]
    fn serializes_with_canonical_names() {
        let block = StatBlock::from_pairs([(StatKind::Hp, 1.0), (StatKind::Dexterity, 2.0)]);
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"HP":1.0,"Dex":2.0}"#);
    }

    #[test]
    fn deserializes_aliases_and_sums_duplicates() {
        let block: StatBlock = serde_json::from_str(r#"{"ATK":3,"Power":4,"nonsense":9}"#).unwrap();
        assert_eq!(block.get(StatKind::Power), 7.0);
        assert_eq!(block.iter().count(), 1);
    }
}
