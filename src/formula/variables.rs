//! Variable mapper: folds the many historical spellings of stat keys
//! (localized names, abbreviations, legacy aliases) into canonical formula names.
//!
//! Every lookup is total: unknown keys map to `None` and absent stats read as 0,
//! so neither the formula engine nor the stat pipeline needs alias special-cases.

use std::collections::HashMap;

use crate::data::stat::{StatBlock, StatKind};

/// Formula variables keyed by canonical name.
pub type Variables = HashMap<String, f64>;

const ALIASES: &[(StatKind, &[&str])] = &[
    (StatKind::Hp, &["hp", "maxhp", "max_hp", "health", "体力", "最大hp"]),
    (StatKind::Mp, &["mp", "maxmp", "max_mp", "mana", "魔力量", "最大mp"]),
    (StatKind::Power, &["power", "atk", "attack", "str", "strength", "pow", "力", "攻撃力"]),
    (StatKind::Magic, &["magic", "matk", "int", "intelligence", "mag", "魔力", "魔法攻撃力"]),
    (StatKind::Defense, &["defense", "defence", "def", "vit", "防御力", "守備力"]),
    (
        StatKind::MagicDefense,
        &["magicdefense", "magic_defense", "mdef", "magicdefence", "res", "魔法防御力", "魔防"],
    ),
    (StatKind::Agility, &["agility", "agi", "spd", "speed", "素早さ", "敏捷"]),
    (StatKind::Dexterity, &["dex", "dexterity", "器用", "器用さ"]),
    (StatKind::Critical, &["critical", "cri", "crit", "会心", "クリティカル"]),
    (StatKind::Hit, &["hit", "accuracy", "acc", "命中"]),
    (StatKind::Flee, &["flee", "evasion", "eva", "dodge", "回避"]),
    (StatKind::Luck, &["luck", "luk", "lck", "運"]),
    (
        StatKind::AttackPower,
        &["attackpower", "attack_power", "weaponattack", "weapon_attack", "wpnatk", "攻撃力(武器)"],
    ),
    (
        StatKind::CritRate,
        &["critrate", "crit_rate", "criticalrate", "critical_rate", "会心率"],
    ),
    (
        StatKind::CritDamage,
        &["critdamage", "crit_damage", "criticaldamage", "critical_damage", "会心ダメージ"],
    ),
];

/// Map any known spelling of a stat key to its kind.
///
/// ASCII comparison is case-insensitive and ignores surrounding whitespace.
pub fn canonical_name(key: &str) -> Option<StatKind> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(kind) = StatKind::ALL.iter().find(|kind| kind.name() == trimmed) {
        return Some(*kind);
    }
    let lowered = trimmed.to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| *alias == lowered))
        .map(|(kind, _)| *kind)
}

/// Variables for every canonical stat name, defaulting absent stats to 0.
pub fn map_variables(stats: &StatBlock) -> Variables {
    StatKind::ALL
        .iter()
        .map(|kind| (kind.name().to_string(), stats.get(*kind)))
        .collect()
}

/// Fold an arbitrarily keyed row into canonical stats. Unknown keys are skipped,
/// keys that alias the same stat are summed.
pub fn map_raw<'a, I>(row: I) -> StatBlock
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    let mut block = StatBlock::new();
    for (key, value) in row {
        if let Some(kind) = canonical_name(key) {
            block.add(kind, *value);
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_alias_and_localized_spellings() {
        assert_eq!(canonical_name("Power"), Some(StatKind::Power));
        assert_eq!(canonical_name("ATK"), Some(StatKind::Power));
        assert_eq!(canonical_name(" atk "), Some(StatKind::Power));
        assert_eq!(canonical_name("攻撃力"), Some(StatKind::Power));
        assert_eq!(canonical_name("MDEF"), Some(StatKind::MagicDefense));
        assert_eq!(canonical_name("Dex"), Some(StatKind::Dexterity));
        assert_eq!(canonical_name("unknown"), None);
        assert_eq!(canonical_name(""), None);
    }

    #[test]
    fn every_canonical_name_round_trips() {
        for kind in StatKind::ALL {
            assert_eq!(canonical_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn map_variables_defaults_absent_stats_to_zero() {
        let vars = map_variables(&StatBlock::new().with(StatKind::Luck, 3.0));
        assert_eq!(vars.len(), StatKind::ALL.len());
        assert_eq!(vars["Luck"], 3.0);
        assert_eq!(vars["HP"], 0.0);
    }

    #[test]
    fn map_raw_sums_aliases_and_skips_unknown_keys() {
        let row: HashMap<String, f64> = [
            ("ATK".to_string(), 4.0),
            ("str".to_string(), 1.0),
            ("flavor".to_string(), 99.0),
        ]
        .into_iter()
        .collect();
        let block = map_raw(&row);
        assert_eq!(block.get(StatKind::Power), 5.0);
        assert_eq!(block.iter().count(), 1);
    }
}
