//! Weapon-keyed additional attacks. Each behavior is one variant; the catalog
//! may add entries or replace builtin ones by weapon name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::damage::mitigation::{mitigate_extra, mitigate_extra_type_only, Target};
use crate::data::catalog::Catalogs;
use crate::data::stat::{StatBlock, StatKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtraAttack {
    /// A share of the pre-mitigation hit.
    FlatPercentage { percent: f64 },
    /// Agility × coefficient.
    AgilityScaled { coefficient: f64 },
    /// A share of the hit, reduced by `weight` percent of the element resistance
    /// up front instead of the usual element factor.
    ResistanceScaled { percent: f64, weight: f64 },
    /// MP × coefficient.
    MpScaled { coefficient: f64 },
}

impl ExtraAttack {
    /// Damage before target resistances.
    pub fn raw(&self, hit: f64, stats: &StatBlock, target: &Target) -> f64 {
        match *self {
            ExtraAttack::FlatPercentage { percent } => hit * percent / 100.0,
            ExtraAttack::AgilityScaled { coefficient } => stats.get(StatKind::Agility) * coefficient,
            ExtraAttack::ResistanceScaled { percent, weight } => {
                hit * percent / 100.0 * (1.0 - target.element_resistance * weight / 100.0 / 100.0)
            }
            ExtraAttack::MpScaled { coefficient } => stats.get(StatKind::Mp) * coefficient,
        }
    }

    /// Additional damage per hit after the target's resistances, never negative.
    pub fn mitigated(&self, hit: f64, stats: &StatBlock, target: &Target) -> f64 {
        let raw = self.raw(hit, stats, target);
        match self {
            ExtraAttack::ResistanceScaled { .. } => mitigate_extra_type_only(raw, target),
            _ => mitigate_extra(raw, target),
        }
    }
}

const BUILTIN: &[(&str, ExtraAttack)] = &[
    ("Twin Fang", ExtraAttack::FlatPercentage { percent: 30.0 }),
    ("Gale Dagger", ExtraAttack::AgilityScaled { coefficient: 0.5 }),
    (
        "Prism Staff",
        ExtraAttack::ResistanceScaled {
            percent: 50.0,
            weight: 50.0,
        },
    ),
    ("Mana Edge", ExtraAttack::MpScaled { coefficient: 0.2 }),
];

/// Additional attacks every catalog starts with.
pub fn builtin_table() -> BTreeMap<String, ExtraAttack> {
    BUILTIN
        .iter()
        .map(|(name, attack)| (name.to_string(), *attack))
        .collect()
}

/// The additional attack of a weapon, catalog entries taking precedence.
pub fn lookup(weapon: &str, catalogs: &Catalogs) -> Option<ExtraAttack> {
    if let Some(attack) = catalogs.formulas.extra_attacks.get(weapon) {
        return Some(*attack);
    }
    BUILTIN
        .iter()
        .find(|(name, _)| *name == weapon)
        .map(|(_, attack)| *attack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn raw_terms_follow_each_behavior() {
        let stats = StatBlock::from_pairs([(StatKind::Agility, 80.0), (StatKind::Mp, 500.0)]);
        let target = Target::new(0.0, 0.0, 40.0);
        assert_eq!(ExtraAttack::FlatPercentage { percent: 25.0 }.raw(200.0, &stats, &target), 50.0);
        assert_eq!(ExtraAttack::AgilityScaled { coefficient: 0.5 }.raw(0.0, &stats, &target), 40.0);
        assert_eq!(ExtraAttack::MpScaled { coefficient: 0.1 }.raw(0.0, &stats, &target), 50.0);
        // 200 × 0.5 × (1 − 40 × 50 / 10000)
        let resistance = ExtraAttack::ResistanceScaled {
            percent: 50.0,
            weight: 50.0,
        };
        assert!(approx_eq(resistance.raw(200.0, &stats, &target), 80.0));
    }

    #[test]
    fn resistance_scaled_skips_the_element_factor() {
        let stats = StatBlock::new();
        let target = Target::new(0.0, 50.0, 40.0);
        let resistance = ExtraAttack::ResistanceScaled {
            percent: 50.0,
            weight: 50.0,
        };
        assert!(approx_eq(resistance.mitigated(200.0, &stats, &target), 40.0));
        let flat = ExtraAttack::FlatPercentage { percent: 50.0 };
        assert!(approx_eq(flat.mitigated(200.0, &stats, &target), 30.0));
    }

    #[test]
    fn catalog_entries_override_builtin() {
        let mut catalogs = Catalogs::new();
        assert_eq!(
            lookup("Twin Fang", &catalogs),
            Some(ExtraAttack::FlatPercentage { percent: 30.0 })
        );
        catalogs
            .formulas
            .extra_attacks
            .insert("Twin Fang".to_string(), ExtraAttack::MpScaled { coefficient: 1.0 });
        assert_eq!(lookup("Twin Fang", &catalogs), Some(ExtraAttack::MpScaled { coefficient: 1.0 }));
        assert_eq!(lookup("Plain Sword", &catalogs), None);
    }

    #[test]
    fn builtin_table_lists_every_behavior() {
        assert_eq!(builtin_table().len(), 4);
    }

    #[test]
    fn deserializes_tagged_variants() {
        let attack: ExtraAttack = serde_yaml::from_str("kind: agility_scaled\ncoefficient: 0.25\n").unwrap();
        assert_eq!(attack, ExtraAttack::AgilityScaled { coefficient: 0.25 });
    }
}
