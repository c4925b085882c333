use serde::Serialize;

use crate::data::build::EquipmentConfiguration;
use crate::data::constants::{rank_value, Constants, ExCategory, WeaponConstants};
use crate::data::item::{EquipmentItem, SlotClass};
use crate::data::stat::StatBlock;
use crate::error::RangeError;

/// Where each part of a resolved item's stats came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BonusBreakdown {
    /// Catalog stats, back-solved to rank F for weapons.
    pub base: StatBlock,
    pub rank: StatBlock,
    pub reinforcement: StatBlock,
    pub forge: StatBlock,
    pub alchemy: StatBlock,
    pub ex: StatBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedEquipment {
    /// Effective flat stats.
    pub stats: StatBlock,
    /// Item percent stats, passed through unranked.
    pub percent: StatBlock,
    pub breakdown: BonusBreakdown,
}

/// Effective stats of one item under a configuration.
///
/// Fails with [`RangeError`] when the configuration exceeds a documented bound
/// for the item's slot class; nothing is clamped.
pub fn resolve(
    item: &EquipmentItem,
    config: &EquipmentConfiguration,
    constants: &Constants,
) -> Result<ResolvedEquipment, RangeError> {
    let class = item.class();
    check_bounds(class, config, constants)?;

    let resolved = match class {
        SlotClass::Weapon => resolve_weapon(item, config, &constants.weapon),
        SlotClass::Armor => resolve_armor(item, config, constants),
        SlotClass::Accessory => resolve_accessory(item, config, constants),
    };
    Ok(resolved)
}

fn max_reinforcement(class: SlotClass, constants: &Constants) -> u32 {
    match class {
        SlotClass::Weapon => constants.weapon.max_reinforcement,
        SlotClass::Armor => constants.armor.max_reinforcement,
        SlotClass::Accessory => 0,
    }
}

fn check_bounds(
    class: SlotClass,
    config: &EquipmentConfiguration,
    constants: &Constants,
) -> Result<(), RangeError> {
    let max = max_reinforcement(class, constants);
    if config.reinforcement > max {
        return Err(RangeError::Reinforcement {
            slot: class.as_str(),
            value: config.reinforcement,
            max,
        });
    }

    let forge_cap = match class {
        SlotClass::Accessory => 0,
        _ => constants.forge_cap,
    };
    if let Some((kind, count)) = config.forge.iter().find(|(_, count)| **count > forge_cap) {
        return Err(RangeError::Forge {
            stat: kind.to_string(),
            value: *count,
            cap: forge_cap,
        });
    }
    let total = config.forge_total();
    if total > u64::from(forge_cap) {
        return Err(RangeError::ForgeTotal {
            total,
            cap: forge_cap,
        });
    }

    let max_ex = match class {
        SlotClass::Weapon => 0,
        _ => constants.ex.max_selections,
    };
    if config.ex.len() > max_ex {
        return Err(RangeError::ExSlots {
            slot: class.as_str(),
            got: config.ex.len(),
            max: max_ex,
        });
    }
    Ok(())
}

fn resolve_weapon(
    item: &EquipmentItem,
    config: &EquipmentConfiguration,
    constants: &WeaponConstants,
) -> ResolvedEquipment {
    let verification = item.is_verification();
    let mut breakdown = BonusBreakdown::default();
    let mut stats = item.stats.clone();

    for kind in WeaponConstants::UPGRADED {
        let catalog = item.stats.get(kind);
        let declared = constants.rank_bonus(kind, item.min_rank);
        let requested = constants.rank_bonus(kind, config.rank);
        // Catalog values are quoted at the item's minimum rank. Applying only the
        // difference keeps the value exact when the requested rank is that rank.
        stats.set(kind, catalog + (requested - declared));
        breakdown.base.set(kind, catalog - declared);
        breakdown.rank.set(kind, requested);

        if !verification {
            let reinforce = constants.reinforce_per_level(kind) * f64::from(config.reinforcement);
            let forge = constants.forge_per_count(kind)
                * f64::from(config.forge.get(&kind).copied().unwrap_or(0));
            stats.add(kind, reinforce + forge);
            breakdown.reinforcement.set(kind, reinforce);
            breakdown.forge.set(kind, forge);
        }
        if config.alchemy {
            let alchemy = constants.alchemy_bonus(kind, config.rank);
            stats.add(kind, alchemy);
            breakdown.alchemy.set(kind, alchemy);
        }
    }
    for (kind, value) in item.stats.iter() {
        if !kind.is_weapon_stat() {
            breakdown.base.set(kind, value);
        }
    }
    for kind in config.forge.keys() {
        if !kind.is_weapon_stat() {
            tracing::warn!(item = %item.name, stat = %kind, "weapon forge only applies to weapon stats");
        }
    }

    ResolvedEquipment {
        stats,
        percent: item.percent_stats.clone(),
        breakdown,
    }
}

fn resolve_armor(
    item: &EquipmentItem,
    config: &EquipmentConfiguration,
    constants: &Constants,
) -> ResolvedEquipment {
    let armor = &constants.armor;
    let verification = item.is_verification();
    let required_level = f64::from(item.required_level.max(1));
    let coefficient = rank_value(&armor.rank_coefficients, config.rank);
    let mut breakdown = BonusBreakdown {
        base: item.stats.clone(),
        ..BonusBreakdown::default()
    };

    if !verification {
        for (kind, count) in &config.forge {
            breakdown
                .forge
                .add(*kind, armor.forge_per_count(*kind) * f64::from(*count));
        }
    }
    let with_forge = item.stats.plus(&breakdown.forge);

    let mut stats = StatBlock::new();
    for (kind, value) in with_forge.iter() {
        let rank_bonus = if value > 0.0 {
            let scaled = value * (1.0 + value.powf(0.2) * coefficient / required_level);
            scaled.round() - value
        } else {
            0.0
        };
        let reinforce = if verification || item.stats.get(kind) == 0.0 {
            0.0
        } else {
            armor.reinforce_per_level(kind) * f64::from(config.reinforcement)
        };
        if rank_bonus != 0.0 {
            breakdown.rank.set(kind, rank_bonus);
        }
        if reinforce != 0.0 {
            breakdown.reinforcement.set(kind, reinforce);
        }
        stats.set(kind, value + rank_bonus + reinforce);
    }

    let ex = ex_bonus(item, config, constants);
    stats = stats.plus(&ex);
    breakdown.ex = ex;

    ResolvedEquipment {
        stats,
        percent: item.percent_stats.clone(),
        breakdown,
    }
}

fn resolve_accessory(
    item: &EquipmentItem,
    config: &EquipmentConfiguration,
    constants: &Constants,
) -> ResolvedEquipment {
    let accessory = &constants.accessory;
    let coefficient =
        rank_value(&accessory.rank_coefficients, config.rank);
    let bonus = (f64::from(item.required_level.max(1)) * coefficient / accessory.rank_divisor).ceil();

    let mut breakdown = BonusBreakdown {
        base: item.stats.clone(),
        ..BonusBreakdown::default()
    };
    if bonus != 0.0 {
        breakdown.rank = item
            .stats
            .iter()
            .filter(|(_, value)| *value != 0.0)
            .map(|(kind, _)| (kind, bonus))
            .collect();
    }
    breakdown.ex = ex_bonus(item, config, constants);
    let stats = StatBlock::sum([&breakdown.base, &breakdown.rank, &breakdown.ex]);

    ResolvedEquipment {
        stats,
        percent: item.percent_stats.clone(),
        breakdown,
    }
}

/// `round(requiredLevel × coefficient + 1)` per EX selection.
fn ex_bonus(item: &EquipmentItem, config: &EquipmentConfiguration, constants: &Constants) -> StatBlock {
    let required_level = f64::from(item.required_level.max(1));
    let mut bonus = StatBlock::new();
    for kind in &config.ex {
        let Some(category) = ExCategory::of(*kind) else {
            tracing::warn!(item = %item.name, stat = %kind, "ignoring EX selection of a weapon-only stat");
            continue;
        };
        let coefficient = constants.ex.coefficient(category, config.rank);
        bonus.add(*kind, (required_level * coefficient + 1.0).round());
    }
    bonus
}

/// Sum of resolved flat stats, the ordering key for optimizer candidates.
pub fn stat_sum(resolved: &ResolvedEquipment) -> f64 {
    resolved.stats.total()
}
