use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::build::{CharacterBuild, EquipSlot};
use crate::data::catalog::Catalogs;
use crate::data::job::JobDefinition;
use crate::data::stat::{StatBlock, StatKind};
use crate::equipment::{resolve, ResolvedEquipment};
use crate::error::{CalcError, RangeError};
use crate::formula::{FormulaCache, Variables};
use crate::sp_tree::{resolve_sp_tree, SpTreeState};
use crate::stats::breakdown::{FormulaFailure, SourceBreakdown, StatSource};
use crate::stats::convergence::{
    apply_percent_once, apply_percent_recursive, ring_convergence, RingConvergence,
};

/// How stage 1 folds the sources into BaseStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "formula", rename_all = "snake_case")]
pub enum BaseStatusStrategy {
    /// Evaluate the catalog formula once per stat kind, substituting each
    /// source's amount for that kind.
    Formula(String),
    /// Plain sum of every source.
    Additive,
}

impl BaseStatusStrategy {
    pub fn from_catalogs(catalogs: &Catalogs) -> Self {
        match &catalogs.formulas.base_status {
            Some(formula) if !formula.trim().is_empty() => Self::Formula(formula.clone()),
            _ => Self::Additive,
        }
    }

    /// Fold the sources. Per-kind formula failures fall back to the additive sum
    /// for that kind only and are recorded in `failures`.
    pub fn apply(
        &self,
        sources: &SourceBreakdown,
        level: u32,
        cache: &FormulaCache,
        failures: &mut Vec<FormulaFailure>,
    ) -> StatBlock {
        let additive = sources.additive_total();
        let Self::Formula(formula) = self else {
            return additive;
        };

        let mut base = StatBlock::new();
        let mut variables = Variables::new();
        variables.insert("Level".to_string(), f64::from(level));
        for kind in sources.kinds() {
            for source in StatSource::ALL {
                variables.insert(source.variable().to_string(), sources.amount(source, kind));
            }
            match cache.evaluate(formula, &variables) {
                Ok(value) => base.set(kind, value),
                Err(err) => {
                    failures.push(FormulaFailure::new("base_status", Some(kind), formula.as_str(), err));
                    base.set(kind, additive.get(kind));
                }
            }
        }
        base
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatedStats {
    pub job: String,
    pub level: u32,
    /// Resolved stats of every equipped slot.
    pub equipment: BTreeMap<EquipSlot, ResolvedEquipment>,
    pub equipment_totals: StatBlock,
    pub breakdown: SourceBreakdown,
    pub sp_tree: SpTreeState,
    pub base_strategy: BaseStatusStrategy,
    /// Stage 1.
    pub base: StatBlock,
    /// Job plus emblem percent used by stage 2.
    pub percent: StatBlock,
    /// Stage 2.
    pub after_percent: StatBlock,
    /// User plus equipment percent used by stage 3.
    pub user_percent: StatBlock,
    /// Stage 3.
    pub after_user_percent: StatBlock,
    pub user_percent_iterations: u32,
    /// Stage 4; absent when the ring is disabled or its target is not on any equipment.
    pub ring: Option<RingConvergence>,
    pub final_stats: StatBlock,
    /// Stage 5, in percent.
    pub crit_rate: f64,
    pub failures: Vec<FormulaFailure>,
}

impl CalculatedStats {
    pub fn get(&self, kind: StatKind) -> f64 {
        self.final_stats.get(kind)
    }
}

pub(crate) fn check_level(job: &JobDefinition, level: u32) -> Result<(), RangeError> {
    if level == 0 || level > job.max_level {
        return Err(RangeError::Level {
            job: job.name.clone(),
            value: level,
            max: job.max_level,
        });
    }
    Ok(())
}

/// Resolve every equipped slot against the catalogs.
pub fn resolve_equipment(
    build: &CharacterBuild,
    catalogs: &Catalogs,
) -> Result<BTreeMap<EquipSlot, ResolvedEquipment>, CalcError> {
    let mut resolved = BTreeMap::new();
    for (slot, equipped) in &build.equipment {
        let item = catalogs.item(slot.item_slot(), &equipped.item)?;
        resolved.insert(*slot, resolve(item, &equipped.config, &catalogs.constants)?);
    }
    Ok(resolved)
}

/// Run the five-stage stat fold. The result depends only on `build` and `catalogs`.
pub fn compute_stats(build: &CharacterBuild, catalogs: &Catalogs) -> Result<CalculatedStats, CalcError> {
    let constants = &catalogs.constants;
    let job = catalogs.job(&build.job)?;
    check_level(job, build.level)?;
    build.sp.validate(constants.max_sp_per_branch)?;

    let equipment = resolve_equipment(build, catalogs)?;
    let equipment_totals = StatBlock::sum(equipment.values().map(|resolved| &resolved.stats));
    let equipment_percent = StatBlock::sum(equipment.values().map(|resolved| &resolved.percent));

    let sp_tree = resolve_sp_tree(&build.sp, &job.sp_tiers);
    let food = match &build.food {
        Some(name) => catalogs.food(name)?.stats.clone(),
        None => StatBlock::new(),
    };
    let mut runes = StatBlock::new();
    for name in &build.runes {
        runes = runes.plus(&catalogs.rune(name)?.stats);
    }
    let emblem_percent = match &build.emblem {
        Some(name) => catalogs.emblem(name)?.percent.clone(),
        None => StatBlock::new(),
    };

    let mut breakdown = SourceBreakdown::new();
    breakdown.insert(StatSource::Equipment, equipment_totals.clone());
    breakdown.insert(StatSource::Job, job.stats_at(build.level));
    breakdown.insert(StatSource::Sp, sp_tree.total.stats.clone());
    breakdown.insert(StatSource::Food, food);
    breakdown.insert(StatSource::Manual, build.manual.clone());
    breakdown.insert(StatSource::Rune, runes);

    let mut failures = Vec::new();
    let base_strategy = BaseStatusStrategy::from_catalogs(catalogs);
    let base = base_strategy.apply(&breakdown, build.level, catalogs.cache(), &mut failures);

    let percent = job.percent_bonus.plus(&emblem_percent);
    let after_percent = apply_percent_once(&base, &percent);

    let user_percent = build.user_percent.plus(&equipment_percent);
    let (after_user_percent, user_percent_iterations) = if build.recursive_percent {
        let outcome =
            apply_percent_recursive(&after_percent, &user_percent, constants.max_convergence_iterations);
        (outcome.stats, outcome.iterations)
    } else {
        (apply_percent_once(&after_percent, &user_percent), 1)
    };

    let ring = match build.ring.target {
        Some(target) if build.ring.enabled && equipment_totals.has(target) => Some(ring_convergence(
            target,
            equipment_totals.get(target),
            constants.ring_base,
            constants.ring_multiplier,
            constants.max_convergence_iterations,
        )),
        _ => None,
    };
    let mut final_stats = after_user_percent.clone();
    if let Some(ring) = &ring {
        final_stats.add(ring.target, ring.delta);
    }

    let crit_rate = final_stats.get(StatKind::CritRate)
        + final_stats.get(StatKind::Critical) * constants.crit_rate_from_critical;

    tracing::debug!(
        job = %build.job,
        level = build.level,
        user_percent_iterations,
        ring_iterations = ring.as_ref().map(|r| r.iterations),
        failures = failures.len(),
        "stats computed"
    );

    Ok(CalculatedStats {
        job: job.name.clone(),
        level: build.level,
        equipment,
        equipment_totals,
        breakdown,
        sp_tree,
        base_strategy,
        base,
        percent,
        after_percent,
        user_percent,
        after_user_percent,
        user_percent_iterations,
        ring,
        final_stats,
        crit_rate,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::build::EquipmentConfiguration;
    use crate::data::catalog::BuffRow;
    use crate::data::item::{EquipmentItem, ItemSlot};
    use crate::error::LookupError;

    fn catalogs() -> Catalogs {
        let mut job = JobDefinition::new("Knight");
        job.base_stats = StatBlock::from_pairs([(StatKind::Hp, 100.0), (StatKind::Power, 10.0)]);
        job.growth = StatBlock::from_pairs([(StatKind::Power, 1.0)]);
        job.max_level = 50;
        let mut catalogs = Catalogs::new()
            .with_job(job)
            .with_item(
                EquipmentItem::new("Blade", ItemSlot::Weapon)
                    .with_weapon_type("Sword")
                    .with_stat(StatKind::AttackPower, 50.0)
                    .with_stat(StatKind::Power, 20.0),
            );
        let mut emblem = BuffRow::new("Lion");
        emblem.percent = StatBlock::from_pairs([(StatKind::Power, 10.0)]);
        catalogs.emblems.push(emblem);
        catalogs
    }

    fn build() -> CharacterBuild {
        CharacterBuild::new("Knight", 10).equip(EquipSlot::Weapon, "Blade", EquipmentConfiguration::default())
    }

    #[test]
    fn additive_base_sums_sources() {
        let stats = compute_stats(&build(), &catalogs()).unwrap();
        assert_eq!(stats.base_strategy, BaseStatusStrategy::Additive);
        // job 10 + 1 × 10, weapon 20
        assert_eq!(stats.base.get(StatKind::Power), 40.0);
        assert_eq!(stats.final_stats.get(StatKind::AttackPower), 50.0);
        assert!(stats.ring.is_none());
    }

    #[test]
    fn formula_base_substitutes_each_source() {
        let mut catalogs = catalogs();
        catalogs.formulas.base_status = Some("Equip * 2 + Job".to_string());
        let stats = compute_stats(&build(), &catalogs).unwrap();
        assert_eq!(stats.base.get(StatKind::Power), 60.0);
        assert_eq!(stats.base.get(StatKind::Hp), 100.0);
        assert!(stats.failures.is_empty());
    }

    #[test]
    fn formula_failure_falls_back_per_stat() {
        let mut catalogs = catalogs();
        catalogs.formulas.base_status = Some("Equip + Job + Mystery".to_string());
        let stats = compute_stats(&build(), &catalogs).unwrap();
        assert_eq!(stats.base.get(StatKind::Power), 40.0);
        assert_eq!(stats.failures.len(), stats.breakdown.kinds().len());
        assert_eq!(stats.failures[0].stage, "base_status");
    }

    #[test]
    fn emblem_percent_applies_in_stage_two() {
        let mut build = build();
        build.emblem = Some("Lion".to_string());
        let stats = compute_stats(&build, &catalogs()).unwrap();
        assert_eq!(stats.after_percent.get(StatKind::Power), 44.0);
    }

    #[test]
    fn ring_adds_only_converged_delta() {
        let mut build = build();
        build.ring.enabled = true;
        build.ring.target = Some(StatKind::Power);
        let stats = compute_stats(&build, &catalogs()).unwrap();
        let ring = stats.ring.clone().unwrap();
        assert!(ring.converged);
        assert_eq!(
            stats.final_stats.get(StatKind::Power),
            stats.after_user_percent.get(StatKind::Power) + ring.delta
        );
    }

    #[test]
    fn ring_targeting_absent_stat_is_a_no_op() {
        let mut build = build();
        build.ring.enabled = true;
        build.ring.target = Some(StatKind::Luck);
        let stats = compute_stats(&build, &catalogs()).unwrap();
        assert!(stats.ring.is_none());
        assert_eq!(stats.final_stats, stats.after_user_percent);
    }

    #[test]
    fn contract_violations_fail_fast() {
        let build = CharacterBuild::new("Knight", 51);
        assert!(matches!(
            compute_stats(&build, &catalogs()),
            Err(CalcError::Range(RangeError::Level { max: 50, .. }))
        ));
        let build = CharacterBuild::new("Paladin", 1);
        assert_eq!(
            compute_stats(&build, &catalogs()).unwrap_err(),
            CalcError::Lookup(LookupError::Job("Paladin".to_string()))
        );
        let mut build = CharacterBuild::new("Knight", 1);
        build.food = Some("Cake".to_string());
        assert_eq!(
            compute_stats(&build, &catalogs()).unwrap_err(),
            CalcError::Lookup(LookupError::Food("Cake".to_string()))
        );
    }
}
