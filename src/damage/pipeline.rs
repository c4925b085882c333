use serde::Serialize;

use crate::damage::extra_attack::{self, ExtraAttack};
use crate::damage::mitigation::{mitigate_hit, Target};
use crate::data::build::{CharacterBuild, CritMode, EquipSlot};
use crate::data::catalog::{Catalogs, SkillDefinition};
use crate::data::item::ItemSlot;
use crate::data::job::JobDefinition;
use crate::data::stat::StatKind;
use crate::error::CalcError;
use crate::formula::{map_variables, FormulaCache, Variables};
use crate::stats::{CalculatedStats, FormulaFailure};

/// Weapon type used when the weapon slot is empty or the weapon declares none.
pub const UNARMED: &str = "Unarmed";

/// Source of the stage-(a) base damage formula. The two are exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "formula", rename_all = "snake_case")]
pub enum BaseDamageStrategy {
    /// The job declares its own formula for this weapon type; no job bonus applies.
    JobOverride(String),
    /// The shared per-weapon-type formula, followed by the job bonus.
    WeaponFormula(String),
}

impl BaseDamageStrategy {
    pub fn select(job: &JobDefinition, weapon_type: &str, catalogs: &Catalogs) -> Result<Self, CalcError> {
        if let Some(formula) = job.weapon_overrides.get(weapon_type) {
            return Ok(Self::JobOverride(formula.clone()));
        }
        Ok(Self::WeaponFormula(catalogs.weapon_formula(weapon_type)?.to_string()))
    }

    pub fn formula(&self) -> &str {
        match self {
            Self::JobOverride(formula) | Self::WeaponFormula(formula) => formula,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, Self::JobOverride(_))
    }
}

/// How critical hit damage is derived from the corrected damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "formula", rename_all = "snake_case")]
pub enum CriticalDamageStrategy {
    /// Catalog formula over `Damage` and `CritDamage`.
    Formula(String),
    /// `damage × (1 + (base + CritDamage)/100)`.
    Default,
}

impl CriticalDamageStrategy {
    pub fn from_catalogs(catalogs: &Catalogs) -> Self {
        match &catalogs.formulas.critical_damage {
            Some(formula) if !formula.trim().is_empty() => Self::Formula(formula.clone()),
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillValues {
    pub multiplier: f64,
    pub hits: f64,
    pub mp_cost: f64,
    pub cooldown: f64,
}

impl Default for SkillValues {
    /// A normal attack.
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            hits: 1.0,
            mp_cost: 0.0,
            cooldown: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageResult {
    pub weapon: Option<String>,
    pub weapon_type: String,
    pub skill: Option<String>,
    pub base_strategy: BaseDamageStrategy,
    pub job_override: bool,
    /// Stage (a).
    pub base_damage: f64,
    pub job_bonus: f64,
    /// Stage (b).
    pub corrected: f64,
    pub critical_damage: f64,
    /// Crit probability in `[0, 1]`.
    pub crit_chance: f64,
    pub crit_mode: CritMode,
    /// Stage (c).
    pub crit_adjusted: f64,
    pub skill_values: SkillValues,
    /// Stage (d), before mitigation.
    pub per_hit: f64,
    pub extra_attack: Option<ExtraAttack>,
    /// Stage (e), mitigated.
    pub extra_per_hit: f64,
    /// Stage (f).
    pub mitigated_per_hit: f64,
    pub hits: f64,
    /// Expected damage of one use.
    pub total: f64,
    pub mp_cost: f64,
    pub cooldown: f64,
    pub dps: Option<f64>,
    pub ttk: Option<f64>,
    pub mp_efficiency: Option<f64>,
    pub failures: Vec<FormulaFailure>,
}

impl DamageResult {
    pub fn expected_damage(&self) -> f64 {
        self.total
    }
}

fn evaluate_or(
    cache: &FormulaCache,
    stage: &'static str,
    formula: &str,
    variables: &Variables,
    fallback: f64,
    failures: &mut Vec<FormulaFailure>,
) -> f64 {
    match cache.evaluate(formula, variables) {
        Ok(value) => value,
        Err(err) => {
            failures.push(FormulaFailure::new(stage, None, formula, err));
            fallback
        }
    }
}

fn skill_values(
    skill: &SkillDefinition,
    weapon_type: &str,
    cache: &FormulaCache,
    variables: &Variables,
    failures: &mut Vec<FormulaFailure>,
) -> SkillValues {
    let formulas = skill.formulas_for(weapon_type);
    let defaults = SkillValues::default();
    let mut value = |stage: &'static str, formula: &Option<String>, fallback: f64| match formula {
        Some(formula) => evaluate_or(cache, stage, formula, variables, fallback, failures),
        None => fallback,
    };
    SkillValues {
        multiplier: value("skill_multiplier", &formulas.multiplier, defaults.multiplier),
        hits: value("skill_hits", &formulas.hits, defaults.hits).round().max(1.0),
        mp_cost: value("skill_mp_cost", &formulas.mp_cost, defaults.mp_cost).max(0.0),
        cooldown: value("skill_cooldown", &formulas.cooldown, defaults.cooldown).max(0.0),
    }
}

/// Turn final stats into expected damage against `target`. `skill = None` is a
/// normal attack.
pub fn compute_damage(
    build: &CharacterBuild,
    stats: &CalculatedStats,
    skill: Option<&str>,
    target: &Target,
    catalogs: &Catalogs,
) -> Result<DamageResult, CalcError> {
    let cache = catalogs.cache();
    let job = catalogs.job(&build.job)?;
    let weapon = match build.equipment.get(&EquipSlot::Weapon) {
        Some(equipped) => Some(catalogs.item(ItemSlot::Weapon, &equipped.item)?),
        None => None,
    };
    let weapon_type = weapon
        .and_then(|item| item.weapon_type.clone())
        .unwrap_or_else(|| UNARMED.to_string());
    let skill_definition = match skill {
        Some(name) => Some(catalogs.skill(name)?),
        None => None,
    };
    let base_strategy = BaseDamageStrategy::select(job, &weapon_type, catalogs)?;

    let final_stats = &stats.final_stats;
    let mut failures = Vec::new();
    let mut variables = map_variables(final_stats);
    variables.insert("Level".to_string(), f64::from(build.level));
    // Formulas see the derived crit rate, not the raw weapon stat.
    variables.insert("CritRate".to_string(), stats.crit_rate);

    // (a) base damage
    let fallback = final_stats.get(StatKind::Power) + final_stats.get(StatKind::AttackPower);
    let base_damage = evaluate_or(
        cache,
        "base_damage",
        base_strategy.formula(),
        &variables,
        fallback,
        &mut failures,
    );
    variables.insert("BaseDamage".to_string(), base_damage);

    // (b) job bonus, only without an override
    let job_bonus = match (&base_strategy, &job.damage_bonus) {
        (BaseDamageStrategy::WeaponFormula(_), Some(formula)) => {
            evaluate_or(cache, "job_bonus", formula, &variables, 1.0, &mut failures)
        }
        _ => 1.0,
    };
    let corrected = base_damage * job_bonus;

    // (c) critical adjustment
    let crit_bonus = final_stats.get(StatKind::CritDamage);
    let default_critical = corrected * (1.0 + (catalogs.constants.critical_damage_base + crit_bonus) / 100.0);
    let critical_damage = match CriticalDamageStrategy::from_catalogs(catalogs) {
        CriticalDamageStrategy::Formula(formula) => {
            let mut crit_variables = variables.clone();
            crit_variables.insert("Damage".to_string(), corrected);
            evaluate_or(
                cache,
                "critical_damage",
                &formula,
                &crit_variables,
                default_critical,
                &mut failures,
            )
        }
        CriticalDamageStrategy::Default => default_critical,
    };
    let crit_chance = (stats.crit_rate / 100.0).clamp(0.0, 1.0);
    let crit_adjusted = match build.crit_mode {
        CritMode::Always => critical_damage,
        CritMode::Never => corrected,
        CritMode::Expected => corrected * (1.0 - crit_chance) + critical_damage * crit_chance,
    };

    // (d) skill
    let skill_values = match skill_definition {
        Some(definition) => skill_values(definition, &weapon_type, cache, &variables, &mut failures),
        None => SkillValues::default(),
    };
    let per_hit = crit_adjusted * skill_values.multiplier;

    // (e) additional attack, (f) mitigation
    let extra_attack = weapon.and_then(|item| extra_attack::lookup(&item.name, catalogs));
    let extra_per_hit = extra_attack.map_or(0.0, |attack| attack.mitigated(per_hit, final_stats, target));
    let mitigated_per_hit = mitigate_hit(per_hit, target);
    let hits = skill_values.hits;
    let total = hits * (mitigated_per_hit + extra_per_hit);

    let cooldown = skill_values.cooldown;
    let mp_cost = skill_values.mp_cost;
    let dps = (cooldown > 0.0).then(|| total / cooldown);
    let ttk = match dps {
        Some(dps) if target.hp > 0.0 && dps > 0.0 => Some(target.hp / dps),
        _ => None,
    };
    let mp_efficiency = (mp_cost > 0.0).then(|| total / mp_cost);

    tracing::debug!(
        weapon_type = %weapon_type,
        skill = ?skill,
        job_override = base_strategy.is_override(),
        base_damage,
        total,
        "damage computed"
    );

    Ok(DamageResult {
        weapon: weapon.map(|item| item.name.clone()),
        weapon_type,
        skill: skill.map(str::to_string),
        job_override: base_strategy.is_override(),
        base_strategy,
        base_damage,
        job_bonus,
        corrected,
        critical_damage,
        crit_chance,
        crit_mode: build.crit_mode,
        crit_adjusted,
        skill_values,
        per_hit,
        extra_attack,
        extra_per_hit,
        mitigated_per_hit,
        hits,
        total,
        mp_cost,
        cooldown,
        dps,
        ttk,
        mp_efficiency,
        failures,
    })
}
