//! Catalog consistency checks. The core never refuses a catalog; this report is
//! for data authors and the `validate` command.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::catalog::{Catalogs, SkillFormulas};
use crate::data::item::EquipmentItem;
use crate::data::job::JobDefinition;
use crate::formula::CompiledFormula;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_catalogs(catalogs: &Catalogs) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_formula(&mut report, "formulas.base_status", catalogs.formulas.base_status.as_deref());
    check_formula(
        &mut report,
        "formulas.critical_damage",
        catalogs.formulas.critical_damage.as_deref(),
    );
    for (weapon_type, formula) in &catalogs.formulas.weapon_damage {
        check_formula(
            &mut report,
            &format!("formulas.weapon_damage.{weapon_type}"),
            Some(formula),
        );
    }
    for (name, skill) in &catalogs.formulas.skills {
        check_skill_formulas(&mut report, &format!("formulas.skills.{name}"), &skill.defaults);
        for (weapon_type, formulas) in &skill.weapon_types {
            check_skill_formulas(
                &mut report,
                &format!("formulas.skills.{name}.{weapon_type}"),
                formulas,
            );
        }
    }

    validate_items(&mut report, catalogs);
    for job in &catalogs.jobs {
        validate_job(&mut report, catalogs, job);
    }

    report.push(
        ValidationSeverity::Info,
        "catalogs",
        format!(
            "{} weapon(s), {} armor(s), {} accessory(ies), {} job(s), {} skill(s)",
            catalogs.weapons.len(),
            catalogs.armors.len(),
            catalogs.accessories.len(),
            catalogs.jobs.len(),
            catalogs.formulas.skills.len()
        ),
    );
    report
}

fn check_formula(report: &mut ValidationReport, context: &str, formula: Option<&str>) {
    let Some(formula) = formula else {
        return;
    };
    if let Err(err) = CompiledFormula::compile(formula) {
        report.push(ValidationSeverity::Error, context, err.to_string());
    }
}

fn check_skill_formulas(report: &mut ValidationReport, context: &str, formulas: &SkillFormulas) {
    check_formula(report, &format!("{context}.multiplier"), formulas.multiplier.as_deref());
    check_formula(report, &format!("{context}.hits"), formulas.hits.as_deref());
    check_formula(report, &format!("{context}.mp_cost"), formulas.mp_cost.as_deref());
    check_formula(report, &format!("{context}.cooldown"), formulas.cooldown.as_deref());
}

fn validate_items(report: &mut ValidationReport, catalogs: &Catalogs) {
    let mut seen = HashSet::new();
    for item in catalogs.all_items() {
        let context = format!("item '{}'", item.name);
        if item.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, "item", "missing non-empty 'name'");
        }
        if !seen.insert((item.slot, item.name.as_str())) {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "duplicate name in slot; lookups use the first row",
            );
        }
        if item.required_level == 0 {
            report.push(
                ValidationSeverity::Info,
                context.clone(),
                "required_level 0 is treated as 1",
            );
        }
        validate_weapon(report, catalogs, item, &context);
    }
}

fn validate_weapon(report: &mut ValidationReport, catalogs: &Catalogs, item: &EquipmentItem, context: &str) {
    if item.slot != crate::data::item::ItemSlot::Weapon {
        return;
    }
    match item.weapon_type.as_deref() {
        None => report.push(ValidationSeverity::Warning, context, "weapon has no weapon_type"),
        Some(weapon_type) => {
            let shared = catalogs.formulas.weapon_damage.contains_key(weapon_type);
            let overridden = catalogs
                .jobs
                .iter()
                .any(|job| job.weapon_overrides.contains_key(weapon_type));
            if !shared && !overridden {
                report.push(
                    ValidationSeverity::Warning,
                    context,
                    format!("no damage formula for weapon type '{weapon_type}'"),
                );
            }
        }
    }
}

fn validate_job(report: &mut ValidationReport, catalogs: &Catalogs, job: &JobDefinition) {
    let context = format!("job '{}'", job.name);
    if job.max_level == 0 {
        report.push(ValidationSeverity::Error, context.clone(), "max_level must be at least 1");
    }

    let mut tiers = HashSet::new();
    for tier in &job.sp_tiers {
        if !tiers.insert((tier.branch, tier.tier)) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.sp_tiers"),
                format!("duplicate tier {}{}", tier.branch, tier.tier),
            );
        }
        if tier.required_sp > catalogs.constants.max_sp_per_branch {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.sp_tiers"),
                format!(
                    "tier {}{} requires {} SP, above the per-branch maximum {}",
                    tier.branch, tier.tier, tier.required_sp, catalogs.constants.max_sp_per_branch
                ),
            );
        }
    }

    for weapon_type in &job.weapon_types {
        let covered = job.weapon_overrides.contains_key(weapon_type)
            || catalogs.formulas.weapon_damage.contains_key(weapon_type);
        if !covered {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                format!("weapon type '{weapon_type}' has no damage formula"),
            );
        }
    }
    for (weapon_type, formula) in &job.weapon_overrides {
        check_formula(
            report,
            &format!("{context}.weapon_overrides.{weapon_type}"),
            Some(formula),
        );
    }
    check_formula(report, &format!("{context}.damage_bonus"), job.damage_bonus.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::item::ItemSlot;
    use crate::data::job::{Branch, SpTier};
    use crate::data::stat::StatBlock;

    fn tier(branch: Branch, tier: u32, required_sp: u32) -> SpTier {
        SpTier {
            branch,
            tier,
            required_sp,
            skill: None,
            stats: StatBlock::new(),
            resistances: Default::default(),
        }
    }

    #[test]
    fn clean_catalog_has_only_info() {
        let mut catalogs = Catalogs::new()
            .with_item(EquipmentItem::new("Blade", ItemSlot::Weapon).with_weapon_type("Sword"));
        catalogs
            .formulas
            .weapon_damage
            .insert("Sword".to_string(), "Power + AttackPower".to_string());
        let report = validate_catalogs(&catalogs);
        assert!(!report.has_errors());
        assert_eq!(report.count(ValidationSeverity::Warning), 0);
        assert_eq!(report.count(ValidationSeverity::Info), 1);
    }

    #[test]
    fn flags_broken_formulas_and_duplicate_tiers() {
        let mut job = JobDefinition::new("Knight");
        job.weapon_types = vec!["Spear".to_string()];
        job.sp_tiers = vec![tier(Branch::A, 1, 10), tier(Branch::A, 1, 20)];
        job.damage_bonus = Some("1 +".to_string());
        let mut catalogs = Catalogs::new().with_job(job);
        catalogs.formulas.base_status = Some("Equip + system(1)".to_string());

        let report = validate_catalogs(&catalogs);
        assert!(report.has_errors());
        let contexts: Vec<&str> = report
            .diagnostics
            .iter()
            .map(|diag| diag.context.as_str())
            .collect();
        assert!(contexts.contains(&"formulas.base_status"));
        assert!(contexts.contains(&"job 'Knight'.sp_tiers"));
        assert!(contexts.contains(&"job 'Knight'.damage_bonus"));
        assert!(report
            .diagnostics
            .iter()
            .any(|diag| diag.message.contains("'Spear' has no damage formula")));
    }
}
