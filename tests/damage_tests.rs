use std::path::Path;

use buildcalc::damage::{compute_damage, ExtraAttack, Target};
use buildcalc::data::build::{CharacterBuild, CritMode, EquipSlot, EquipmentConfiguration};
use buildcalc::data::catalog::{Catalogs, SkillDefinition, SkillFormulas};
use buildcalc::data::item::{EquipmentItem, ItemSlot};
use buildcalc::data::job::JobDefinition;
use buildcalc::data::loader::{load_build, load_catalogs};
use buildcalc::data::stat::{StatBlock, StatKind};
use buildcalc::stats::compute_stats;
use buildcalc::{CalcError, LookupError};

fn catalogs() -> Catalogs {
    let mut job = JobDefinition::new("Knight");
    job.base_stats = StatBlock::from_pairs([(StatKind::Power, 100.0)]);
    let mut catalogs = Catalogs::new()
        .with_job(job)
        .with_item(blade("Blade", 0.0))
        .with_item(blade("Keen Blade", 20.0));
    catalogs
        .formulas
        .weapon_damage
        .insert("Sword".to_string(), "Power + AttackPower".to_string());
    catalogs.formulas.skills.insert(
        "Slash".to_string(),
        SkillDefinition {
            defaults: SkillFormulas {
                multiplier: Some("1.5".to_string()),
                hits: Some("2".to_string()),
                mp_cost: Some("10".to_string()),
                cooldown: Some("2".to_string()),
            },
            ..SkillDefinition::default()
        },
    );
    catalogs
}

fn blade(name: &str, crit_rate: f64) -> EquipmentItem {
    EquipmentItem::new(name, ItemSlot::Weapon)
        .with_weapon_type("Sword")
        .with_stat(StatKind::AttackPower, 50.0)
        .with_stat(StatKind::Power, 20.0)
        .with_stat(StatKind::CritRate, crit_rate)
}

fn build(weapon: &str) -> CharacterBuild {
    let mut build =
        CharacterBuild::new("Knight", 10).equip(EquipSlot::Weapon, weapon, EquipmentConfiguration::default());
    build.crit_mode = CritMode::Never;
    build
}

fn target() -> Target {
    Target::new(20.0, 10.0, 0.0).with_hp(1_000.0)
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn normal_attack_is_one_mitigated_hit() {
    let catalogs = catalogs();
    let build = build("Blade");
    let stats = compute_stats(&build, &catalogs).unwrap();
    let damage = compute_damage(&build, &stats, None, &target(), &catalogs).unwrap();

    assert_eq!(damage.weapon_type, "Sword");
    assert!(approx_eq(damage.base_damage, 170.0));
    // (170 − 20/2) × 0.9
    assert!(approx_eq(damage.mitigated_per_hit, 144.0));
    assert!(approx_eq(damage.total, 144.0));
    assert!(damage.dps.is_none());
    assert!(damage.ttk.is_none());
    assert!(damage.mp_efficiency.is_none());
}

#[test]
fn skill_values_drive_rates() {
    let catalogs = catalogs();
    let build = build("Blade");
    let stats = compute_stats(&build, &catalogs).unwrap();
    let damage = compute_damage(&build, &stats, Some("Slash"), &target(), &catalogs).unwrap();

    assert!(approx_eq(damage.per_hit, 255.0));
    assert!(approx_eq(damage.mitigated_per_hit, 220.5));
    assert_eq!(damage.hits, 2.0);
    assert!(approx_eq(damage.total, 441.0));
    assert!(approx_eq(damage.dps.unwrap(), 220.5));
    assert!(approx_eq(damage.ttk.unwrap(), 1_000.0 / 220.5));
    assert!(approx_eq(damage.mp_efficiency.unwrap(), 44.1));
}

#[test]
fn expected_crit_blends_by_derived_rate() {
    let catalogs = catalogs();
    let mut build = build("Keen Blade");
    build.crit_mode = CritMode::Expected;
    let stats = compute_stats(&build, &catalogs).unwrap();
    let damage = compute_damage(&build, &stats, None, &Target::default(), &catalogs).unwrap();
    // 170 × 0.8 + 255 × 0.2
    assert!(approx_eq(damage.crit_adjusted, 187.0));

    build.crit_mode = CritMode::Always;
    let always = compute_damage(&build, &stats, None, &Target::default(), &catalogs).unwrap();
    assert!(approx_eq(always.crit_adjusted, 255.0));
}

#[test]
fn catalog_extra_attack_adds_a_resisted_term() {
    let mut catalogs = catalogs();
    catalogs
        .formulas
        .extra_attacks
        .insert("Blade".to_string(), ExtraAttack::FlatPercentage { percent: 30.0 });
    let build = build("Blade");
    let stats = compute_stats(&build, &catalogs).unwrap();
    let damage = compute_damage(&build, &stats, Some("Slash"), &target(), &catalogs).unwrap();

    assert_eq!(damage.extra_attack, Some(ExtraAttack::FlatPercentage { percent: 30.0 }));
    // 255 × 0.3 × 0.9
    assert!(approx_eq(damage.extra_per_hit, 68.85));
    assert!(approx_eq(damage.total, 2.0 * (220.5 + 68.85)));
}

#[test]
fn missing_definitions_name_the_key() {
    let catalogs = catalogs();
    let unarmed = CharacterBuild::new("Knight", 10);
    let stats = compute_stats(&unarmed, &catalogs).unwrap();
    assert_eq!(
        compute_damage(&unarmed, &stats, None, &target(), &catalogs).unwrap_err(),
        CalcError::Lookup(LookupError::WeaponType("Unarmed".to_string()))
    );

    let build = build("Blade");
    let stats = compute_stats(&build, &catalogs).unwrap();
    assert_eq!(
        compute_damage(&build, &stats, Some("Nova"), &target(), &catalogs).unwrap_err(),
        CalcError::Lookup(LookupError::Skill("Nova".to_string()))
    );
}

#[test]
fn sample_build_damage_with_skill() {
    let catalogs = load_catalogs(Path::new("data/catalog")).unwrap();
    let build = load_build(Path::new("data/builds/sample.yaml")).unwrap();
    let stats = compute_stats(&build, &catalogs).unwrap();
    let target = Target::new(100.0, 10.0, 10.0).with_hp(20_000.0);
    let damage = compute_damage(&build, &stats, Some("Cleave"), &target, &catalogs).unwrap();

    assert!(damage.failures.is_empty(), "{:?}", damage.failures);
    assert_eq!(damage.weapon_type, "Sword");
    assert!(!damage.job_override);
    assert!(damage.total > 0.0);
    assert!(damage.dps.is_some_and(|dps| dps > 0.0));
    assert_eq!(damage.total, damage.expected_damage());
}
