use buildcalc::data::build::EquipmentConfiguration;
use buildcalc::data::constants::Constants;
use buildcalc::data::item::{EquipmentItem, ItemSlot, Rank};
use buildcalc::data::stat::StatKind;
use buildcalc::equipment::resolve;
use buildcalc::optimizer::rng::Rng;
use buildcalc::RangeError;

fn weapon() -> EquipmentItem {
    EquipmentItem::new("Test Blade", ItemSlot::Weapon)
        .with_weapon_type("Sword")
        .with_stat(StatKind::AttackPower, 50.0)
}

fn armor() -> EquipmentItem {
    EquipmentItem::new("Test Plate", ItemSlot::Body)
        .with_stat(StatKind::Defense, 30.0)
        .with_required_level(10)
}

#[test]
fn rank_f_weapon_resolves_to_catalog_value() {
    let resolved = resolve(&weapon(), &EquipmentConfiguration::default(), &Constants::default()).unwrap();
    assert_eq!(resolved.stats.get(StatKind::AttackPower), 50.0);
}

#[test]
fn rank_a_weapon_adds_the_table_bonus() {
    let resolved = resolve(&weapon(), &EquipmentConfiguration::at_rank(Rank::A), &Constants::default()).unwrap();
    assert_eq!(resolved.stats.get(StatKind::AttackPower), 75.0);
}

#[test]
fn rank_a_armor_uses_the_non_linear_bonus() {
    let resolved = resolve(&armor(), &EquipmentConfiguration::at_rank(Rank::A), &Constants::default()).unwrap();
    let expected = (30.0_f64 * (1.0 + 30.0_f64.powf(0.2) * 5.0 / 10.0)).round();
    assert_eq!(resolved.stats.get(StatKind::Defense), expected);
    assert_eq!(expected, 60.0);
}

#[test]
fn weapon_declared_above_f_round_trips() {
    let constants = Constants::default();
    for min_rank in Rank::ALL {
        let item = weapon().with_min_rank(min_rank);
        let at_min = resolve(&item, &EquipmentConfiguration::at_rank(min_rank), &constants).unwrap();
        assert_eq!(at_min.stats.get(StatKind::AttackPower), 50.0, "rank {min_rank}");
    }
}

#[test]
fn attack_and_defense_never_drop_as_rank_improves() {
    let constants = Constants::default();
    let mut rng = Rng::new(0xe9);
    for _ in 0..50 {
        let attack = rng.range_f64(1.0, 400.0).round();
        let defense = rng.range_f64(1.0, 400.0).round();
        let level = 1 + rng.below(99) as u32;
        let blade = EquipmentItem::new("Blade", ItemSlot::Weapon).with_stat(StatKind::AttackPower, attack);
        let plate = EquipmentItem::new("Plate", ItemSlot::Head)
            .with_stat(StatKind::Defense, defense)
            .with_required_level(level);

        let mut previous = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for rank in Rank::ALL {
            let config = EquipmentConfiguration::at_rank(rank);
            let a = resolve(&blade, &config, &constants).unwrap().stats.get(StatKind::AttackPower);
            let d = resolve(&plate, &config, &constants).unwrap().stats.get(StatKind::Defense);
            assert!(a >= previous.0 && d >= previous.1, "rank {rank} lowered a stat");
            previous = (a, d);
        }
    }
}

#[test]
fn forge_total_never_exceeds_the_cap() {
    let cap = Constants::default().forge_cap;
    let mut config = EquipmentConfiguration::default();
    config.set_forge(StatKind::AttackPower, 8, cap).unwrap();
    config.set_forge(StatKind::CritRate, 4, cap).unwrap();
    assert_eq!(config.forge_total(), 12);

    assert!(matches!(
        config.set_forge(StatKind::CritDamage, 1, cap),
        Err(RangeError::Forge { cap: 0, .. })
    ));
    assert!(config.set_forge(StatKind::AttackPower, 9, cap).is_err());
    assert_eq!(config.forge_total(), 12);

    config.set_forge(StatKind::AttackPower, 5, cap).unwrap();
    config.set_forge(StatKind::CritDamage, 3, cap).unwrap();
    assert_eq!(config.forge_total(), 12);
}

#[test]
fn deserialized_forge_maps_are_checked_against_the_cap() {
    let constants = Constants::default();

    // Counts that would wrap a 32-bit sum to zero.
    let wrapping: EquipmentConfiguration =
        serde_json::from_str(r#"{"forge":{"AttackPower":4294967295,"CritRate":1}}"#).unwrap();
    assert_eq!(wrapping.forge_total(), 4_294_967_296);
    assert_eq!(
        resolve(&weapon(), &wrapping, &constants).unwrap_err(),
        RangeError::Forge {
            stat: "AttackPower".to_string(),
            value: u32::MAX,
            cap: 12
        }
    );

    // Every count within the cap, but the sum past it.
    let spread: EquipmentConfiguration =
        serde_json::from_str(r#"{"forge":{"AttackPower":12,"CritRate":12,"CritDamage":12}}"#).unwrap();
    assert_eq!(
        resolve(&weapon(), &spread, &constants).unwrap_err(),
        RangeError::ForgeTotal { total: 36, cap: 12 }
    );

    let within: EquipmentConfiguration =
        serde_json::from_str(r#"{"forge":{"AttackPower":8,"CritRate":4}}"#).unwrap();
    assert!(resolve(&weapon(), &within, &constants).is_ok());

    let armor_map: EquipmentConfiguration =
        serde_json::from_str(r#"{"forge":{"Defense":4294967295,"HP":4294967295}}"#).unwrap();
    assert!(matches!(
        resolve(&armor(), &armor_map, &constants),
        Err(RangeError::Forge { cap: 12, .. })
    ));
}

#[test]
fn reinforcement_bounds_depend_on_slot_class() {
    let constants = Constants::default();
    let too_far = EquipmentConfiguration::default().with_reinforcement(41);
    assert!(resolve(&weapon(), &too_far, &constants).is_ok());
    assert!(matches!(
        resolve(&armor(), &too_far, &constants),
        Err(RangeError::Reinforcement { max: 40, value: 41, .. })
    ));

    let ring = EquipmentItem::new("Ring", ItemSlot::Accessory).with_stat(StatKind::Luck, 3.0);
    let reinforced = EquipmentConfiguration::default().with_reinforcement(1);
    assert!(matches!(
        resolve(&ring, &reinforced, &constants),
        Err(RangeError::Reinforcement { max: 0, .. })
    ));
}
