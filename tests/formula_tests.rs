use std::path::Path;
use std::sync::Arc;
use std::thread;

use buildcalc::data::loader::load_catalogs;
use buildcalc::data::stat::{StatBlock, StatKind};
use buildcalc::formula::{canonical_name, evaluate, map_variables, FormulaCache, Variables};
use buildcalc::FormulaError;

#[test]
fn stat_blocks_feed_formulas_through_canonical_names() {
    let stats = StatBlock::from_pairs([(StatKind::Power, 120.0), (StatKind::AttackPower, 80.0)]);
    let mut variables = map_variables(&stats);
    variables.insert("Level".to_string(), 50.0);
    let value = evaluate("(Power + AttackPower) * (1 + Level / 200)", &variables).unwrap();
    assert_eq!(value, 250.0);
    // Every canonical stat is present, absent ones at zero.
    assert_eq!(evaluate("Luck + Flee", &variables).unwrap(), 0.0);
}

#[test]
fn aliases_resolve_to_the_same_stat() {
    for alias in ["atk", "STR", " power ", "力"] {
        assert_eq!(canonical_name(alias), Some(StatKind::Power), "{alias}");
    }
    assert_eq!(canonical_name("会心率"), Some(StatKind::CritRate));
    assert_eq!(canonical_name("unknown stat"), None);
}

#[test]
fn failures_are_typed() {
    let variables = Variables::new();
    assert!(matches!(evaluate("2 +", &variables), Err(FormulaError::Syntax { .. })));
    assert!(matches!(evaluate("EXP(1)", &variables), Err(FormulaError::DisallowedFunction(_))));
    assert!(matches!(evaluate("MAX()", &variables), Err(FormulaError::Arity { .. })));
    assert!(matches!(evaluate("Nope * 2", &variables), Err(FormulaError::UnknownVariable(_))));
    assert!(matches!(evaluate("0 / 0", &variables), Err(FormulaError::NonNumeric(_))));
}

#[test]
fn cache_is_shared_across_threads() {
    let cache = Arc::new(FormulaCache::new());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let variables: Variables = [("X".to_string(), f64::from(n))].into_iter().collect();
                cache.evaluate("X * 2 + 1", &variables).unwrap()
            })
        })
        .collect();
    let mut results: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_by(f64::total_cmp);
    assert_eq!(results, vec![1.0, 3.0, 5.0, 7.0]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn sample_catalog_formulas_compile() {
    let catalogs = load_catalogs(Path::new("data/catalog")).unwrap();
    let cache = catalogs.cache();
    for formula in catalogs.formulas.weapon_damage.values() {
        assert!(cache.compile(formula).is_ok(), "{formula}");
    }
    for skill in catalogs.formulas.skills.values() {
        for formula in [&skill.defaults.multiplier, &skill.defaults.hits].into_iter().flatten() {
            assert!(cache.compile(formula).is_ok(), "{formula}");
        }
    }
}
