use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::damage::DamageResult;
use crate::data::build::{EquipSlot, EquippedItem};
use crate::stats::CalculatedStats;

/// One evaluated slot combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Full equipment of the evaluated build, untouched slots included.
    pub equipment: BTreeMap<EquipSlot, EquippedItem>,
    pub stats: CalculatedStats,
    pub damage: DamageResult,
}

impl Evaluation {
    pub fn expected_damage(&self) -> f64 {
        self.damage.expected_damage()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeResult {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub expected_damage: f64,
    pub equipment: BTreeMap<EquipSlot, EquippedItem>,
    pub stats: CalculatedStats,
    pub damage: DamageResult,
}

impl OptimizeResult {
    pub fn item(&self, slot: EquipSlot) -> Option<&str> {
        self.equipment.get(&slot).map(|equipped| equipped.item.as_str())
    }
}

/// Sort by expected damage, best first. The sort is stable, so ties stay in
/// evaluation order.
pub fn rank_results(mut evaluations: Vec<Evaluation>, limit: usize) -> Vec<OptimizeResult> {
    sort_by_damage(&mut evaluations);
    evaluations.truncate(limit);
    evaluations
        .into_iter()
        .enumerate()
        .map(|(index, evaluation)| OptimizeResult {
            rank: index + 1,
            expected_damage: evaluation.expected_damage(),
            equipment: evaluation.equipment,
            stats: evaluation.stats,
            damage: evaluation.damage,
        })
        .collect()
}

fn sort_by_damage(evaluations: &mut [Evaluation]) {
    evaluations.sort_by(|left, right| right.expected_damage().total_cmp(&left.expected_damage()));
}

/// Collects evaluations in order, keeps the first of duplicated combinations
/// and never holds much more than twice the result limit.
#[derive(Debug)]
pub struct RankedPool {
    limit: usize,
    seen: HashSet<String>,
    entries: Vec<Evaluation>,
}

impl RankedPool {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Returns false when the same combination was already collected.
    pub fn push(&mut self, evaluation: Evaluation) -> bool {
        if !self.seen.insert(combination_key(&evaluation.equipment)) {
            return false;
        }
        self.entries.push(evaluation);
        // Pruning keeps (damage, evaluation order) ordering for later pushes.
        if self.entries.len() >= self.limit.saturating_mul(2).max(PRUNE_FLOOR) {
            sort_by_damage(&mut self.entries);
            self.entries.truncate(self.limit);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_ranked(self) -> Vec<OptimizeResult> {
        rank_results(self.entries, self.limit)
    }
}

const PRUNE_FLOOR: usize = 64;

fn combination_key(equipment: &BTreeMap<EquipSlot, EquippedItem>) -> String {
    format!("{equipment:?}")
}
