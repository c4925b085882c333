//! Per-slot candidate generation under the request's rank constraints.

use serde::Serialize;

use crate::data::build::{CharacterBuild, EquipSlot, EquipmentConfiguration, EquippedItem};
use crate::data::catalog::Catalogs;
use crate::data::item::{EquipmentItem, Rank, SlotClass};
use crate::data::job::JobDefinition;
use crate::equipment::{resolve, stat_sum};
use crate::optimizer::OptimizeConstraints;

/// One item at the configuration the optimizer would equip it with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub item: String,
    pub config: EquipmentConfiguration,
    /// Sum of resolved flat stats; candidates are ordered by it.
    pub stat_sum: f64,
}

impl Candidate {
    pub fn equipped(&self) -> EquippedItem {
        EquippedItem::new(self.item.clone(), self.config.clone())
    }
}

/// The choices of one slot. Choice 0 is always "no item".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotCandidates {
    pub slot: EquipSlot,
    pub candidates: Vec<Candidate>,
}

impl SlotCandidates {
    pub fn choices(&self) -> usize {
        self.candidates.len() + 1
    }

    pub fn choice(&self, index: usize) -> Option<EquippedItem> {
        index
            .checked_sub(1)
            .and_then(|position| self.candidates.get(position))
            .map(Candidate::equipped)
    }
}

/// Collect the items that may go into `slot` for this build, best stat sum first.
pub fn generate_candidates(
    slot: EquipSlot,
    build: &CharacterBuild,
    job: &JobDefinition,
    constraints: &OptimizeConstraints,
    catalogs: &Catalogs,
) -> SlotCandidates {
    let item_slot = slot.item_slot();
    let mut candidates: Vec<Candidate> = catalogs
        .items(item_slot.class())
        .iter()
        .filter(|item| item.slot == item_slot && is_eligible(item, build, job))
        .filter_map(|item| {
            let rank = candidate_rank(item, constraints)?;
            let config = EquipmentConfiguration::at_rank(rank);
            match resolve(item, &config, &catalogs.constants) {
                Ok(resolved) => Some(Candidate {
                    item: item.name.clone(),
                    config,
                    stat_sum: stat_sum(&resolved),
                }),
                Err(error) => {
                    tracing::debug!(item = %item.name, %error, "candidate skipped");
                    None
                }
            }
        })
        .collect();

    // sort_by is stable: equal sums keep catalog order.
    candidates.sort_by(|left, right| right.stat_sum.total_cmp(&left.stat_sum));
    candidates.truncate(constraints.max_candidates);
    SlotCandidates { slot, candidates }
}

fn is_eligible(item: &EquipmentItem, build: &CharacterBuild, job: &JobDefinition) -> bool {
    let job_allowed = item
        .required_job
        .as_deref()
        .map_or(true, |required| required.is_empty() || required == build.job);
    let weapon_allowed = item
        .weapon_type
        .as_deref()
        .map_or(true, |weapon_type| job.can_use_weapon(weapon_type));
    item.required_level <= build.level && job_allowed && weapon_allowed
}

/// Weapons sit at the top of the allowed range, everything else at the floor.
fn candidate_rank(item: &EquipmentItem, constraints: &OptimizeConstraints) -> Option<Rank> {
    match item.class() {
        SlotClass::Weapon => {
            let top = constraints.weapon_max_rank;
            (constraints.weapon_min_rank <= top && item.min_rank <= top).then_some(top)
        }
        SlotClass::Armor | SlotClass::Accessory => Some(constraints.rank_floor.max(item.min_rank)),
    }
}

/// Size of the full cross product, "no item" included. Saturates.
pub fn combination_count(slots: &[SlotCandidates]) -> u64 {
    slots
        .iter()
        .fold(1u64, |total, slot| total.saturating_mul(slot.choices() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::item::ItemSlot;
    use crate::data::stat::StatKind;

    fn catalogs() -> Catalogs {
        Catalogs::new()
            .with_job(JobDefinition::new("Knight").with_weapon_types(["Sword"]))
            .with_item(
                EquipmentItem::new("Iron Sword", ItemSlot::Weapon)
                    .with_weapon_type("Sword")
                    .with_stat(StatKind::AttackPower, 50.0),
            )
            .with_item(
                EquipmentItem::new("Great Sword", ItemSlot::Weapon)
                    .with_weapon_type("Sword")
                    .with_stat(StatKind::AttackPower, 90.0)
                    .with_required_level(40),
            )
            .with_item(
                EquipmentItem::new("Oak Bow", ItemSlot::Weapon)
                    .with_weapon_type("Bow")
                    .with_stat(StatKind::AttackPower, 70.0),
            )
            .with_item(
                EquipmentItem::new("Royal Sword", ItemSlot::Weapon)
                    .with_weapon_type("Sword")
                    .with_stat(StatKind::AttackPower, 60.0)
                    .with_min_rank(Rank::S),
            )
            .with_item(EquipmentItem::new("Cap", ItemSlot::Head).with_stat(StatKind::Defense, 10.0))
            .with_item(EquipmentItem::new("Helm", ItemSlot::Head).with_stat(StatKind::Defense, 20.0))
    }

    fn knight(catalogs: &Catalogs) -> &JobDefinition {
        catalogs.job("Knight").unwrap()
    }

    #[test]
    fn filters_by_level_and_weapon_type() {
        let catalogs = catalogs();
        let build = CharacterBuild::new("Knight", 30);
        let constraints = OptimizeConstraints {
            weapon_max_rank: Rank::A,
            ..OptimizeConstraints::default()
        };
        let slot = generate_candidates(EquipSlot::Weapon, &build, knight(&catalogs), &constraints, &catalogs);
        let names: Vec<&str> = slot.candidates.iter().map(|c| c.item.as_str()).collect();
        assert_eq!(names, vec!["Iron Sword"]);
        assert_eq!(slot.candidates[0].config.rank, Rank::A);
    }

    #[test]
    fn weapons_above_the_rank_range_are_skipped() {
        let catalogs = catalogs();
        let build = CharacterBuild::new("Knight", 50);
        let top_s = OptimizeConstraints {
            weapon_max_rank: Rank::S,
            ..OptimizeConstraints::default()
        };
        let slot = generate_candidates(EquipSlot::Weapon, &build, knight(&catalogs), &top_s, &catalogs);
        assert!(slot.candidates.iter().any(|c| c.item == "Royal Sword"));

        let top_a = OptimizeConstraints {
            weapon_max_rank: Rank::A,
            ..OptimizeConstraints::default()
        };
        let slot = generate_candidates(EquipSlot::Weapon, &build, knight(&catalogs), &top_a, &catalogs);
        assert!(slot.candidates.iter().all(|c| c.item != "Royal Sword"));
    }

    #[test]
    fn armor_is_ordered_by_stat_sum_and_capped() {
        let catalogs = catalogs();
        let build = CharacterBuild::new("Knight", 10);
        let constraints = OptimizeConstraints {
            max_candidates: 1,
            ..OptimizeConstraints::default()
        };
        let slot = generate_candidates(EquipSlot::Head, &build, knight(&catalogs), &constraints, &catalogs);
        assert_eq!(slot.candidates.len(), 1);
        assert_eq!(slot.candidates[0].item, "Helm");
        assert_eq!(slot.choices(), 2);
        assert_eq!(slot.choice(0), None);
        assert_eq!(slot.choice(1).map(|e| e.item), Some("Helm".to_string()));
    }

    #[test]
    fn combination_count_includes_empty_choice() {
        let slot = |n: usize| SlotCandidates {
            slot: EquipSlot::Head,
            candidates: (0..n)
                .map(|i| Candidate {
                    item: format!("item {i}"),
                    config: EquipmentConfiguration::default(),
                    stat_sum: 0.0,
                })
                .collect(),
        };
        assert_eq!(combination_count(&[slot(2), slot(3)]), 12);
        assert_eq!(combination_count(&[]), 1);
    }
}
