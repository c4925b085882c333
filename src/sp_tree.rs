//! SP tree resolver: which tiers an SP allocation unlocks, what is still locked,
//! and the bonuses the unlocked tiers grant.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::build::SpAllocation;
use crate::data::job::{Branch, SpTier};
use crate::data::stat::StatBlock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockedTier {
    pub branch: Branch,
    pub tier: u32,
    pub required_sp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

/// The cheapest locked tier of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextTier {
    pub tier: u32,
    pub required_sp: u32,
    pub sp_needed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierBonus {
    pub stats: StatBlock,
    pub resistances: BTreeMap<String, f64>,
}

impl TierBonus {
    fn absorb(&mut self, tier: &SpTier) {
        self.stats = self.stats.plus(&tier.stats);
        for (name, value) in &tier.resistances {
            *self.resistances.entry(name.clone()).or_insert(0.0) += value;
        }
    }

    fn merge(&mut self, other: &TierBonus) {
        self.stats = self.stats.plus(&other.stats);
        for (name, value) in &other.resistances {
            *self.resistances.entry(name.clone()).or_insert(0.0) += value;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpTreeState {
    /// Ordered by branch, then threshold.
    pub unlocked: Vec<UnlockedTier>,
    pub skills: Vec<String>,
    pub next_locked: BTreeMap<Branch, NextTier>,
    pub bonuses: BTreeMap<Branch, TierBonus>,
    pub total: TierBonus,
}

/// Every tier is checked against its own threshold; the table order carries no meaning.
pub fn resolve_sp_tree(allocation: &SpAllocation, tiers: &[SpTier]) -> SpTreeState {
    let mut ordered: Vec<&SpTier> = tiers.iter().collect();
    ordered.sort_by_key(|tier| (tier.branch, tier.required_sp, tier.tier));

    let mut state = SpTreeState::default();
    for tier in ordered {
        let spent = allocation.get(tier.branch);
        if spent >= tier.required_sp {
            state.unlocked.push(UnlockedTier {
                branch: tier.branch,
                tier: tier.tier,
                required_sp: tier.required_sp,
                skill: tier.skill.clone(),
            });
            if let Some(skill) = &tier.skill {
                state.skills.push(skill.clone());
            }
            state.bonuses.entry(tier.branch).or_default().absorb(tier);
        } else {
            // Sorted by threshold, so the first locked tier seen is the cheapest.
            state.next_locked.entry(tier.branch).or_insert_with(|| NextTier {
                tier: tier.tier,
                required_sp: tier.required_sp,
                sp_needed: tier.required_sp - spent,
                skill: tier.skill.clone(),
            });
        }
    }
    for bonus in state.bonuses.values() {
        state.total.merge(bonus);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::stat::StatKind;

    fn tier(branch: Branch, tier: u32, required_sp: u32, skill: Option<&str>, power: f64) -> SpTier {
        SpTier {
            branch,
            tier,
            required_sp,
            skill: skill.map(str::to_string),
            stats: StatBlock::from_pairs([(StatKind::Power, power)]),
            resistances: BTreeMap::from([("fire".to_string(), 1.0)]),
        }
    }

    #[test]
    fn unsorted_thresholds_are_checked_independently() {
        let tiers = vec![
            tier(Branch::A, 3, 60, Some("Meteor"), 30.0),
            tier(Branch::A, 1, 10, Some("Slash"), 10.0),
            tier(Branch::A, 2, 30, None, 20.0),
        ];
        let state = resolve_sp_tree(&SpAllocation::new(35, 0, 0), &tiers);
        let unlocked: Vec<u32> = state.unlocked.iter().map(|t| t.tier).collect();
        assert_eq!(unlocked, vec![1, 2]);
        assert_eq!(state.skills, vec!["Slash".to_string()]);
        let next = &state.next_locked[&Branch::A];
        assert_eq!((next.tier, next.sp_needed), (3, 25));
        assert_eq!(state.bonuses[&Branch::A].stats.get(StatKind::Power), 30.0);
        assert_eq!(state.total.resistances["fire"], 2.0);
    }

    #[test]
    fn branches_are_independent() {
        let tiers = vec![tier(Branch::A, 1, 10, None, 5.0), tier(Branch::C, 1, 10, None, 7.0)];
        let state = resolve_sp_tree(&SpAllocation::new(0, 100, 10), &tiers);
        assert_eq!(state.unlocked.len(), 1);
        assert_eq!(state.unlocked[0].branch, Branch::C);
        assert_eq!(state.next_locked[&Branch::A].sp_needed, 10);
        assert!(!state.next_locked.contains_key(&Branch::B));
        assert_eq!(state.total.stats.get(StatKind::Power), 7.0);
    }

    #[test]
    fn zero_threshold_tiers_unlock_immediately() {
        let tiers = vec![tier(Branch::B, 0, 0, Some("Basics"), 1.0)];
        let state = resolve_sp_tree(&SpAllocation::default(), &tiers);
        assert_eq!(state.skills, vec!["Basics".to_string()]);
        assert!(state.next_locked.is_empty());
    }
}
