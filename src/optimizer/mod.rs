//! Equipment optimizer: per-slot candidates, then an exhaustive or greedy
//! search over slot combinations, ranked by expected damage.

pub mod candidates;
pub mod export;
pub mod ranking;
pub mod rng;
pub mod search;

use serde::{Deserialize, Serialize};

use crate::damage::Target;
use crate::data::build::{CharacterBuild, EquipSlot};
use crate::data::catalog::Catalogs;
use crate::data::item::Rank;
use crate::error::CalcError;
use crate::optimizer::candidates::{combination_count, generate_candidates, SlotCandidates};
use crate::optimizer::search::{strategy_for, SearchContext};
use crate::stats::pipeline::check_level;

pub use candidates::Candidate;
pub use ranking::{rank_results, Evaluation, OptimizeResult};
pub use search::SearchStrategy;

/// Search strategy, chosen once per call from the cross-product size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerStrategy {
    /// Every combination, depth first.
    Exhaustive,
    /// Per-slot local search plus random samples.
    Greedy,
}

impl OptimizerStrategy {
    pub fn for_combinations(combinations: u64, ceiling: u64) -> Self {
        if combinations <= ceiling {
            Self::Exhaustive
        } else {
            Self::Greedy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConstraints {
    /// Weapon rank range; weapons are evaluated at its top.
    pub weapon_min_rank: Rank,
    pub weapon_max_rank: Rank,
    /// Lowest rank armor and accessories are evaluated at.
    pub rank_floor: Rank,
    /// Per-slot candidate cap.
    pub max_candidates: usize,
    /// Largest cross product searched exhaustively.
    pub exhaustive_ceiling: u64,
    /// Exhaustive search reports progress every this many leaves.
    pub progress_interval: u64,
    pub result_limit: usize,
    /// Random full builds added to a greedy search.
    pub random_samples: usize,
    pub seed: u64,
    /// Evaluate greedy sweeps on the rayon pool.
    pub parallel: bool,
    /// Worker threads when `parallel` is set; 0 uses the global pool.
    pub workers: usize,
}

impl Default for OptimizeConstraints {
    fn default() -> Self {
        Self {
            weapon_min_rank: Rank::F,
            weapon_max_rank: Rank::SSS,
            rank_floor: Rank::F,
            max_candidates: 50,
            exhaustive_ceiling: 5_000,
            progress_interval: 100,
            result_limit: 100,
            random_samples: 64,
            seed: 0,
            parallel: false,
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub build: CharacterBuild,
    /// Slots to search, in search order. Other slots keep the build's equipment.
    #[serde(default = "all_slots")]
    pub target_slots: Vec<EquipSlot>,
    #[serde(default)]
    pub constraints: OptimizeConstraints,
    /// Skill to rank by; `None` ranks by normal attacks.
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub target: Target,
}

fn all_slots() -> Vec<EquipSlot> {
    EquipSlot::ALL.to_vec()
}

impl OptimizeRequest {
    pub fn new(build: CharacterBuild) -> Self {
        Self {
            build,
            target_slots: all_slots(),
            constraints: OptimizeConstraints::default(),
            skill: None,
            target: Target::default(),
        }
    }

    pub fn with_slots(mut self, slots: impl IntoIterator<Item = EquipSlot>) -> Self {
        self.target_slots = slots.into_iter().collect();
        self
    }

    pub fn with_constraints(mut self, constraints: OptimizeConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeOutcome {
    pub strategy: OptimizerStrategy,
    /// Size of the full cross product, "no item" choices included.
    pub combinations: u64,
    pub evaluations: u64,
    pub results: Vec<OptimizeResult>,
}

/// Search the target slots for the combinations with the highest expected
/// damage. `on_progress(done, total)` is called as evaluations complete.
///
/// Fails up front when the build itself is unusable (unknown job or skill,
/// level or SP out of range); individual combinations that fail are skipped.
pub fn optimize<F>(request: &OptimizeRequest, catalogs: &Catalogs, mut on_progress: F) -> Result<OptimizeOutcome, CalcError>
where
    F: FnMut(u64, u64),
{
    let build = &request.build;
    let job = catalogs.job(&build.job)?;
    check_level(job, build.level)?;
    build.sp.validate(catalogs.constants.max_sp_per_branch)?;
    if let Some(skill) = &request.skill {
        catalogs.skill(skill)?;
    }

    let mut slots: Vec<SlotCandidates> = Vec::with_capacity(request.target_slots.len());
    for slot in &request.target_slots {
        if slots.iter().any(|existing| existing.slot == *slot) {
            continue;
        }
        slots.push(generate_candidates(*slot, build, job, &request.constraints, catalogs));
    }

    let combinations = combination_count(&slots);
    let strategy = OptimizerStrategy::for_combinations(combinations, request.constraints.exhaustive_ceiling);
    tracing::info!(
        job = %build.job,
        slots = slots.len(),
        combinations,
        ?strategy,
        "optimizing equipment"
    );

    let context = SearchContext {
        request,
        catalogs,
        slots: &slots,
    };
    let search = strategy_for(strategy);
    let output = search.search(&context, &mut on_progress);
    let results = output.pool.into_ranked();
    tracing::debug!(evaluations = output.evaluations, results = results.len(), "optimization finished");

    Ok(OptimizeOutcome {
        strategy: search.kind(),
        combinations,
        evaluations: output.evaluations,
        results,
    })
}
