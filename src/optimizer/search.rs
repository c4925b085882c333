//! Search strategies over slot combinations. The optimizer picks one per call
//! from the cross-product size; callers only see [`SearchStrategy`].

use crate::damage::compute_damage;
use crate::data::build::EquippedItem;
use crate::data::catalog::Catalogs;
use crate::optimizer::candidates::{combination_count, SlotCandidates};
use crate::optimizer::ranking::{Evaluation, RankedPool};
use crate::optimizer::rng::{mix_seed, Rng};
use crate::optimizer::{OptimizeRequest, OptimizerStrategy};
use crate::parallel::{batch_ranges, evaluate_ordered, WorkerPool};
use crate::stats::compute_stats;

/// Stream id for the greedy search's random samples.
const SAMPLE_STREAM: u64 = 0x5a3b;
/// Progress batches for the random-sample phase.
const SAMPLE_BATCHES: usize = 8;

/// Everything a strategy needs to evaluate a combination.
pub struct SearchContext<'a> {
    pub request: &'a OptimizeRequest,
    pub catalogs: &'a Catalogs,
    /// Target slots in search order with their choices.
    pub slots: &'a [SlotCandidates],
}

impl SearchContext<'_> {
    /// Stat and damage pipelines for the build with `selection` placed into
    /// the target slots. `None` when either pipeline fails.
    pub fn evaluate(&self, selection: &[Option<EquippedItem>]) -> Option<Evaluation> {
        let mut build = self.request.build.clone();
        for (slot, choice) in self.slots.iter().zip(selection) {
            match choice {
                Some(equipped) => {
                    build.equipment.insert(slot.slot, equipped.clone());
                }
                None => {
                    build.equipment.remove(&slot.slot);
                }
            }
        }
        let evaluated = compute_stats(&build, self.catalogs).and_then(|stats| {
            let damage = compute_damage(
                &build,
                &stats,
                self.request.skill.as_deref(),
                &self.request.target,
                self.catalogs,
            )?;
            Ok((stats, damage))
        });
        match evaluated {
            Ok((stats, damage)) => Some(Evaluation {
                equipment: build.equipment,
                stats,
                damage,
            }),
            Err(error) => {
                tracing::debug!(%error, "combination skipped");
                None
            }
        }
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::with_workers(self.request.constraints.workers)
    }
}

/// Output of one search: how many combinations were evaluated and the
/// collected (deduplicated, pruned) evaluations.
#[derive(Debug)]
pub struct SearchOutput {
    pub evaluations: u64,
    pub pool: RankedPool,
}

pub trait SearchStrategy {
    fn kind(&self) -> OptimizerStrategy;

    /// Run the search, calling `on_progress(done, total)` as evaluations finish.
    fn search(&self, context: &SearchContext<'_>, on_progress: &mut dyn FnMut(u64, u64)) -> SearchOutput;
}

/// Strategy implementation for a kind.
pub fn strategy_for(kind: OptimizerStrategy) -> Box<dyn SearchStrategy> {
    match kind {
        OptimizerStrategy::Exhaustive => Box::new(ExhaustiveSearch),
        OptimizerStrategy::Greedy => Box::new(GreedySearch),
    }
}

/// Depth-first enumeration of the full cross product in slot order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveSearch;

struct Walk<'p> {
    selection: Vec<Option<EquippedItem>>,
    leaves: u64,
    total: u64,
    interval: u64,
    pool: RankedPool,
    on_progress: &'p mut dyn FnMut(u64, u64),
}

impl SearchStrategy for ExhaustiveSearch {
    fn kind(&self) -> OptimizerStrategy {
        OptimizerStrategy::Exhaustive
    }

    fn search(&self, context: &SearchContext<'_>, on_progress: &mut dyn FnMut(u64, u64)) -> SearchOutput {
        let constraints = &context.request.constraints;
        let mut walk = Walk {
            selection: Vec::with_capacity(context.slots.len()),
            leaves: 0,
            total: combination_count(context.slots),
            interval: constraints.progress_interval.max(1),
            pool: RankedPool::new(constraints.result_limit),
            on_progress,
        };
        descend(context, 0, &mut walk);
        if walk.leaves % walk.interval != 0 {
            (walk.on_progress)(walk.leaves, walk.total);
        }
        SearchOutput {
            evaluations: walk.leaves,
            pool: walk.pool,
        }
    }
}

fn descend(context: &SearchContext<'_>, depth: usize, walk: &mut Walk<'_>) {
    let Some(slot) = context.slots.get(depth) else {
        walk.leaves += 1;
        if let Some(evaluation) = context.evaluate(&walk.selection) {
            walk.pool.push(evaluation);
        }
        if walk.leaves % walk.interval == 0 {
            (walk.on_progress)(walk.leaves, walk.total);
        }
        return;
    };
    for index in 0..slot.choices() {
        walk.selection.push(slot.choice(index));
        descend(context, depth + 1, walk);
        walk.selection.pop();
    }
}

/// One improving sweep per slot from the current equipment, then seeded
/// random full builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySearch;

/// Evaluations the greedy search performs for these slots.
pub fn greedy_evaluations(slots: &[SlotCandidates], random_samples: usize) -> u64 {
    let sweeps: u64 = slots.iter().map(|slot| slot.choices() as u64).sum();
    1 + sweeps + random_samples as u64
}

impl SearchStrategy for GreedySearch {
    fn kind(&self) -> OptimizerStrategy {
        OptimizerStrategy::Greedy
    }

    fn search(&self, context: &SearchContext<'_>, on_progress: &mut dyn FnMut(u64, u64)) -> SearchOutput {
        let constraints = &context.request.constraints;
        let total = greedy_evaluations(context.slots, constraints.random_samples);
        let workers = context.pool();
        let mut pool = RankedPool::new(constraints.result_limit);
        on_progress(0, total);

        let mut selection: Vec<Option<EquippedItem>> = context
            .slots
            .iter()
            .map(|slot| context.request.build.equipment.get(&slot.slot).cloned())
            .collect();
        let mut best = f64::NEG_INFINITY;
        if let Some(evaluation) = context.evaluate(&selection) {
            best = evaluation.expected_damage();
            pool.push(evaluation);
        }
        let mut done = 1u64;

        for (position, slot) in context.slots.iter().enumerate() {
            let options: Vec<Vec<Option<EquippedItem>>> = (0..slot.choices())
                .map(|index| {
                    let mut option = selection.clone();
                    option[position] = slot.choice(index);
                    option
                })
                .collect();
            let evaluations = evaluate_ordered(&options, constraints.parallel, &workers, |option| {
                context.evaluate(option)
            });
            done += options.len() as u64;

            let mut improvement = None;
            for (option, evaluation) in options.into_iter().zip(evaluations) {
                let Some(evaluation) = evaluation else {
                    continue;
                };
                let damage = evaluation.expected_damage();
                if damage > best {
                    best = damage;
                    improvement = Some(option);
                }
                pool.push(evaluation);
            }
            if let Some(option) = improvement {
                selection = option;
            }
            tracing::trace!(slot = %slot.slot, best, "greedy sweep");
            on_progress(done, total);
        }

        let mut rng = Rng::new(mix_seed(constraints.seed, SAMPLE_STREAM));
        let samples: Vec<Vec<Option<EquippedItem>>> = (0..constraints.random_samples)
            .map(|_| {
                context
                    .slots
                    .iter()
                    .map(|slot| slot.choice(rng.below(slot.choices())))
                    .collect()
            })
            .collect();
        for (start, end) in batch_ranges(samples.len(), SAMPLE_BATCHES) {
            let batch = &samples[start..end];
            let evaluations = evaluate_ordered(batch, constraints.parallel, &workers, |sample| {
                context.evaluate(sample)
            });
            for evaluation in evaluations.into_iter().flatten() {
                pool.push(evaluation);
            }
            done += batch.len() as u64;
            on_progress(done, total);
        }

        SearchOutput {
            evaluations: done,
            pool,
        }
    }
}
