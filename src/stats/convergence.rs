//! The two fixed-point loops of the stat pipeline.

use serde::Serialize;

use crate::data::stat::{StatBlock, StatKind};

/// Outcome of a fixed-point iteration over a whole stat block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockConvergence {
    pub stats: StatBlock,
    pub iterations: u32,
    pub converged: bool,
}

/// One pass of `round(current × (1 + pct/100))` for every kind with a percent.
pub fn apply_percent_once(current: &StatBlock, percent: &StatBlock) -> StatBlock {
    current.map_values(|kind, value| {
        let pct = percent.get(kind);
        if pct == 0.0 {
            value
        } else {
            (value * (1.0 + pct / 100.0)).round()
        }
    })
}

/// Recursive user percent: iterate `x = base + round(x × pct/100)` from `x = base`
/// until the largest per-kind change drops below 1, at most `max_iterations` times.
pub fn apply_percent_recursive(base: &StatBlock, percent: &StatBlock, max_iterations: u32) -> BlockConvergence {
    let kinds: Vec<StatKind> = base.kinds().filter(|kind| percent.get(*kind) != 0.0).collect();
    let mut current = base.clone();
    for iteration in 1..=max_iterations {
        let mut largest_change: f64 = 0.0;
        let mut next = current.clone();
        for kind in &kinds {
            let value = base.get(*kind) + (current.get(*kind) * percent.get(*kind) / 100.0).round();
            largest_change = largest_change.max((value - current.get(*kind)).abs());
            next.set(*kind, value);
        }
        current = next;
        if largest_change < 1.0 {
            return BlockConvergence {
                stats: current,
                iterations: iteration,
                converged: true,
            };
        }
    }
    tracing::warn!(max_iterations, "user percent did not converge within the iteration cap");
    BlockConvergence {
        stats: current,
        iterations: max_iterations,
        converged: false,
    }
}

/// Ring-buff state for the targeted stat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingConvergence {
    pub target: StatKind,
    /// Target stat in equipment totals, the seed of the loop.
    pub equipment: f64,
    pub value: f64,
    /// What the ring adds to the target stat.
    pub delta: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Seed `base = equip + ring_base`, start at `base + equip × multiplier`, then
/// iterate `current = base + round(current × multiplier)` until the floor is stable.
pub fn ring_convergence(
    target: StatKind,
    equipment: f64,
    ring_base: f64,
    multiplier: f64,
    max_iterations: u32,
) -> RingConvergence {
    let base = equipment + ring_base;
    let mut current = base + equipment * multiplier;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        iterations += 1;
        let next = base + (current * multiplier).round();
        let stable = next.floor() == current.floor();
        current = next;
        if stable {
            converged = true;
            break;
        }
    }
    if !converged {
        tracing::warn!(stat = %target, max_iterations, "ring buff did not converge within the iteration cap");
    }
    RingConvergence {
        target,
        equipment,
        value: current,
        delta: current - equipment,
        iterations,
        converged,
    }
}
