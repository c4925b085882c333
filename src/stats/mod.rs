//! Stat pipeline: equipment, job, SP, consumables and overrides folded into
//! final stats through five stages, two of them fixed-point loops.

pub mod breakdown;
pub mod convergence;
pub mod pipeline;

pub use breakdown::{FormulaFailure, SourceBreakdown, StatSource};
pub use convergence::{
    apply_percent_once, apply_percent_recursive, ring_convergence, BlockConvergence,
    RingConvergence,
};
pub use pipeline::{compute_stats, resolve_equipment, BaseStatusStrategy, CalculatedStats};
