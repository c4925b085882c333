//! Formula engine for the arithmetic DSL embedded in catalog data, plus the
//! variable mapper that feeds it canonical names.

pub mod cache;
pub mod engine;
pub mod variables;

pub use cache::FormulaCache;
pub use engine::{evaluate, CompiledFormula, Function};
pub use variables::{canonical_name, map_raw, map_variables, Variables};
