use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::FormulaError;
use crate::formula::engine::CompiledFormula;
use crate::formula::variables::Variables;

/// Memoizes formula compilation by source text. Shared across threads, so the
/// optimizer's parallel sweeps compile each catalog formula once.
#[derive(Debug, Default)]
pub struct FormulaCache {
    compiled: RwLock<HashMap<String, Arc<CompiledFormula>>>,
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, source: &str) -> Result<Arc<CompiledFormula>, FormulaError> {
        if let Ok(compiled) = self.compiled.read() {
            if let Some(hit) = compiled.get(source) {
                return Ok(Arc::clone(hit));
            }
        }
        let formula = Arc::new(CompiledFormula::compile(source)?);
        // A poisoned lock only loses memoization, never correctness.
        if let Ok(mut compiled) = self.compiled.write() {
            compiled
                .entry(source.to_string())
                .or_insert_with(|| Arc::clone(&formula));
        }
        Ok(formula)
    }

    pub fn evaluate(&self, source: &str, variables: &Variables) -> Result<f64, FormulaError> {
        self.compile(source)?.evaluate(variables)
    }

    pub fn len(&self) -> usize {
        self.compiled.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
