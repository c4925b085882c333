use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::stat::{StatBlock, StatKind};

/// Additive sources folded by the BaseStatus stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatSource {
    Equipment,
    Job,
    Sp,
    Food,
    Manual,
    Rune,
}

impl StatSource {
    pub const ALL: [StatSource; 6] = [
        StatSource::Equipment,
        StatSource::Job,
        StatSource::Sp,
        StatSource::Food,
        StatSource::Manual,
        StatSource::Rune,
    ];

    /// Name of the source inside a BaseStatus formula.
    pub const fn variable(self) -> &'static str {
        match self {
            StatSource::Equipment => "Equip",
            StatSource::Job => "Job",
            StatSource::Sp => "SP",
            StatSource::Food => "Food",
            StatSource::Manual => "Manual",
            StatSource::Rune => "Rune",
        }
    }
}

/// Per-source stat contributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourceBreakdown {
    sources: BTreeMap<StatSource, StatBlock>,
}

impl SourceBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: StatSource, block: StatBlock) {
        self.sources.insert(source, block);
    }

    pub fn source(&self, source: StatSource) -> Option<&StatBlock> {
        self.sources.get(&source)
    }

    pub fn amount(&self, source: StatSource, kind: StatKind) -> f64 {
        self.sources.get(&source).map_or(0.0, |block| block.get(kind))
    }

    /// Every kind any source mentions, in canonical order.
    pub fn kinds(&self) -> Vec<StatKind> {
        let mut kinds: Vec<StatKind> = self
            .sources
            .values()
            .flat_map(|block| block.kinds())
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn additive_total(&self) -> StatBlock {
        StatBlock::sum(self.sources.values())
    }
}

/// A catalog formula that could not be evaluated. The stage that hit it fell
/// back to its default for the affected value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaFailure {
    pub stage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<StatKind>,
    pub formula: String,
    pub message: String,
}

impl FormulaFailure {
    pub fn new(
        stage: &'static str,
        stat: Option<StatKind>,
        formula: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        let failure = Self {
            stage,
            stat,
            formula: formula.into(),
            message: message.to_string(),
        };
        tracing::warn!(
            stage,
            stat = ?failure.stat,
            formula = %failure.formula,
            error = %failure.message,
            "formula failed, using fallback"
        );
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_total_sums_every_source() {
        let mut breakdown = SourceBreakdown::new();
        breakdown.insert(StatSource::Job, StatBlock::from_pairs([(StatKind::Hp, 100.0)]));
        breakdown.insert(
            StatSource::Food,
            StatBlock::from_pairs([(StatKind::Hp, 5.0), (StatKind::Luck, 2.0)]),
        );
        let total = breakdown.additive_total();
        assert_eq!(total.get(StatKind::Hp), 105.0);
        assert_eq!(breakdown.kinds(), vec![StatKind::Hp, StatKind::Luck]);
        assert_eq!(breakdown.amount(StatSource::Rune, StatKind::Hp), 0.0);
    }
}
