//! Error types shared by every calculation stage.
//!
//! Three failure families exist:
//! - [`FormulaError`]: a catalog formula could not be evaluated. Pipelines recover
//!   from it locally and record the failure instead of aborting.
//! - [`RangeError`]: the caller passed a value outside a documented bound.
//! - [`LookupError`]: a named definition (job, skill, weapon type, ...) is missing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("syntax error at offset {offset} in '{formula}': {message}")]
    Syntax {
        formula: String,
        offset: usize,
        message: String,
    },

    /// Callers must supply every variable a formula references, even when it is 0.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("function '{0}' is not allowed in formulas")]
    DisallowedFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("formula '{0}' did not produce a finite number")]
    NonNumeric(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("reinforcement +{value} is out of range for {slot} (valid: 0..={max})")]
    Reinforcement {
        slot: &'static str,
        value: u32,
        max: u32,
    },

    #[error("forge count {value} for {stat} exceeds the shared cap of {cap}")]
    Forge {
        stat: String,
        value: u32,
        cap: u32,
    },

    #[error("total forge count {total} exceeds the shared cap of {cap}")]
    ForgeTotal { total: u64, cap: u32 },

    #[error("{slot} accepts at most {max} EX selection(s), got {got}")]
    ExSlots {
        slot: &'static str,
        got: usize,
        max: usize,
    },

    #[error("SP allocation {value} for branch {branch} is out of range (valid: 0..={max})")]
    SpBranch {
        branch: char,
        value: u32,
        max: u32,
    },

    #[error("level {value} is out of range for job '{job}' (valid: 1..={max})")]
    Level { job: String, value: u32, max: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no damage formula for weapon type '{0}'")]
    WeaponType(String),

    #[error("no skill definition named '{0}'")]
    Skill(String),

    #[error("no job named '{0}'")]
    Job(String),

    #[error("no catalog item named '{0}'")]
    Item(String),

    #[error("no food named '{0}'")]
    Food(String),

    #[error("no rune named '{0}'")]
    Rune(String),

    #[error("no emblem named '{0}'")]
    Emblem(String),
}

/// Umbrella error for operations that can fail with more than one family.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_names_the_bound() {
        let err = RangeError::Reinforcement {
            slot: "weapon",
            value: 81,
            max: 80,
        };
        let display = err.to_string();
        assert!(display.contains("0..=80"));
        assert!(display.contains("+81"));
    }

    #[test]
    fn lookup_error_names_the_missing_key() {
        let err: CalcError = LookupError::WeaponType("Lance".to_string()).into();
        assert!(err.to_string().contains("Lance"));
        assert!(matches!(err, CalcError::Lookup(LookupError::WeaponType(_))));
    }
}
