pub mod cli;
pub mod damage;
pub mod data;
pub mod equipment;
pub mod error;
pub mod formula;
pub mod optimizer;
pub mod parallel;
pub mod server;
pub mod sp_tree;
pub mod stats;

pub use error::{CalcError, FormulaError, LookupError, RangeError};
