//! Equipment stat resolver: effective item stats from a catalog row plus its
//! rank, reinforcement, forge, alchemy and EX configuration.

pub mod resolver;

pub use resolver::{resolve, stat_sum, BonusBreakdown, ResolvedEquipment};
