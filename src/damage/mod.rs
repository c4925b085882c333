//! Damage pipeline: final stats to expected damage per use against a target.

pub mod extra_attack;
pub mod mitigation;
pub mod pipeline;

pub use extra_attack::ExtraAttack;
pub use mitigation::{mitigate_extra, mitigate_hit, Target};
pub use pipeline::{
    compute_damage, BaseDamageStrategy, CriticalDamageStrategy, DamageResult, SkillValues, UNARMED,
};
