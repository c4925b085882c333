pub mod build;
pub mod catalog;
pub mod constants;
pub mod item;
pub mod job;
pub mod loader;
pub mod stat;
pub mod validate;

pub use build::{
    CharacterBuild, CritMode, EquipSlot, EquipmentConfiguration, EquippedItem, RingBuff,
    SpAllocation,
};
pub use catalog::{BuffRow, Catalogs, FormulaTable, SkillDefinition, SkillFormulas};
pub use constants::{
    AccessoryConstants, ArmorConstants, Constants, ExCategory, ExConstants, WeaponConstants,
};
pub use item::{EquipmentItem, ItemSlot, Rank, SlotClass};
pub use job::{Branch, JobDefinition, SpTier};
pub use stat::{StatBlock, StatKind};
