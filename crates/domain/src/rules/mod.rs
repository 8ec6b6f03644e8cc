//! Caster rules: registry, slot tables, and the built-in rule set.

mod progression;
mod registry;
mod standard;

pub use progression::{SlotProgression, MAX_SPELL_CIRCLE, MAX_TABLE_LEVEL};
pub use registry::{
    CasterProfile, Contribution, PrestigeRule, RuleRegistry, RuleSet, DEFAULT_STACKING_PENALTY,
};
pub use standard::{classes, standard_rule_set};
