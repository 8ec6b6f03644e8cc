//! Pure rules and value types for effective caster level reconciliation.
//!
//! Nothing in this crate performs I/O. The engine crate feeds it class ledgers
//! read from the game and applies the derived results through its ports.

pub mod carrier;
pub mod class_ledger;
pub mod effective_level;
pub mod error;
pub mod grant;
pub mod ids;
pub mod rules;
pub mod slot_delta;

pub use carrier::{BonusSlotProperty, InventoryItem, ItemTemplate, CARRIER_TAG};
pub use class_ledger::{ClassLedger, ClassLevel};
pub use effective_level::{calculate as calculate_effective_levels, EffectiveLevel, EffectiveLevels};
pub use error::DomainError;
pub use grant::{GrantKey, GrantRecord, Staleness, GRANT_KEY_PREFIX};
pub use ids::{CharacterId, ClassId, DomainId, ItemId, SpellId};
pub use rules::{
    classes, standard_rule_set, CasterProfile, Contribution, PrestigeRule, RuleRegistry, RuleSet,
    SlotProgression, DEFAULT_STACKING_PENALTY, MAX_SPELL_CIRCLE,
};
pub use slot_delta::SlotDelta;
