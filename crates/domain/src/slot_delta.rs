//! Bonus spell slots owed for the gap between actual and effective level.

use std::collections::BTreeMap;

use crate::carrier::BonusSlotProperty;
use crate::class_ledger::ClassLedger;
use crate::effective_level::EffectiveLevels;
use crate::ids::ClassId;
use crate::rules::{RuleRegistry, MAX_SPELL_CIRCLE};

/// `(class, circle) -> bonus slots`, recomputed from scratch every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDelta {
    slots: BTreeMap<(ClassId, u8), u8>,
}

impl SlotDelta {
    /// Delta for every boosted base class that has a slot table.
    pub fn compute(
        registry: &RuleRegistry,
        ledger: &ClassLedger,
        levels: &EffectiveLevels,
    ) -> Self {
        let mut slots = BTreeMap::new();

        for (class, level) in levels.boosted() {
            let Some(profile) = registry.caster(class) else {
                continue;
            };
            let actual = ledger.level(class);
            let effective = level.effective();
            for circle in 0..=MAX_SPELL_CIRCLE {
                let gained = profile
                    .slots
                    .base_slots(effective, circle)
                    .saturating_sub(profile.slots.base_slots(actual, circle));
                if gained > 0 {
                    slots.insert((class.clone(), circle), gained);
                }
            }
        }

        Self { slots }
    }

    pub fn get(&self, class: &ClassId, circle: u8) -> u8 {
        self.slots.get(&(class.clone(), circle)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, u8, u8)> {
        self.slots
            .iter()
            .map(|((class, circle), count)| (class, *circle, *count))
    }

    /// Total number of bonus slot properties the carrier must hold.
    pub fn total(&self) -> usize {
        self.slots.values().map(|n| usize::from(*n)).sum()
    }

    /// One property per slot, in class then circle order.
    pub fn properties(&self) -> Vec<BonusSlotProperty> {
        self.iter()
            .flat_map(|(class, circle, count)| {
                std::iter::repeat_with(move || BonusSlotProperty::new(class.clone(), circle))
                    .take(usize::from(count))
            })
            .collect()
    }
}
