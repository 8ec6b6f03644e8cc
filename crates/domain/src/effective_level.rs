//! Effective caster level calculation.
//!
//! Prestige classes stack their levels onto one base caster class each. All
//! prestige levels aimed at the same base are pooled, and the stacking penalty
//! is taken from the pool once, so two prestige classes feeding a Cleric cost
//! the same 5 levels as one.
//!
//! Target selection for a prestige class:
//! 1. Only valid bases the character actually has levels in are candidates.
//! 2. True base casters beat fallback targets (prestige classes standing in as a base).
//! 3. Higher actual level wins.
//! 4. Remaining ties go to the candidate listed first in the rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::class_ledger::ClassLedger;
use crate::ids::ClassId;
use crate::rules::RuleRegistry;

/// Actual and stacked level of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveLevel {
    pub actual: u8,
    pub bonus: u8,
}

impl EffectiveLevel {
    pub fn effective(&self) -> u8 {
        self.actual.saturating_add(self.bonus)
    }

    pub fn is_boosted(&self) -> bool {
        self.bonus > 0
    }
}

/// Result of one calculation: `class -> effective level`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveLevels {
    levels: BTreeMap<ClassId, EffectiveLevel>,
    /// Prestige classes present on the character whose levels went nowhere.
    #[serde(default)]
    unresolved: Vec<ClassId>,
}

impl EffectiveLevels {
    pub fn get(&self, class: &ClassId) -> Option<EffectiveLevel> {
        self.levels.get(class).copied()
    }

    /// Effective level of a class, 0 when the character has none.
    pub fn effective(&self, class: &ClassId) -> u8 {
        self.get(class).map(|l| l.effective()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, EffectiveLevel)> {
        self.levels.iter().map(|(class, level)| (class, *level))
    }

    /// Classes whose effective level exceeds their actual level.
    pub fn boosted(&self) -> impl Iterator<Item = (&ClassId, EffectiveLevel)> {
        self.iter().filter(|(_, level)| level.is_boosted())
    }

    pub fn unresolved(&self) -> &[ClassId] {
        &self.unresolved
    }
}

/// Compute effective caster levels for a character's ledger.
pub fn calculate(registry: &RuleRegistry, ledger: &ClassLedger) -> EffectiveLevels {
    let mut levels: BTreeMap<ClassId, EffectiveLevel> = ledger
        .iter()
        .filter(|(class, _)| registry.is_true_base(class))
        .map(|(class, actual)| (class.clone(), EffectiveLevel { actual, bonus: 0 }))
        .collect();

    let mut pooled: BTreeMap<ClassId, u16> = BTreeMap::new();
    let mut unresolved = Vec::new();

    for (class, level) in ledger.iter() {
        let Some(rule) = registry.prestige(class) else {
            continue;
        };
        match resolve_target(registry, ledger, &rule.valid_bases) {
            Some(target) => {
                *pooled.entry(target.clone()).or_insert(0) +=
                    u16::from(rule.contribution.levels(level));
            }
            None => unresolved.push(class.clone()),
        }
    }

    let penalty = u16::from(registry.stacking_penalty());
    for (target, total) in pooled {
        let bonus = u8::try_from(total.saturating_sub(penalty)).unwrap_or(u8::MAX);
        let actual = ledger.level(&target);
        levels
            .entry(target)
            .and_modify(|entry| entry.bonus = bonus)
            .or_insert(EffectiveLevel { actual, bonus });
    }

    EffectiveLevels { levels, unresolved }
}

fn resolve_target<'a>(
    registry: &RuleRegistry,
    ledger: &ClassLedger,
    candidates: &'a [ClassId],
) -> Option<&'a ClassId> {
    let mut best: Option<(&ClassId, (bool, u8))> = None;
    for candidate in candidates {
        let level = ledger.level(candidate);
        if level == 0 {
            continue;
        }
        let rank = (registry.is_true_base(candidate), level);
        // Strictly greater keeps the earlier candidate on ties.
        if best.map_or(true, |(_, best_rank)| rank > best_rank) {
            best = Some((candidate, rank));
        }
    }
    best.map(|(class, _)| class)
}
