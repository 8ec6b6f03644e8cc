//! Static caster rules: which classes cast, how prestige classes stack onto them.
//!
//! A `RuleRegistry` is immutable once built and is shared by reference with
//! every calculation and reconciler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::progression::SlotProgression;
use crate::error::DomainError;
use crate::ids::ClassId;

/// Levels subtracted once per target base class from the stacked prestige total.
pub const DEFAULT_STACKING_PENALTY: u8 = 5;

/// How a true base caster class behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasterProfile {
    pub class: ClassId,
    pub slots: SlotProgression,
    /// The engine cannot compute this class's stacked caster level itself.
    #[serde(default)]
    pub overridable: bool,
    /// The class knows its whole spell list per circle (divine casters).
    #[serde(default)]
    pub grants_known_spells: bool,
    /// The class also learns domain spells.
    #[serde(default)]
    pub has_domains: bool,
    /// Column holding this class's circle in the spell ruleset table.
    #[serde(default)]
    pub spell_column: Option<String>,
}

impl CasterProfile {
    pub fn new(class: impl Into<ClassId>, slots: SlotProgression) -> Self {
        Self {
            class: class.into(),
            slots,
            overridable: false,
            grants_known_spells: false,
            has_domains: false,
            spell_column: None,
        }
    }

    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }

    /// Mark as a divine caster whose spells come from `column` of the spell table.
    pub fn divine(mut self, column: impl Into<String>) -> Self {
        self.grants_known_spells = true;
        self.spell_column = Some(column.into());
        self
    }

    pub fn with_domains(mut self) -> Self {
        self.has_domains = true;
        self
    }
}

/// How many stacking levels one prestige class contributes at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "max", rename_all = "snake_case")]
pub enum Contribution {
    /// Every level counts
    Full,
    /// Every second level counts
    Half,
    /// Levels count up to a cap
    Capped(u8),
}

impl Contribution {
    pub fn levels(self, level: u8) -> u8 {
        match self {
            Contribution::Full => level,
            Contribution::Half => level / 2,
            Contribution::Capped(max) => level.min(max),
        }
    }
}

/// A prestige class that adds effective caster levels to a base class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrestigeRule {
    pub class: ClassId,
    /// Candidate targets in preference order; the first wins ties.
    pub valid_bases: Vec<ClassId>,
    #[serde(default = "default_contribution")]
    pub contribution: Contribution,
}

fn default_contribution() -> Contribution {
    Contribution::Full
}

impl PrestigeRule {
    pub fn new<I, C>(class: impl Into<ClassId>, valid_bases: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassId>,
    {
        Self {
            class: class.into(),
            valid_bases: valid_bases.into_iter().map(Into::into).collect(),
            contribution: Contribution::Full,
        }
    }

    pub fn with_contribution(mut self, contribution: Contribution) -> Self {
        self.contribution = contribution;
        self
    }
}

/// Serializable rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub casters: Vec<CasterProfile>,
    #[serde(default)]
    pub prestige: Vec<PrestigeRule>,
    #[serde(default)]
    pub stacking_penalty: Option<u8>,
}

/// Immutable registry of caster profiles and prestige stacking rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRegistry {
    casters: BTreeMap<ClassId, CasterProfile>,
    prestige: BTreeMap<ClassId, PrestigeRule>,
    stacking_penalty: u8,
}

impl RuleRegistry {
    /// Build a registry from configuration, rejecting contradictory rules.
    pub fn from_rule_set(rules: RuleSet) -> Result<Self, DomainError> {
        let mut casters = BTreeMap::new();
        for profile in rules.casters {
            let class = profile.class.clone();
            if casters.insert(class.clone(), profile).is_some() {
                return Err(DomainError::validation(format!(
                    "caster class '{class}' is defined twice"
                )));
            }
        }

        let mut prestige = BTreeMap::new();
        for rule in rules.prestige {
            let class = rule.class.clone();
            if casters.contains_key(&class) {
                return Err(DomainError::validation(format!(
                    "'{class}' cannot be both a base caster and a prestige class"
                )));
            }
            if rule.valid_bases.is_empty() {
                return Err(DomainError::validation(format!(
                    "prestige class '{class}' has no valid base classes"
                )));
            }
            if rule.valid_bases.contains(&class) {
                return Err(DomainError::validation(format!(
                    "prestige class '{class}' cannot target itself"
                )));
            }
            if prestige.insert(class.clone(), rule).is_some() {
                return Err(DomainError::validation(format!(
                    "prestige class '{class}' is defined twice"
                )));
            }
        }

        Ok(Self {
            casters,
            prestige,
            stacking_penalty: rules.stacking_penalty.unwrap_or(DEFAULT_STACKING_PENALTY),
        })
    }

    /// Profile of a true base caster class.
    pub fn caster(&self, class: &ClassId) -> Option<&CasterProfile> {
        self.casters.get(class)
    }

    /// Stacking rule of a prestige class.
    pub fn prestige(&self, class: &ClassId) -> Option<&PrestigeRule> {
        self.prestige.get(class)
    }

    pub fn is_true_base(&self, class: &ClassId) -> bool {
        self.casters.contains_key(class)
    }

    pub fn is_prestige(&self, class: &ClassId) -> bool {
        self.prestige.contains_key(class)
    }

    pub fn casters(&self) -> impl Iterator<Item = &CasterProfile> {
        self.casters.values()
    }

    /// Divine casters whose known spells are granted per circle.
    pub fn divine_casters(&self) -> impl Iterator<Item = &CasterProfile> {
        self.casters.values().filter(|p| p.grants_known_spells)
    }

    pub fn stacking_penalty(&self) -> u8 {
        self.stacking_penalty
    }
}
