//! Built-in ruleset shipped with the engine.

use super::progression::SlotProgression;
use super::registry::{CasterProfile, PrestigeRule, RuleRegistry, RuleSet};

/// Classes used by the built-in ruleset.
pub mod classes {
    pub const BARD: &str = "bard";
    pub const CLERIC: &str = "cleric";
    pub const DRUID: &str = "druid";
    pub const PALADIN: &str = "paladin";
    pub const RANGER: &str = "ranger";
    pub const SORCERER: &str = "sorcerer";
    pub const WIZARD: &str = "wizard";

    pub const ARCANE_ARCHER: &str = "arcane_archer";
    pub const ASSASSIN: &str = "assassin";
    pub const BLACKGUARD: &str = "blackguard";
    pub const DIVINE_CHAMPION: &str = "divine_champion";
    pub const ELDRITCH_KNIGHT: &str = "eldritch_knight";
    pub const HARPER_SCOUT: &str = "harper_scout";
    pub const PALE_MASTER: &str = "pale_master";
    pub const SHIFTER: &str = "shifter";
}

/// The stock rule set.
pub fn standard_rule_set() -> RuleSet {
    use classes::*;

    RuleSet {
        casters: vec![
            CasterProfile::new(CLERIC, SlotProgression::Prepared)
                .overridable()
                .divine("Cleric")
                .with_domains(),
            CasterProfile::new(DRUID, SlotProgression::Prepared)
                .overridable()
                .divine("Druid"),
            CasterProfile::new(PALADIN, SlotProgression::HalfCaster)
                .overridable()
                .divine("Paladin"),
            CasterProfile::new(RANGER, SlotProgression::HalfCaster)
                .overridable()
                .divine("Ranger"),
            CasterProfile::new(WIZARD, SlotProgression::Prepared).overridable(),
            CasterProfile::new(SORCERER, SlotProgression::Spontaneous).overridable(),
            CasterProfile::new(BARD, SlotProgression::Bard).overridable(),
        ],
        prestige: vec![
            PrestigeRule::new(BLACKGUARD, [CLERIC, DRUID, PALADIN]),
            PrestigeRule::new(DIVINE_CHAMPION, [CLERIC, PALADIN, DRUID, RANGER]),
            PrestigeRule::new(SHIFTER, [DRUID]),
            PrestigeRule::new(PALE_MASTER, [WIZARD, SORCERER, BARD]),
            PrestigeRule::new(ELDRITCH_KNIGHT, [WIZARD, SORCERER, BARD]),
            PrestigeRule::new(ARCANE_ARCHER, [WIZARD, SORCERER, BARD]),
            PrestigeRule::new(HARPER_SCOUT, [BARD, SORCERER, WIZARD]),
            // Pale Master stands in as a base when no arcane class is present.
            PrestigeRule::new(ASSASSIN, [SORCERER, WIZARD, BARD, PALE_MASTER]),
        ],
        stacking_penalty: None,
    }
}

impl RuleRegistry {
    /// Registry built from [`standard_rule_set`].
    pub fn standard() -> Self {
        match Self::from_rule_set(standard_rule_set()) {
            Ok(registry) => registry,
            // The stock rule set is covered by tests; reaching this is a programming error.
            Err(e) => unreachable!("standard rule set is invalid: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClassId;

    #[test]
    fn standard_rule_set_is_valid() {
        assert!(RuleRegistry::from_rule_set(standard_rule_set()).is_ok());
    }

    #[test]
    fn only_cleric_has_domains() {
        let registry = RuleRegistry::standard();
        let with_domains: Vec<_> = registry
            .casters()
            .filter(|p| p.has_domains)
            .map(|p| p.class.as_str())
            .collect();
        assert_eq!(with_domains, vec![classes::CLERIC]);
    }

    #[test]
    fn every_stock_prestige_class_stacks_in_full() {
        use crate::class_ledger::ClassLedger;
        use crate::effective_level::calculate;

        let rules = standard_rule_set();
        let registry = RuleRegistry::standard();
        for rule in &rules.prestige {
            let base = rule
                .valid_bases
                .iter()
                .find(|class| registry.is_true_base(class))
                .expect("stock rule has a true base");
            for level in 0..=20u8 {
                let ledger = ClassLedger::new()
                    .with_class(base.clone(), 10)
                    .with_class(rule.class.clone(), level);
                assert_eq!(
                    calculate(&registry, &ledger).effective(base),
                    10 + level.saturating_sub(5),
                    "{} {level} onto {base} 10",
                    rule.class
                );
            }
        }
    }

    #[test]
    fn divine_casters_have_spell_columns() {
        let registry = RuleRegistry::standard();
        assert_eq!(registry.divine_casters().count(), 4);
        assert!(registry.divine_casters().all(|p| p.spell_column.is_some()));
        assert!(!registry.is_true_base(&ClassId::new(classes::PALE_MASTER)));
    }
}
