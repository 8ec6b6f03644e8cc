//! Known-spell grants for circles reached only through effective level.
//!
//! Grants are incremental and never revoked. Each granted spell leaves a
//! [`GrantRecord`] so a later pass can prune records the character outgrew
//! downwards and restore spells the engine lost across a reconnect.

use std::sync::Arc;

use arcanum_domain::{
    CharacterId, ClassId, ClassLedger, DomainId, EffectiveLevels, GrantKey, GrantRecord,
    RuleRegistry, SpellId, MAX_SPELL_CIRCLE,
};

use super::error::CasterLevelError;
use crate::entities::{Character, GrantLedger};
use crate::infrastructure::ports::ClockPort;
use crate::infrastructure::spell_circle_cache::SpellCircleCache;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub pruned: usize,
    pub restored: usize,
    pub undecodable: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantReport {
    pub restore: RestoreReport,
    pub granted: Vec<GrantRecord>,
}

pub struct SpellGrantReconciler {
    character: Arc<Character>,
    ledger: Arc<GrantLedger>,
    cache: Arc<SpellCircleCache>,
    registry: Arc<RuleRegistry>,
    clock: Arc<dyn ClockPort>,
}

impl SpellGrantReconciler {
    pub fn new(
        character: Arc<Character>,
        ledger: Arc<GrantLedger>,
        cache: Arc<SpellCircleCache>,
        registry: Arc<RuleRegistry>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            character,
            ledger,
            cache,
            registry,
            clock,
        }
    }

    /// Restore, then grant for the given levels.
    pub async fn reconcile(
        &self,
        character_id: CharacterId,
        ledger: &ClassLedger,
        levels: &EffectiveLevels,
    ) -> Result<GrantReport, CasterLevelError> {
        if let Err(e) = self.cache.ensure_built().await {
            tracing::warn!(
                character_id = %character_id,
                error = %e,
                "Spell circle cache unavailable, granting nothing this pass"
            );
        }

        let domains = self.character.domains(character_id).await?;
        let restore = self.restore(character_id, ledger, &domains).await?;
        let granted = self.grant(character_id, ledger, levels, &domains).await?;
        Ok(GrantReport { restore, granted })
    }

    /// Prune outgrown records and re-grant spells the engine no longer lists.
    pub async fn restore(
        &self,
        character_id: CharacterId,
        ledger: &ClassLedger,
        domains: &[DomainId],
    ) -> Result<RestoreReport, CasterLevelError> {
        let stored = self.ledger.load(character_id).await?;
        let mut report = RestoreReport {
            undecodable: stored.undecodable.len(),
            ..RestoreReport::default()
        };

        for key in &stored.undecodable {
            tracing::warn!(
                character_id = %character_id,
                key = %key,
                "Deleting undecodable grant record"
            );
            self.ledger.delete(character_id, key).await?;
        }

        for record in stored.records {
            let actual = ledger.level(record.key.owner());
            if let Some(reason) = record.staleness(actual, domains) {
                self.ledger
                    .delete(character_id, &record.storage_key())
                    .await?;
                tracing::debug!(
                    character_id = %character_id,
                    key = %record.key,
                    spell_id = %record.spell_id,
                    reason = %reason,
                    "Pruned grant record"
                );
                report.pruned += 1;
                continue;
            }

            let owner = record.key.owner();
            if !self
                .character
                .knows_spell(character_id, owner, record.circle, record.spell_id)
                .await?
            {
                self.character
                    .learn_spell(character_id, owner, record.circle, record.spell_id)
                    .await?;
                tracing::info!(
                    character_id = %character_id,
                    key = %record.key,
                    spell_id = %record.spell_id,
                    "Restored granted spell"
                );
                report.restored += 1;
            }
        }

        Ok(report)
    }

    /// Grant class and domain spells for circles reachable only through effective level.
    pub async fn grant(
        &self,
        character_id: CharacterId,
        ledger: &ClassLedger,
        levels: &EffectiveLevels,
        domains: &[DomainId],
    ) -> Result<Vec<GrantRecord>, CasterLevelError> {
        let mut granted = Vec::new();

        for profile in self.registry.divine_casters() {
            let class = &profile.class;
            let actual = ledger.level(class);
            let effective = levels.effective(class);
            if actual == 0 || effective <= actual {
                continue;
            }
            let circles = profile.slots.newly_reachable(actual, effective);
            if circles.is_empty() {
                continue;
            }

            for circle in circles.clone() {
                for spell in self.cache.class_spells(class, circle) {
                    let key = GrantKey::class(class.clone());
                    if let Some(record) = self
                        .grant_one(character_id, key, circle, spell, actual)
                        .await?
                    {
                        granted.push(record);
                    }
                }
            }

            if !profile.has_domains {
                continue;
            }
            for domain in domains {
                for circle in circles.clone().filter(|c| (1..=MAX_SPELL_CIRCLE).contains(c)) {
                    let Some(spell) = self.cache.domain_spell(domain, circle) else {
                        continue;
                    };
                    let key = GrantKey::domain(class.clone(), domain.clone());
                    if let Some(record) = self
                        .grant_one(character_id, key, circle, spell, actual)
                        .await?
                    {
                        granted.push(record);
                    }
                }
            }
        }

        Ok(granted)
    }

    /// Teach one spell unless already known, recording the grant.
    async fn grant_one(
        &self,
        character_id: CharacterId,
        key: GrantKey,
        circle: u8,
        spell: SpellId,
        level_at_grant: u8,
    ) -> Result<Option<GrantRecord>, CasterLevelError> {
        let class: &ClassId = key.owner();
        if self
            .character
            .knows_spell(character_id, class, circle, spell)
            .await?
        {
            return Ok(None);
        }

        self.character
            .learn_spell(character_id, class, circle, spell)
            .await?;
        let record = GrantRecord {
            character_id,
            key,
            circle,
            spell_id: spell,
            level_at_grant,
            granted_at: self.clock.now(),
        };
        self.ledger.save(&record).await?;

        tracing::info!(
            character_id = %character_id,
            key = %record.key,
            circle,
            spell_id = %spell,
            level_at_grant,
            "Granted spell"
        );
        Ok(Some(record))
    }
}
