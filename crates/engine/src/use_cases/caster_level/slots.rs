//! Bonus spell slot delivery through the carrier item.
//!
//! Every pass replaces the carrier outright: sweep every carrier, recompute
//! the delta from fresh levels, build a new carrier, equip it last.

use std::sync::Arc;
use std::time::Duration;

use arcanum_domain::{
    calculate_effective_levels, BonusSlotProperty, CharacterId, ItemId, RuleRegistry, SlotDelta,
};

use super::error::CasterLevelError;
use crate::entities::{CarrierItems, Character};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// No class is owed bonus slots; no carrier is kept
    Cleared,
    Equipped { item: ItemId, properties: usize },
}

pub struct SpellSlotReconciler {
    pub(super) character: Arc<Character>,
    pub(super) carriers: Arc<CarrierItems>,
    registry: Arc<RuleRegistry>,
    settle_delay: Duration,
}

impl SpellSlotReconciler {
    pub fn new(
        character: Arc<Character>,
        carriers: Arc<CarrierItems>,
        registry: Arc<RuleRegistry>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            character,
            carriers,
            registry,
            settle_delay,
        }
    }

    /// Bonus slot properties the carrier should hold right now.
    pub async fn desired(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<BonusSlotProperty>, CasterLevelError> {
        let ledger = self
            .character
            .ledger(character_id)
            .await
            .map_err(|source| CasterLevelError::Ledger {
                character_id,
                source,
            })?;
        let levels = calculate_effective_levels(&self.registry, &ledger);
        Ok(SlotDelta::compute(&self.registry, &ledger, &levels).properties())
    }

    pub async fn reconcile(
        &self,
        character_id: CharacterId,
    ) -> Result<SlotOutcome, CasterLevelError> {
        let existing = self.carriers.find(character_id).await?;
        for carrier in &existing {
            self.carriers.destroy(carrier.id).await?;
            tracing::debug!(
                character_id = %character_id,
                item_id = %carrier.id,
                equipped = carrier.equipped,
                "Destroyed carrier"
            );
        }
        if !existing.is_empty() {
            self.settle().await;
        }

        let properties = self.desired(character_id).await?;
        if properties.is_empty() {
            return Ok(SlotOutcome::Cleared);
        }

        let item = self
            .carriers
            .create(character_id)
            .await
            .map_err(|source| CasterLevelError::CarrierBuild {
                stage: "create",
                source,
            })?;
        self.settle().await;

        for property in &properties {
            if let Err(source) = self.carriers.attach(item, property).await {
                self.discard(character_id, item).await;
                return Err(CasterLevelError::CarrierBuild {
                    stage: "attach",
                    source,
                });
            }
        }
        self.settle().await;

        if let Err(source) = self.carriers.equip(character_id, item).await {
            self.discard(character_id, item).await;
            return Err(CasterLevelError::CarrierBuild {
                stage: "equip",
                source,
            });
        }
        self.settle().await;

        tracing::info!(
            character_id = %character_id,
            item_id = %item,
            properties = properties.len(),
            "Carrier equipped"
        );
        Ok(SlotOutcome::Equipped {
            item,
            properties: properties.len(),
        })
    }

    /// Destroy a half-built carrier. Failure is logged; verification will sweep it.
    async fn discard(&self, character_id: CharacterId, item: ItemId) {
        if let Err(e) = self.carriers.destroy(item).await {
            tracing::warn!(
                character_id = %character_id,
                item_id = %item,
                error = %e,
                "Failed to destroy partial carrier"
            );
        }
    }

    pub(super) async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }
}
