//! Deferred carrier verification.
//!
//! Runs a short while after a pass and repairs what the engine may have left
//! inconsistent: duplicates are destroyed, an unequipped carrier is equipped
//! again, and anything else triggers a full slot pass.

use arcanum_domain::{carrier::normalized, CharacterId, InventoryItem, ItemId};

use super::error::CasterLevelError;
use super::slots::SpellSlotReconciler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrierAnomaly {
    Duplicate { removed: ItemId },
    Unequipped { item: ItemId },
    Missing,
    Unneeded,
    PropertyMismatch { item: ItemId },
}

impl CarrierAnomaly {
    fn needs_rebuild(&self) -> bool {
        matches!(
            self,
            CarrierAnomaly::Missing
                | CarrierAnomaly::Unneeded
                | CarrierAnomaly::PropertyMismatch { .. }
        )
    }
}

/// Keep the first equipped carrier, or the first one if none is equipped.
fn split_keeper(mut carriers: Vec<InventoryItem>) -> (Option<InventoryItem>, Vec<InventoryItem>) {
    let index = carriers
        .iter()
        .position(|c| c.equipped)
        .unwrap_or(0);
    if carriers.is_empty() {
        return (None, carriers);
    }
    let keeper = carriers.remove(index);
    (Some(keeper), carriers)
}

impl SpellSlotReconciler {
    /// Check the carrier against fresh levels and repair it. Returns what was found.
    pub async fn verify(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CarrierAnomaly>, CasterLevelError> {
        let desired = self.desired(character_id).await?;
        let carriers = self.carriers.find(character_id).await?;
        let mut anomalies = Vec::new();

        if desired.is_empty() {
            if !carriers.is_empty() {
                anomalies.push(CarrierAnomaly::Unneeded);
            }
        } else {
            let (keeper, extras) = split_keeper(carriers);
            for extra in extras {
                self.carriers.destroy(extra.id).await?;
                anomalies.push(CarrierAnomaly::Duplicate { removed: extra.id });
            }

            match keeper {
                None => anomalies.push(CarrierAnomaly::Missing),
                Some(keeper) => {
                    let actual = self.carriers.properties(keeper.id).await?;
                    if normalized(&actual) != normalized(&desired) {
                        anomalies.push(CarrierAnomaly::PropertyMismatch { item: keeper.id });
                    } else if !keeper.equipped {
                        self.carriers.equip(character_id, keeper.id).await?;
                        self.settle().await;
                        anomalies.push(CarrierAnomaly::Unequipped { item: keeper.id });
                    }
                }
            }
        }

        for anomaly in &anomalies {
            tracing::warn!(
                character_id = %character_id,
                anomaly = ?anomaly,
                "Carrier anomaly corrected"
            );
        }
        if anomalies.iter().any(CarrierAnomaly::needs_rebuild) {
            self.reconcile(character_id).await?;
        }
        Ok(anomalies)
    }
}
