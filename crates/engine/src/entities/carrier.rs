//! Slot carrier item operations.

use std::sync::Arc;

use arcanum_domain::{BonusSlotProperty, CharacterId, InventoryItem, ItemId, ItemTemplate};

use crate::infrastructure::ports::{ItemPort, PortError};

/// Carrier item operations.
///
/// Only items tagged as carriers are ever touched.
pub struct CarrierItems {
    items: Arc<dyn ItemPort>,
}

impl CarrierItems {
    pub fn new(items: Arc<dyn ItemPort>) -> Self {
        Self { items }
    }

    /// Every carrier in the inventory, equipped or loose.
    pub async fn find(&self, owner: CharacterId) -> Result<Vec<InventoryItem>, PortError> {
        Ok(self
            .items
            .inventory(owner)
            .await?
            .into_iter()
            .filter(InventoryItem::is_carrier)
            .collect())
    }

    /// Create an empty, unequipped carrier.
    pub async fn create(&self, owner: CharacterId) -> Result<ItemId, PortError> {
        self.items.create_item(owner, &ItemTemplate::carrier()).await
    }

    pub async fn attach(
        &self,
        item: ItemId,
        property: &BonusSlotProperty,
    ) -> Result<(), PortError> {
        self.items.add_bonus_slot(item, property).await
    }

    pub async fn properties(&self, item: ItemId) -> Result<Vec<BonusSlotProperty>, PortError> {
        self.items.bonus_slots(item).await
    }

    pub async fn equip(&self, owner: CharacterId, item: ItemId) -> Result<(), PortError> {
        self.items.equip(owner, item).await
    }

    pub async fn destroy(&self, item: ItemId) -> Result<(), PortError> {
        self.items.destroy(item).await
    }
}
