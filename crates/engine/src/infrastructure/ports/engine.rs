//! Game engine port traits: character sheet, inventory, caster level overrides.

use arcanum_domain::{
    BonusSlotProperty, CharacterId, ClassId, ClassLevel, DomainId, InventoryItem, ItemId,
    ItemTemplate, SpellId,
};
use async_trait::async_trait;

use super::error::PortError;

// =============================================================================
// Character Sheet
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterPort: Send + Sync {
    async fn class_levels(&self, id: CharacterId) -> Result<Vec<ClassLevel>, PortError>;
    async fn domains(&self, id: CharacterId) -> Result<Vec<DomainId>, PortError>;

    // Spellbook
    async fn known_spells(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
    ) -> Result<Vec<SpellId>, PortError>;
    async fn learn_spell(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
        spell: SpellId,
    ) -> Result<(), PortError>;
}

// =============================================================================
// Inventory
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemPort: Send + Sync {
    /// Every item the character carries, with its equipped flag.
    async fn inventory(&self, owner: CharacterId) -> Result<Vec<InventoryItem>, PortError>;
    async fn create_item(
        &self,
        owner: CharacterId,
        template: &ItemTemplate,
    ) -> Result<ItemId, PortError>;
    async fn destroy(&self, item: ItemId) -> Result<(), PortError>;
    async fn equip(&self, owner: CharacterId, item: ItemId) -> Result<(), PortError>;

    // Item properties
    async fn add_bonus_slot(
        &self,
        item: ItemId,
        property: &BonusSlotProperty,
    ) -> Result<(), PortError>;
    async fn bonus_slots(&self, item: ItemId) -> Result<Vec<BonusSlotProperty>, PortError>;
}

// =============================================================================
// Caster Level Override
// =============================================================================

/// Per-class caster level override read by the engine while a spell resolves.
///
/// Synchronous so a scope guard can release it from `Drop`.
#[cfg_attr(test, mockall::automock)]
pub trait CasterOverridePort: Send + Sync {
    fn install(&self, character: CharacterId, class: &ClassId, level: u8) -> Result<(), PortError>;
    fn clear(&self, character: CharacterId, class: &ClassId);
}
