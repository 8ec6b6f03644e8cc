//! In-memory game engine adapter.
//!
//! Implements every engine and storage port over plain maps. Backs the replay
//! binary and the reconciler tests, with switches to inject engine failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use arcanum_domain::{
    BonusSlotProperty, CharacterId, ClassId, ClassLevel, DomainId, InventoryItem, ItemId,
    ItemTemplate, SpellId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{
    AttributeStore, CasterOverridePort, CharacterPort, ItemPort, PortError, StaticDataPort,
};
use crate::infrastructure::two_da::TwoDaTable;

#[derive(Debug, Default)]
struct CharacterState {
    classes: BTreeMap<ClassId, u8>,
    domains: Vec<DomainId>,
    known: BTreeMap<(ClassId, u8), Vec<SpellId>>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub tag: String,
    pub equipped: bool,
    pub properties: Vec<BonusSlotProperty>,
}

#[derive(Debug)]
struct ItemState {
    owner: CharacterId,
    tag: String,
    equipped: bool,
    properties: Vec<BonusSlotProperty>,
    /// Creation order, so inventories list oldest first
    seq: usize,
}

#[derive(Default)]
pub struct InMemoryWorld {
    characters: Mutex<HashMap<CharacterId, CharacterState>>,
    items: Mutex<HashMap<ItemId, ItemState>>,
    overrides: DashMap<(CharacterId, ClassId), u8>,
    next_seq: AtomicUsize,
    created: AtomicUsize,
    fail_bonus_slots: AtomicBool,
    fail_equip: AtomicBool,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // World setup
    // =========================================================================

    pub async fn add_character(
        &self,
        id: CharacterId,
        classes: impl IntoIterator<Item = ClassLevel>,
        domains: impl IntoIterator<Item = DomainId>,
    ) {
        let mut state = CharacterState::default();
        for entry in classes {
            state
                .classes
                .insert(entry.class_id().clone(), entry.level());
        }
        state.domains = domains.into_iter().collect();
        self.characters.lock().await.insert(id, state);
    }

    /// Set a class level directly, as a level up or level down would.
    pub async fn set_class_level(&self, id: CharacterId, class: impl Into<ClassId>, level: u8) {
        if let Some(state) = self.characters.lock().await.get_mut(&id) {
            state.classes.insert(class.into(), level);
        }
    }

    pub async fn set_domains(&self, id: CharacterId, domains: Vec<DomainId>) {
        if let Some(state) = self.characters.lock().await.get_mut(&id) {
            state.domains = domains;
        }
    }

    /// Drop every known spell, as an engine that does not persist learned
    /// spells would on reconnect.
    pub async fn forget_spells(&self, id: CharacterId) {
        if let Some(state) = self.characters.lock().await.get_mut(&id) {
            state.known.clear();
        }
    }

    /// Place an arbitrary item in an inventory, bypassing the reconcilers.
    pub async fn spawn_item(
        &self,
        owner: CharacterId,
        tag: &str,
        equipped: bool,
        properties: Vec<BonusSlotProperty>,
    ) -> ItemId {
        let id = ItemId::new();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.items.lock().await.insert(
            id,
            ItemState {
                owner,
                tag: tag.to_string(),
                equipped,
                properties,
                seq,
            },
        );
        id
    }

    pub async fn unequip(&self, item: ItemId) {
        if let Some(state) = self.items.lock().await.get_mut(&item) {
            state.equipped = false;
        }
    }

    pub fn fail_bonus_slots(&self, fail: bool) {
        self.fail_bonus_slots.store(fail, Ordering::SeqCst);
    }

    pub fn fail_equip(&self, fail: bool) {
        self.fail_equip.store(fail, Ordering::SeqCst);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub async fn items_of(&self, owner: CharacterId) -> Vec<ItemSnapshot> {
        let items = self.items.lock().await;
        let mut owned: Vec<(&ItemId, &ItemState)> =
            items.iter().filter(|(_, s)| s.owner == owner).collect();
        owned.sort_by_key(|(_, s)| s.seq);
        owned
            .into_iter()
            .map(|(id, s)| ItemSnapshot {
                id: *id,
                tag: s.tag.clone(),
                equipped: s.equipped,
                properties: s.properties.clone(),
            })
            .collect()
    }

    /// Number of items created through [`ItemPort::create_item`].
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub async fn knows(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
        spell: SpellId,
    ) -> bool {
        self.characters
            .lock()
            .await
            .get(&id)
            .and_then(|s| s.known.get(&(class.clone(), circle)))
            .is_some_and(|spells| spells.contains(&spell))
    }

    pub fn override_level(&self, id: CharacterId, class: &ClassId) -> Option<u8> {
        self.overrides.get(&(id, class.clone())).map(|level| *level)
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

fn character_not_found(id: CharacterId) -> PortError {
    PortError::not_found("Character", id)
}

fn item_not_found(id: ItemId) -> PortError {
    PortError::not_found("Item", id)
}

#[async_trait]
impl CharacterPort for InMemoryWorld {
    async fn class_levels(&self, id: CharacterId) -> Result<Vec<ClassLevel>, PortError> {
        let characters = self.characters.lock().await;
        let state = characters.get(&id).ok_or_else(|| character_not_found(id))?;
        Ok(state
            .classes
            .iter()
            .map(|(class, level)| ClassLevel::new(class.clone(), *level))
            .collect())
    }

    async fn domains(&self, id: CharacterId) -> Result<Vec<DomainId>, PortError> {
        let characters = self.characters.lock().await;
        let state = characters.get(&id).ok_or_else(|| character_not_found(id))?;
        Ok(state.domains.clone())
    }

    async fn known_spells(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
    ) -> Result<Vec<SpellId>, PortError> {
        let characters = self.characters.lock().await;
        let state = characters.get(&id).ok_or_else(|| character_not_found(id))?;
        Ok(state
            .known
            .get(&(class.clone(), circle))
            .cloned()
            .unwrap_or_default())
    }

    async fn learn_spell(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
        spell: SpellId,
    ) -> Result<(), PortError> {
        let mut characters = self.characters.lock().await;
        let state = characters
            .get_mut(&id)
            .ok_or_else(|| character_not_found(id))?;
        let known = state.known.entry((class.clone(), circle)).or_default();
        if !known.contains(&spell) {
            known.push(spell);
        }
        Ok(())
    }
}

#[async_trait]
impl ItemPort for InMemoryWorld {
    async fn inventory(&self, owner: CharacterId) -> Result<Vec<InventoryItem>, PortError> {
        Ok(self
            .items_of(owner)
            .await
            .into_iter()
            .map(|s| InventoryItem {
                id: s.id,
                tag: s.tag,
                equipped: s.equipped,
            })
            .collect())
    }

    async fn create_item(
        &self,
        owner: CharacterId,
        template: &ItemTemplate,
    ) -> Result<ItemId, PortError> {
        if !self.characters.lock().await.contains_key(&owner) {
            return Err(character_not_found(owner));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .spawn_item(owner, &template.tag, false, Vec::new())
            .await)
    }

    async fn destroy(&self, item: ItemId) -> Result<(), PortError> {
        self.items
            .lock()
            .await
            .remove(&item)
            .map(|_| ())
            .ok_or_else(|| item_not_found(item))
    }

    async fn equip(&self, owner: CharacterId, item: ItemId) -> Result<(), PortError> {
        if self.fail_equip.load(Ordering::SeqCst) {
            return Err(PortError::engine("equip", "equipment slot unavailable"));
        }
        let mut items = self.items.lock().await;
        let state = items.get_mut(&item).ok_or_else(|| item_not_found(item))?;
        if state.owner != owner {
            return Err(PortError::engine("equip", "item belongs to another character"));
        }
        state.equipped = true;
        Ok(())
    }

    async fn add_bonus_slot(
        &self,
        item: ItemId,
        property: &BonusSlotProperty,
    ) -> Result<(), PortError> {
        if self.fail_bonus_slots.load(Ordering::SeqCst) {
            return Err(PortError::engine("add_bonus_slot", "property rejected"));
        }
        let mut items = self.items.lock().await;
        let state = items.get_mut(&item).ok_or_else(|| item_not_found(item))?;
        state.properties.push(property.clone());
        Ok(())
    }

    async fn bonus_slots(&self, item: ItemId) -> Result<Vec<BonusSlotProperty>, PortError> {
        let items = self.items.lock().await;
        let state = items.get(&item).ok_or_else(|| item_not_found(item))?;
        Ok(state.properties.clone())
    }
}

#[async_trait]
impl AttributeStore for InMemoryWorld {
    async fn get(&self, owner: CharacterId, key: &str) -> Result<Option<String>, PortError> {
        let characters = self.characters.lock().await;
        let state = characters
            .get(&owner)
            .ok_or_else(|| character_not_found(owner))?;
        Ok(state.attributes.get(key).cloned())
    }

    async fn set(&self, owner: CharacterId, key: &str, value: &str) -> Result<(), PortError> {
        let mut characters = self.characters.lock().await;
        let state = characters
            .get_mut(&owner)
            .ok_or_else(|| character_not_found(owner))?;
        state.attributes.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, owner: CharacterId, key: &str) -> Result<(), PortError> {
        let mut characters = self.characters.lock().await;
        let state = characters
            .get_mut(&owner)
            .ok_or_else(|| character_not_found(owner))?;
        state.attributes.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(
        &self,
        owner: CharacterId,
        prefix: &str,
    ) -> Result<Vec<String>, PortError> {
        let characters = self.characters.lock().await;
        let state = characters
            .get(&owner)
            .ok_or_else(|| character_not_found(owner))?;
        Ok(state
            .attributes
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

impl CasterOverridePort for InMemoryWorld {
    fn install(&self, character: CharacterId, class: &ClassId, level: u8) -> Result<(), PortError> {
        self.overrides.insert((character, class.clone()), level);
        Ok(())
    }

    fn clear(&self, character: CharacterId, class: &ClassId) {
        self.overrides.remove(&(character, class.clone()));
    }
}

/// Static data held in memory, keyed by table name.
#[derive(Default)]
pub struct InMemoryStaticData {
    tables: HashMap<String, TwoDaTable>,
}

impl InMemoryStaticData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: TwoDaTable) -> Self {
        self.tables.insert(name.to_ascii_lowercase(), table);
        self
    }
}

#[async_trait]
impl StaticDataPort for InMemoryStaticData {
    async fn load_table(&self, name: &str) -> Result<TwoDaTable, PortError> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| PortError::not_found("2DA table", name))
    }
}
