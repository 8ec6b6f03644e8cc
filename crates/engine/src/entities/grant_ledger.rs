//! Grant record persistence.

use std::sync::Arc;

use arcanum_domain::{CharacterId, GrantRecord, GRANT_KEY_PREFIX};

use crate::infrastructure::ports::{AttributeStore, PortError};

/// Records read back from character attributes.
#[derive(Debug, Default)]
pub struct StoredGrants {
    pub records: Vec<GrantRecord>,
    /// Keys whose value could not be decoded or does not match its key
    pub undecodable: Vec<String>,
}

/// Grant record operations over character-scoped attributes.
pub struct GrantLedger {
    store: Arc<dyn AttributeStore>,
}

impl GrantLedger {
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, owner: CharacterId) -> Result<StoredGrants, PortError> {
        let mut stored = StoredGrants::default();
        for key in self.store.keys_with_prefix(owner, GRANT_KEY_PREFIX).await? {
            let Some(value) = self.store.get(owner, &key).await? else {
                continue;
            };
            match serde_json::from_str::<GrantRecord>(&value) {
                Ok(record) if record.character_id == owner && record.storage_key() == key => {
                    stored.records.push(record)
                }
                _ => stored.undecodable.push(key),
            }
        }
        Ok(stored)
    }

    pub async fn save(&self, record: &GrantRecord) -> Result<(), PortError> {
        let value = serde_json::to_string(record).map_err(PortError::serialization)?;
        self.store
            .set(record.character_id, &record.storage_key(), &value)
            .await
    }

    pub async fn delete(&self, owner: CharacterId, key: &str) -> Result<(), PortError> {
        self.store.delete(owner, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanum_domain::{GrantKey, SpellId};
    use chrono::{TimeZone, Utc};

    use crate::infrastructure::memory::InMemoryWorld;

    fn record(owner: CharacterId) -> GrantRecord {
        GrantRecord {
            character_id: owner,
            key: GrantKey::class("cleric"),
            circle: 6,
            spell_id: SpellId::new(12),
            level_at_grant: 9,
            granted_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid date"),
        }
    }

    #[tokio::test]
    async fn saved_records_load_back() {
        let world = Arc::new(InMemoryWorld::new());
        let owner = CharacterId::new();
        world.add_character(owner, [], []).await;
        let ledger = GrantLedger::new(world.clone());

        ledger.save(&record(owner)).await.expect("save");
        let stored = ledger.load(owner).await.expect("load");

        assert_eq!(stored.records, vec![record(owner)]);
        assert!(stored.undecodable.is_empty());
    }

    #[tokio::test]
    async fn garbage_values_are_reported() {
        let world = Arc::new(InMemoryWorld::new());
        let owner = CharacterId::new();
        world.add_character(owner, [], []).await;
        let key = format!("{GRANT_KEY_PREFIX}class:cleric:99");
        world.set(owner, &key, "{not json").await.expect("set");
        // A valid record stored under the wrong key
        let misplaced = serde_json::to_string(&record(owner)).expect("encode");
        let wrong_key = format!("{GRANT_KEY_PREFIX}class:druid:12");
        world.set(owner, &wrong_key, &misplaced).await.expect("set");

        let stored = GrantLedger::new(world.clone())
            .load(owner)
            .await
            .expect("load");

        assert!(stored.records.is_empty());
        assert_eq!(stored.undecodable.len(), 2);
    }
}
