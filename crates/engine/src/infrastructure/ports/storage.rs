//! Persistent storage and static data port traits.

use arcanum_domain::CharacterId;
use async_trait::async_trait;

use super::error::PortError;
use crate::infrastructure::two_da::TwoDaTable;

/// String attributes persisted on the character and surviving reconnects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeStore: Send + Sync {
    async fn get(&self, owner: CharacterId, key: &str) -> Result<Option<String>, PortError>;
    async fn set(&self, owner: CharacterId, key: &str, value: &str) -> Result<(), PortError>;
    async fn delete(&self, owner: CharacterId, key: &str) -> Result<(), PortError>;
    async fn keys_with_prefix(
        &self,
        owner: CharacterId,
        prefix: &str,
    ) -> Result<Vec<String>, PortError>;
}

/// Read-only rule tables (`spells`, `domains`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaticDataPort: Send + Sync {
    async fn load_table(&self, name: &str) -> Result<TwoDaTable, PortError>;
}
