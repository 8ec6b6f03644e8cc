//! Persisted markers for spells granted because of an effective level jump.
//!
//! Records are stored as character-scoped attributes. The attribute key
//! identifies the grant (`arcanum:grant:class:cleric:118`), the value holds the
//! serialized record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ClassId, DomainId, SpellId};

/// Attribute key prefix shared by every grant record.
pub const GRANT_KEY_PREFIX: &str = "arcanum:grant:";

/// What a spell was granted through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantKey {
    /// The class spell list at a newly reachable circle
    Class { class: ClassId },
    /// A domain spell learned through a domain-bearing class
    Domain { class: ClassId, domain: DomainId },
}

impl GrantKey {
    pub fn class(class: impl Into<ClassId>) -> Self {
        GrantKey::Class {
            class: class.into(),
        }
    }

    pub fn domain(class: impl Into<ClassId>, domain: impl Into<DomainId>) -> Self {
        GrantKey::Domain {
            class: class.into(),
            domain: domain.into(),
        }
    }

    /// The class whose actual level the grant is checked against.
    pub fn owner(&self) -> &ClassId {
        match self {
            GrantKey::Class { class } | GrantKey::Domain { class, .. } => class,
        }
    }

    pub fn domain_id(&self) -> Option<&DomainId> {
        match self {
            GrantKey::Class { .. } => None,
            GrantKey::Domain { domain, .. } => Some(domain),
        }
    }

    /// Attribute key of a grant of `spell_id` under this key.
    pub fn storage_key(&self, spell_id: SpellId) -> String {
        format!("{GRANT_KEY_PREFIX}{self}:{spell_id}")
    }
}

impl fmt::Display for GrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantKey::Class { class } => write!(f, "class:{class}"),
            GrantKey::Domain { class, domain } => write!(f, "domain:{class}:{domain}"),
        }
    }
}

/// Why a record no longer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// The owning class dropped below the level the spell was granted at
    LevelDropped { level_at_grant: u8, actual: u8 },
    /// The character no longer holds the domain
    DomainLost,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::LevelDropped {
                level_at_grant,
                actual,
            } => write!(f, "granted at level {level_at_grant}, now {actual}"),
            Staleness::DomainLost => f.write_str("domain no longer held"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub character_id: CharacterId,
    pub key: GrantKey,
    pub circle: u8,
    pub spell_id: SpellId,
    /// Actual level of the owning class when the spell was granted
    pub level_at_grant: u8,
    pub granted_at: DateTime<Utc>,
}

impl GrantRecord {
    pub fn storage_key(&self) -> String {
        self.key.storage_key(self.spell_id)
    }

    /// Check the record against the character's current state.
    pub fn staleness(&self, actual: u8, held_domains: &[DomainId]) -> Option<Staleness> {
        if let Some(domain) = self.key.domain_id() {
            if !held_domains.contains(domain) {
                return Some(Staleness::DomainLost);
            }
        }
        if self.level_at_grant > actual {
            return Some(Staleness::LevelDropped {
                level_at_grant: self.level_at_grant,
                actual,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: GrantKey, level_at_grant: u8) -> GrantRecord {
        GrantRecord {
            character_id: CharacterId::new(),
            key,
            circle: 7,
            spell_id: SpellId::new(118),
            level_at_grant,
            granted_at: Utc::now(),
        }
    }

    #[test]
    fn storage_keys_share_prefix() {
        let class = record(GrantKey::class("Cleric"), 9);
        let domain = record(GrantKey::domain("cleric", "War"), 9);

        assert_eq!(class.storage_key(), "arcanum:grant:class:cleric:118");
        assert_eq!(domain.storage_key(), "arcanum:grant:domain:cleric:war:118");
        assert!(domain.storage_key().starts_with(GRANT_KEY_PREFIX));
    }

    #[test]
    fn record_is_stale_below_grant_level() {
        let record = record(GrantKey::class("cleric"), 9);

        assert_eq!(record.staleness(9, &[]), None);
        assert_eq!(record.staleness(12, &[]), None);
        assert_eq!(
            record.staleness(8, &[]),
            Some(Staleness::LevelDropped {
                level_at_grant: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn domain_record_is_stale_without_domain() {
        let record = record(GrantKey::domain("cleric", "war"), 9);

        assert_eq!(record.staleness(9, &[DomainId::new("war")]), None);
        assert_eq!(
            record.staleness(9, &[DomainId::new("sun")]),
            Some(Staleness::DomainLost)
        );
    }

    #[test]
    fn key_owner_is_the_class() {
        assert_eq!(
            GrantKey::domain("cleric", "war").owner(),
            &ClassId::new("cleric")
        );
        assert!(GrantKey::class("druid").domain_id().is_none());
    }
}
