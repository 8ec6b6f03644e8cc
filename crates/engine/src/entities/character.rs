//! Character entity operations.

use std::sync::Arc;

use arcanum_domain::{CharacterId, ClassId, ClassLedger, DomainId, SpellId};

use crate::infrastructure::ports::{CharacterPort, PortError};

/// Character entity operations.
///
/// Reads class levels and domains fresh on every call; nothing is cached.
pub struct Character {
    port: Arc<dyn CharacterPort>,
}

impl Character {
    pub fn new(port: Arc<dyn CharacterPort>) -> Self {
        Self { port }
    }

    // =========================================================================
    // Class levels
    // =========================================================================

    /// Current `class -> actual level` snapshot.
    pub async fn ledger(&self, id: CharacterId) -> Result<ClassLedger, PortError> {
        Ok(self.port.class_levels(id).await?.into_iter().collect())
    }

    pub async fn domains(&self, id: CharacterId) -> Result<Vec<DomainId>, PortError> {
        self.port.domains(id).await
    }

    // =========================================================================
    // Spellbook
    // =========================================================================

    pub async fn known_spells(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
    ) -> Result<Vec<SpellId>, PortError> {
        self.port.known_spells(id, class, circle).await
    }

    pub async fn knows_spell(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
        spell: SpellId,
    ) -> Result<bool, PortError> {
        Ok(self.known_spells(id, class, circle).await?.contains(&spell))
    }

    pub async fn learn_spell(
        &self,
        id: CharacterId,
        class: &ClassId,
        circle: u8,
        spell: SpellId,
    ) -> Result<(), PortError> {
        self.port.learn_spell(id, class, circle, spell).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanum_domain::ClassLevel;

    use crate::infrastructure::ports::MockCharacterPort;

    #[tokio::test]
    async fn ledger_accumulates_class_entries() {
        let id = CharacterId::new();
        let mut port = MockCharacterPort::new();
        port.expect_class_levels()
            .withf(move |requested| *requested == id)
            .returning(|_| {
                Ok(vec![
                    ClassLevel::new("Cleric", 9),
                    ClassLevel::new("blackguard", 16),
                ])
            });

        let character = Character::new(Arc::new(port));
        let ledger = character.ledger(id).await.expect("ledger");

        assert_eq!(ledger.level(&ClassId::new("cleric")), 9);
        assert_eq!(ledger.level(&ClassId::new("blackguard")), 16);
    }

    #[tokio::test]
    async fn knows_spell_checks_the_circle_list() {
        let mut port = MockCharacterPort::new();
        port.expect_known_spells()
            .withf(|_, class, circle| class.as_str() == "cleric" && *circle == 6)
            .returning(|_, _, _| Ok(vec![SpellId::new(1), SpellId::new(4)]));

        let character = Character::new(Arc::new(port));
        let cleric = ClassId::new("cleric");
        let id = CharacterId::new();

        assert!(character
            .knows_spell(id, &cleric, 6, SpellId::new(4))
            .await
            .expect("known"));
        assert!(!character
            .knows_spell(id, &cleric, 6, SpellId::new(7))
            .await
            .expect("known"));
    }
}
