//! Transient caster level overrides while a spell resolves.

use std::future::Future;
use std::sync::Arc;

use arcanum_domain::{calculate_effective_levels, CharacterId, ClassId, RuleRegistry};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::error::CasterLevelError;
use crate::entities::Character;
use crate::infrastructure::ports::CasterOverridePort;

/// Open scopes per (character, class). The engine override is cleared only
/// when the last scope holding it ends.
type ScopeCounts = DashMap<(CharacterId, ClassId), usize>;

/// Overrides installed for one character. Every override is released on drop.
pub struct OverrideGuard {
    port: Arc<dyn CasterOverridePort>,
    scopes: Arc<ScopeCounts>,
    character_id: CharacterId,
    installed: Vec<(ClassId, u8)>,
}

impl OverrideGuard {
    /// Classes overridden, with the level installed.
    pub fn installed(&self) -> &[(ClassId, u8)] {
        &self.installed
    }

    /// Release explicitly. Equivalent to dropping the guard.
    pub fn end(self) {}
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        for (class, _) in self.installed.drain(..) {
            // The entry lock is held across `clear` so a concurrent install
            // for the same class cannot slip in between.
            if let Entry::Occupied(mut entry) = self.scopes.entry((self.character_id, class)) {
                if *entry.get() > 1 {
                    *entry.get_mut() -= 1;
                } else {
                    self.port.clear(self.character_id, &entry.key().1);
                    entry.remove();
                }
            }
        }
    }
}

pub struct CasterOverrideReconciler {
    character: Arc<Character>,
    registry: Arc<RuleRegistry>,
    port: Arc<dyn CasterOverridePort>,
    scopes: Arc<ScopeCounts>,
}

impl CasterOverrideReconciler {
    pub fn new(
        character: Arc<Character>,
        registry: Arc<RuleRegistry>,
        port: Arc<dyn CasterOverridePort>,
    ) -> Self {
        Self {
            character,
            registry,
            port,
            scopes: Arc::new(DashMap::new()),
        }
    }

    /// Install effective levels for every overridable class the character
    /// actually has levels in and that is boosted.
    pub async fn begin(
        &self,
        character_id: CharacterId,
    ) -> Result<OverrideGuard, CasterLevelError> {
        let ledger = self
            .character
            .ledger(character_id)
            .await
            .map_err(|source| CasterLevelError::Ledger {
                character_id,
                source,
            })?;
        let levels = calculate_effective_levels(&self.registry, &ledger);

        let mut guard = OverrideGuard {
            port: self.port.clone(),
            scopes: self.scopes.clone(),
            character_id,
            installed: Vec::new(),
        };
        for (class, level) in levels.boosted() {
            let overridable = self
                .registry
                .caster(class)
                .is_some_and(|profile| profile.overridable);
            if !overridable || level.actual == 0 {
                continue;
            }
            // On error the guard drops here and releases what was installed.
            self.acquire(character_id, class, level.effective())?;
            guard.installed.push((class.clone(), level.effective()));
        }

        if !guard.installed.is_empty() {
            tracing::debug!(
                character_id = %character_id,
                overrides = guard.installed.len(),
                "Caster level overrides installed"
            );
        }
        Ok(guard)
    }

    /// Install `level` and count one more open scope for the class. An
    /// overlapping scope re-installs, so the latest ledger wins.
    fn acquire(
        &self,
        character_id: CharacterId,
        class: &ClassId,
        level: u8,
    ) -> Result<(), CasterLevelError> {
        let key = (character_id, class.clone());
        let result = {
            let mut count = self.scopes.entry(key.clone()).or_insert(0);
            let result = self.port.install(character_id, class, level);
            if result.is_ok() {
                *count += 1;
            }
            result
        };
        if result.is_err() {
            self.scopes.remove_if(&key, |_, count| *count == 0);
        }
        Ok(result?)
    }

    /// Run `cast` with overrides in place, releasing them however it exits.
    pub async fn with_override<F, Fut, T>(
        &self,
        character_id: CharacterId,
        cast: F,
    ) -> Result<T, CasterLevelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.begin(character_id).await?;
        let result = cast().await;
        guard.end();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanum_domain::{classes, ClassLevel};
    use mockall::predicate::eq;

    use crate::infrastructure::memory::InMemoryWorld;
    use crate::infrastructure::ports::{MockCasterOverridePort, MockCharacterPort, PortError};

    async fn world_with(classes: Vec<ClassLevel>) -> (Arc<InMemoryWorld>, CharacterId) {
        let world = Arc::new(InMemoryWorld::new());
        let id = CharacterId::new();
        world.add_character(id, classes, []).await;
        (world, id)
    }

    fn reconciler(world: &Arc<InMemoryWorld>) -> CasterOverrideReconciler {
        CasterOverrideReconciler::new(
            Arc::new(Character::new(world.clone())),
            Arc::new(RuleRegistry::standard()),
            world.clone(),
        )
    }

    #[tokio::test]
    async fn overrides_boosted_classes_for_the_scope() {
        let (world, id) = world_with(vec![
            ClassLevel::new(classes::CLERIC, 9),
            ClassLevel::new(classes::BLACKGUARD, 16),
        ])
        .await;
        let reconciler = reconciler(&world);
        let cleric = ClassId::new(classes::CLERIC);

        let seen = reconciler
            .with_override(id, || async { world.override_level(id, &cleric) })
            .await
            .expect("cast");

        assert_eq!(seen, Some(20));
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn nothing_installed_without_boost() {
        let (world, id) = world_with(vec![ClassLevel::new(classes::WIZARD, 12)]).await;
        let guard = reconciler(&world).begin(id).await.expect("begin");

        assert!(guard.installed().is_empty());
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn fallback_targets_are_never_overridden() {
        let (world, id) = world_with(vec![
            ClassLevel::new("rogue", 10),
            ClassLevel::new(classes::PALE_MASTER, 3),
            ClassLevel::new(classes::ASSASSIN, 10),
        ])
        .await;
        let guard = reconciler(&world).begin(id).await.expect("begin");

        assert!(guard.installed().is_empty());
    }

    #[tokio::test]
    async fn released_when_the_cast_panics() {
        let (world, id) = world_with(vec![
            ClassLevel::new(classes::WIZARD, 10),
            ClassLevel::new(classes::PALE_MASTER, 10),
        ])
        .await;
        let reconciler = Arc::new(reconciler(&world));

        let task = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                reconciler
                    .with_override(id, || async { panic!("spell script failed") })
                    .await
            })
        };

        assert!(task.await.is_err());
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn overlapping_casts_keep_override_until_last_scope_ends() {
        let (world, id) = world_with(vec![
            ClassLevel::new(classes::CLERIC, 9),
            ClassLevel::new(classes::BLACKGUARD, 16),
        ])
        .await;
        let reconciler = reconciler(&world);
        let cleric = ClassId::new(classes::CLERIC);

        let first = reconciler.begin(id).await.expect("first cast");
        let second = reconciler.begin(id).await.expect("second cast");

        first.end();
        assert_eq!(world.override_level(id, &cleric), Some(20));

        second.end();
        assert_eq!(world.override_level(id, &cleric), None);
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn scopes_are_counted_per_character() {
        let world = Arc::new(InMemoryWorld::new());
        let (a, b) = (CharacterId::new(), CharacterId::new());
        for id in [a, b] {
            world
                .add_character(
                    id,
                    [
                        ClassLevel::new(classes::CLERIC, 9),
                        ClassLevel::new(classes::BLACKGUARD, 16),
                    ],
                    [],
                )
                .await;
        }
        let reconciler = reconciler(&world);
        let cleric = ClassId::new(classes::CLERIC);

        let first = reconciler.begin(a).await.expect("cast a");
        let second = reconciler.begin(b).await.expect("cast b");
        drop(first);

        assert_eq!(world.override_level(a, &cleric), None);
        assert_eq!(world.override_level(b, &cleric), Some(20));
        drop(second);
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn partial_install_is_rolled_back() {
        let id = CharacterId::new();
        let mut characters = MockCharacterPort::new();
        characters.expect_class_levels().returning(|_| {
            Ok(vec![
                ClassLevel::new(classes::CLERIC, 9),
                ClassLevel::new(classes::BLACKGUARD, 16),
                ClassLevel::new(classes::WIZARD, 10),
                ClassLevel::new(classes::PALE_MASTER, 10),
            ])
        });

        let mut port = MockCasterOverridePort::new();
        // Boosted classes are visited in class order: cleric, then wizard.
        port.expect_install()
            .withf(|_, class, level| class.as_str() == classes::CLERIC && *level == 20)
            .times(1)
            .returning(|_, _, _| Ok(()));
        port.expect_install()
            .withf(|_, class, _| class.as_str() == classes::WIZARD)
            .times(1)
            .returning(|_, _, _| Err(PortError::engine("install", "rejected")));
        port.expect_clear()
            .with(eq(id), eq(ClassId::new(classes::CLERIC)))
            .times(1)
            .return_const(());

        let reconciler = CasterOverrideReconciler::new(
            Arc::new(Character::new(Arc::new(characters))),
            Arc::new(RuleRegistry::standard()),
            Arc::new(port),
        );

        let result = reconciler.begin(id).await;
        assert!(matches!(result, Err(CasterLevelError::Port(_))));
    }
}
