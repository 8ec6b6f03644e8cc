//! Effective caster level use cases.
//!
//! Lifecycle events (login, level up, level down) schedule a reconciliation
//! pass per character. A pass reads fresh class levels, restores and grants
//! known spells, then replaces the slot carrier. Spell casts only install a
//! scoped caster level override.

mod error;
mod grants;
mod locks;
mod override_scope;
mod slots;
mod verify;

pub use error::CasterLevelError;
pub use grants::{GrantReport, RestoreReport, SpellGrantReconciler};
pub use locks::{PassGuard, ReconciliationLocks};
pub use override_scope::{CasterOverrideReconciler, OverrideGuard};
pub use slots::{SlotOutcome, SpellSlotReconciler};
pub use verify::CarrierAnomaly;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arcanum_domain::{calculate_effective_levels, CharacterId, EffectiveLevels, RuleRegistry};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::entities::Character;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Login,
    LevelUp,
    LevelDown,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::Login => write!(f, "login"),
            LifecycleEvent::LevelUp => write!(f, "level_up"),
            LifecycleEvent::LevelDown => write!(f, "level_down"),
        }
    }
}

/// What happened to a trigger.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// A pass was started; the handle resolves when it and any follow-ups finish
    Started(JoinHandle<()>),
    /// A pass was already running; it will run one more pass before releasing
    Deferred,
}

/// Result of one full pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub levels: EffectiveLevels,
    pub grants: GrantReport,
    pub slots: SlotOutcome,
}

/// Schedules and runs reconciliation passes.
#[derive(Clone)]
pub struct CasterLevelService {
    inner: Arc<Inner>,
}

struct Inner {
    character: Arc<Character>,
    registry: Arc<RuleRegistry>,
    grants: SpellGrantReconciler,
    slots: SpellSlotReconciler,
    overrides: CasterOverrideReconciler,
    locks: ReconciliationLocks,
    verify_delay: Duration,
}

impl CasterLevelService {
    pub fn new(
        character: Arc<Character>,
        registry: Arc<RuleRegistry>,
        grants: SpellGrantReconciler,
        slots: SpellSlotReconciler,
        overrides: CasterOverrideReconciler,
        verify_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                character,
                registry,
                grants,
                slots,
                overrides,
                locks: ReconciliationLocks::new(),
                verify_delay,
            }),
        }
    }

    pub fn on_login(&self, character_id: CharacterId) -> TriggerOutcome {
        self.trigger(character_id, LifecycleEvent::Login)
    }

    pub fn on_level_up(&self, character_id: CharacterId) -> TriggerOutcome {
        self.trigger(character_id, LifecycleEvent::LevelUp)
    }

    pub fn on_level_down(&self, character_id: CharacterId) -> TriggerOutcome {
        self.trigger(character_id, LifecycleEvent::LevelDown)
    }

    /// Resolve a spell with effective caster levels in place.
    pub async fn on_spell_cast<F, Fut, T>(
        &self,
        character_id: CharacterId,
        cast: F,
    ) -> Result<T, CasterLevelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.inner.overrides.with_override(character_id, cast).await
    }

    /// Start a pass in the background unless one is already running.
    pub fn trigger(&self, character_id: CharacterId, event: LifecycleEvent) -> TriggerOutcome {
        let Some(guard) = self.inner.locks.acquire_or_request(character_id) else {
            tracing::debug!(
                character_id = %character_id,
                event = %event,
                "Reconciliation in progress, follow-up pass requested"
            );
            return TriggerOutcome::Deferred;
        };

        let inner = self.inner.clone();
        TriggerOutcome::Started(tokio::spawn(async move {
            tracing::info!(
                character_id = %character_id,
                event = %event,
                "Reconciliation triggered"
            );
            inner.run_passes(guard).await;
            inner.schedule_verification(character_id);
        }))
    }

    /// Run one pass now, in the caller's task.
    pub async fn reconcile_now(
        &self,
        character_id: CharacterId,
    ) -> Result<PassReport, CasterLevelError> {
        let Some(mut guard) = self.inner.locks.try_acquire(character_id) else {
            return Err(CasterLevelError::Busy(character_id));
        };
        let report = self.inner.run_pass(character_id).await;
        if guard.complete() {
            // A trigger arrived meanwhile; honour it in the background.
            let inner = self.inner.clone();
            tokio::spawn(async move {
                inner.run_passes(guard).await;
                inner.schedule_verification(character_id);
            });
        } else {
            self.inner.schedule_verification(character_id);
        }
        report
    }

    /// Run carrier verification now, skipping if a pass holds the lock.
    pub async fn verify_now(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<Vec<CarrierAnomaly>>, CasterLevelError> {
        self.inner.verify(character_id).await
    }

    /// Current effective levels, computed from fresh class levels.
    pub async fn effective_levels(
        &self,
        character_id: CharacterId,
    ) -> Result<EffectiveLevels, CasterLevelError> {
        let ledger = self
            .inner
            .character
            .ledger(character_id)
            .await
            .map_err(|source| CasterLevelError::Ledger {
                character_id,
                source,
            })?;
        Ok(calculate_effective_levels(&self.inner.registry, &ledger))
    }

    pub fn is_reconciling(&self, character_id: CharacterId) -> bool {
        self.inner.locks.is_held(character_id)
    }
}

impl Inner {
    async fn run_pass(&self, character_id: CharacterId) -> Result<PassReport, CasterLevelError> {
        let ledger = self
            .character
            .ledger(character_id)
            .await
            .map_err(|source| CasterLevelError::Ledger {
                character_id,
                source,
            })?;
        let levels = calculate_effective_levels(&self.registry, &ledger);
        for prestige in levels.unresolved() {
            tracing::warn!(
                character_id = %character_id,
                class = %prestige,
                "Prestige class has no base class to stack onto"
            );
        }

        let grants = self.grants.reconcile(character_id, &ledger, &levels).await?;
        let slots = self.slots.reconcile(character_id).await?;

        Ok(PassReport {
            levels,
            grants,
            slots,
        })
    }

    /// Run passes until no follow-up is requested, then release.
    async fn run_passes(&self, mut guard: PassGuard) {
        let character_id = guard.character_id();
        loop {
            match self.run_pass(character_id).await {
                Ok(report) => tracing::info!(
                    character_id = %character_id,
                    granted = report.grants.granted.len(),
                    pruned = report.grants.restore.pruned,
                    restored = report.grants.restore.restored,
                    slots = ?report.slots,
                    "Reconciliation pass finished"
                ),
                Err(e) => tracing::error!(
                    character_id = %character_id,
                    error = %e,
                    "Reconciliation pass aborted"
                ),
            }
            if !guard.complete() {
                break;
            }
            tracing::debug!(character_id = %character_id, "Running requested follow-up pass");
        }
    }

    fn schedule_verification(self: &Arc<Self>, character_id: CharacterId) {
        let inner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.verify_delay).await;
            if let Err(e) = inner.verify(character_id).await {
                tracing::error!(
                    character_id = %character_id,
                    error = %e,
                    "Carrier verification failed"
                );
            }
        });
    }

    async fn verify(
        self: &Arc<Self>,
        character_id: CharacterId,
    ) -> Result<Option<Vec<CarrierAnomaly>>, CasterLevelError> {
        let Some(mut guard) = self.locks.try_acquire(character_id) else {
            tracing::debug!(character_id = %character_id, "Pass in progress, verification skipped");
            return Ok(None);
        };
        let anomalies = self.slots.verify(character_id).await;
        if guard.complete() {
            // A trigger landed during verification.
            let inner = self.clone();
            tokio::spawn(async move {
                inner.run_passes(guard).await;
                inner.schedule_verification(character_id);
            });
        }
        anomalies.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanum_domain::{classes, ClassId, ClassLevel, DomainId, CARRIER_TAG};

    use crate::entities::{CarrierItems, GrantLedger};
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::memory::InMemoryWorld;
    use crate::infrastructure::spell_circle_cache::SpellCircleCache;
    use crate::use_cases::caster_level::grants::tests::static_data;

    fn service(world: &Arc<InMemoryWorld>) -> CasterLevelService {
        // Keep background verification out of the way.
        service_with_delay(world, Duration::from_secs(3600))
    }

    fn service_with_delay(
        world: &Arc<InMemoryWorld>,
        verify_delay: Duration,
    ) -> CasterLevelService {
        let registry = Arc::new(RuleRegistry::standard());
        let character = Arc::new(Character::new(world.clone()));
        CasterLevelService::new(
            character.clone(),
            registry.clone(),
            SpellGrantReconciler::new(
                character.clone(),
                Arc::new(GrantLedger::new(world.clone())),
                Arc::new(SpellCircleCache::new(static_data(), registry.clone(), 64)),
                registry.clone(),
                Arc::new(SystemClock::new()),
            ),
            SpellSlotReconciler::new(
                character.clone(),
                Arc::new(CarrierItems::new(world.clone())),
                registry.clone(),
                Duration::ZERO,
            ),
            CasterOverrideReconciler::new(character, registry, world.clone()),
            verify_delay,
        )
    }

    async fn cleric_blackguard(world: &InMemoryWorld) -> CharacterId {
        let id = CharacterId::new();
        world
            .add_character(
                id,
                [
                    ClassLevel::new(classes::CLERIC, 9),
                    ClassLevel::new(classes::BLACKGUARD, 16),
                ],
                [DomainId::new("war")],
            )
            .await;
        id
    }

    fn carriers(items: &[crate::infrastructure::memory::ItemSnapshot]) -> usize {
        items.iter().filter(|i| i.tag == CARRIER_TAG).count()
    }

    #[tokio::test]
    async fn reconcile_now_runs_full_pass() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;

        let report = service(&world).reconcile_now(id).await.expect("pass");

        assert_eq!(report.levels.effective(&ClassId::new(classes::CLERIC)), 20);
        assert_eq!(report.grants.granted.len(), 9);
        assert!(matches!(report.slots, SlotOutcome::Equipped { .. }));
        assert_eq!(carriers(&world.items_of(id).await), 1);
    }

    #[tokio::test]
    async fn reconcile_now_reports_busy() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);
        let _held = service.inner.locks.try_acquire(id).expect("free");

        let err = service.reconcile_now(id).await.expect_err("busy");

        assert!(matches!(err, CasterLevelError::Busy(busy) if busy == id));
        assert_eq!(world.created_count(), 0);
    }

    #[tokio::test]
    async fn unknown_character_fails_on_ledger() {
        let world = Arc::new(InMemoryWorld::new());
        let service = service(&world);
        let id = CharacterId::new();

        let err = service.reconcile_now(id).await.expect_err("unknown");

        assert!(matches!(err, CasterLevelError::Ledger { character_id, .. } if character_id == id));
        assert!(!service.is_reconciling(id));
    }

    #[tokio::test]
    async fn back_to_back_triggers_run_one_follow_up() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);

        let first = service.on_login(id);
        let second = service.on_level_up(id);
        let third = service.on_level_up(id);

        let TriggerOutcome::Started(handle) = first else {
            panic!("first trigger should start a pass");
        };
        assert!(matches!(second, TriggerOutcome::Deferred));
        assert!(matches!(third, TriggerOutcome::Deferred));
        handle.await.expect("pass task");

        // The initial pass plus exactly one follow-up.
        assert_eq!(world.created_count(), 2);
        assert_eq!(carriers(&world.items_of(id).await), 1);
        assert!(!service.is_reconciling(id));
    }

    #[tokio::test]
    async fn trigger_after_release_starts_new_pass() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);

        let TriggerOutcome::Started(handle) = service.on_login(id) else {
            panic!("should start");
        };
        handle.await.expect("pass task");
        world.set_class_level(id, classes::BLACKGUARD, 4).await;
        let TriggerOutcome::Started(handle) = service.on_level_down(id) else {
            panic!("should start again");
        };
        handle.await.expect("pass task");

        assert_eq!(world.created_count(), 1);
        assert!(world.items_of(id).await.is_empty());
    }

    #[tokio::test]
    async fn verify_now_after_pass_is_clean() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);
        service.reconcile_now(id).await.expect("pass");

        let anomalies = service.verify_now(id).await.expect("verify");

        assert_eq!(anomalies, Some(Vec::new()));
    }

    #[tokio::test]
    async fn verify_now_skips_while_busy() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);
        let held = service.inner.locks.acquire_or_request(id).expect("free");

        let anomalies = service.verify_now(id).await.expect("verify");

        assert_eq!(anomalies, None);
        assert_eq!(world.created_count(), 0);
        drop(held);
        assert!(!service.is_reconciling(id));
    }

    #[tokio::test]
    async fn spell_cast_sees_effective_level() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);
        let cleric = ClassId::new(classes::CLERIC);

        let seen = service
            .on_spell_cast(id, || async { world.override_level(id, &cleric) })
            .await
            .expect("cast");

        assert_eq!(seen, Some(20));
        assert_eq!(world.override_count(), 0);
    }

    #[tokio::test]
    async fn effective_levels_reads_fresh_ledger() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service(&world);
        let cleric = ClassId::new(classes::CLERIC);

        assert_eq!(service.effective_levels(id).await.expect("levels").effective(&cleric), 20);
        world.set_class_level(id, classes::BLACKGUARD, 6).await;
        // (6 - 5) stacks onto cleric 9.
        assert_eq!(service.effective_levels(id).await.expect("levels").effective(&cleric), 10);
    }

    /// Poll until `done` holds or roughly a second has passed.
    async fn eventually<F, Fut>(mut done: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..50 {
            if done().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test]
    async fn background_verification_re_equips_carrier() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service_with_delay(&world, Duration::from_millis(20));

        let TriggerOutcome::Started(handle) = service.on_login(id) else {
            panic!("login should start a pass");
        };
        handle.await.expect("pass task");
        let carrier = world.items_of(id).await[0].id;
        world.unequip(carrier).await;

        let world = &world;
        let repaired = eventually(|| async move {
            world
                .items_of(id)
                .await
                .iter()
                .any(|item| item.id == carrier && item.equipped)
        })
        .await;

        assert!(repaired, "carrier should be equipped again");
        assert_eq!(world.created_count(), 1);
    }

    #[tokio::test]
    async fn reconcile_now_schedules_verification() {
        let world = Arc::new(InMemoryWorld::new());
        let id = cleric_blackguard(&world).await;
        let service = service_with_delay(&world, Duration::from_millis(20));

        service.reconcile_now(id).await.expect("pass");
        world.spawn_item(id, CARRIER_TAG, false, Vec::new()).await;
        assert_eq!(carriers(&world.items_of(id).await), 2);

        let world = &world;
        let deduplicated =
            eventually(|| async move { carriers(&world.items_of(id).await) == 1 }).await;

        assert!(deduplicated, "duplicate carrier should be destroyed");
        assert!(world.items_of(id).await.iter().all(|item| item.equipped));
    }
}
