//! Application state and composition.

use std::sync::Arc;

use arcanum_domain::RuleRegistry;

use crate::entities::{CarrierItems, Character, GrantLedger};
use crate::infrastructure::{
    clock::SystemClock,
    memory::InMemoryWorld,
    ports::{
        AttributeStore, CasterOverridePort, CharacterPort, ClockPort, ItemPort, StaticDataPort,
    },
    settings::ReconcilerSettings,
    spell_circle_cache::SpellCircleCache,
};
use crate::use_cases::caster_level::{
    CasterLevelService, CasterOverrideReconciler, SpellGrantReconciler, SpellSlotReconciler,
};

/// Engine adapters the reconcilers run against.
#[derive(Clone)]
pub struct EnginePorts {
    pub character: Arc<dyn CharacterPort>,
    pub items: Arc<dyn ItemPort>,
    pub attributes: Arc<dyn AttributeStore>,
    pub overrides: Arc<dyn CasterOverridePort>,
    pub static_data: Arc<dyn StaticDataPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl EnginePorts {
    /// Every engine port served by one in-memory world.
    pub fn in_memory(world: Arc<InMemoryWorld>, static_data: Arc<dyn StaticDataPort>) -> Self {
        Self {
            character: world.clone(),
            items: world.clone(),
            attributes: world.clone(),
            overrides: world,
            static_data,
            clock: Arc::new(SystemClock::new()),
        }
    }
}

/// Main application state.
pub struct App {
    pub registry: Arc<RuleRegistry>,
    pub spell_circles: Arc<SpellCircleCache>,
    pub caster_levels: CasterLevelService,
    pub settings: ReconcilerSettings,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(ports: EnginePorts, registry: RuleRegistry, settings: ReconcilerSettings) -> Self {
        let registry = Arc::new(registry);
        let character = Arc::new(Character::new(ports.character));
        let spell_circles = Arc::new(SpellCircleCache::new(
            ports.static_data,
            registry.clone(),
            settings.domain_row_limit,
        ));

        let grants = SpellGrantReconciler::new(
            character.clone(),
            Arc::new(GrantLedger::new(ports.attributes)),
            spell_circles.clone(),
            registry.clone(),
            ports.clock,
        );
        let slots = SpellSlotReconciler::new(
            character.clone(),
            Arc::new(CarrierItems::new(ports.items)),
            registry.clone(),
            settings.settle_delay,
        );
        let overrides =
            CasterOverrideReconciler::new(character.clone(), registry.clone(), ports.overrides);

        let caster_levels = CasterLevelService::new(
            character,
            registry.clone(),
            grants,
            slots,
            overrides,
            settings.verify_delay,
        );

        Self {
            registry,
            spell_circles,
            caster_levels,
            settings,
        }
    }
}
