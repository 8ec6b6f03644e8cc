//! Use cases - orchestration across entity modules.

pub mod caster_level;

pub use caster_level::{CasterLevelService, LifecycleEvent, PassReport, TriggerOutcome};
