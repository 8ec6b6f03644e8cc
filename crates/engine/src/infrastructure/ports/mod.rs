//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Game engine access (character sheet, inventory, caster level overrides)
//! - Character-scoped persistence (could swap attributes -> database)
//! - Static rule tables (could swap 2DA files -> embedded data)
//! - Clock (for testing)

mod engine;
mod error;
mod storage;
mod testing;

// =============================================================================
// Engine Ports
// =============================================================================
pub use engine::{CasterOverridePort, CharacterPort, ItemPort};
pub use error::PortError;

// =============================================================================
// Storage Ports
// =============================================================================
pub use storage::{AttributeStore, StaticDataPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use engine::{MockCasterOverridePort, MockCharacterPort, MockItemPort};
#[cfg(test)]
pub use storage::{MockAttributeStore, MockStaticDataPort};
#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;
