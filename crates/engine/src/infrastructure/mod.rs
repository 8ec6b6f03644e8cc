//! Infrastructure - port traits and their adapters.

pub mod clock;
pub mod memory;
pub mod ports;
pub mod settings;
pub mod spell_circle_cache;
pub mod static_data;
pub mod two_da;
