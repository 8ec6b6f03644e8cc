//! Arcanum Engine library.
//!
//! Keeps a character's effective caster levels applied inside the game
//! engine: prestige class levels are folded onto a base casting class, and
//! the result is delivered as scoped caster level overrides, bonus spell
//! slots on a hidden carrier item, and known-spell grants.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping engine ports
//! - `use_cases/` - Reconciliation passes and their scheduling
//! - `infrastructure/` - Port traits and adapters (2DA static data, in-memory engine)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
