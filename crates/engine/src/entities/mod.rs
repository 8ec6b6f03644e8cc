//! Entity modules - Domain capability encapsulation.
//!
//! Each module wraps operations for a domain entity type.
//! They depend on engine ports and provide the building blocks for use cases.

pub mod carrier;
pub mod character;
pub mod grant_ledger;

pub use carrier::CarrierItems;
pub use character::Character;
pub use grant_ledger::{GrantLedger, StoredGrants};
