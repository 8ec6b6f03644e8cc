//! Caster level reconciliation errors.

use arcanum_domain::CharacterId;

use crate::infrastructure::ports::PortError;

/// Errors that can abort a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum CasterLevelError {
    #[error("Reconciliation already running for character {0}")]
    Busy(CharacterId),
    #[error("Could not read class levels of character {character_id}: {source}")]
    Ledger {
        character_id: CharacterId,
        #[source]
        source: PortError,
    },
    /// The partially built carrier has already been destroyed.
    #[error("Carrier build failed during {stage}: {source}")]
    CarrierBuild {
        stage: &'static str,
        #[source]
        source: PortError,
    },
    #[error("Port error: {0}")]
    Port(#[from] PortError),
}
