// libs/consultation-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::{Booking, Encounter, EncounterStatus, Modality};

/// Doctor-authored mutation of an encounter. Every optional field present in
/// the request is applied; the status is always applied, subject to the
/// modality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEncounterRequest {
    pub diagnosis: Option<String>,
    pub attachment_path: Option<String>,
    pub treatment: Option<String>,
    pub observations: Option<String>,
    pub rating: Option<i16>,
    pub status: EncounterStatus,
}

impl UpdateEncounterRequest {
    /// A bare status change with no clinical fields attached.
    pub fn status_only(status: EncounterStatus) -> Self {
        Self {
            diagnosis: None,
            attachment_path: None,
            treatment: None,
            observations: None,
            rating: None,
            status,
        }
    }
}

/// Encounter joined with the booking it records, for the read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterWithBooking {
    pub encounter: Encounter,
    pub booking: Booking,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("An encounter already exists for this booking")]
    EncounterAlreadyStarted,

    #[error("Encounter not found")]
    EncounterNotFound,

    #[error("Encounter is finalized and can no longer be modified")]
    EncounterAlreadyFinalized,

    #[error("Encounter is not finalized")]
    EncounterNotFinalized,

    #[error("Caller does not own this encounter")]
    OwnershipViolation,

    #[error("Status {requested} is not reachable for {modality} encounters")]
    InvalidStateForModality {
        modality: Modality,
        requested: EncounterStatus,
    },

    #[error("Rating must be between 1 and 10, got {0}")]
    InvalidRating(i16),

    #[error("Encounter has already been rated")]
    AlreadyRated,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}
