// libs/consultation-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::{EncounterStatus, Modality};

use crate::models::ConsultationError;

pub struct EncounterLifecycleService;

impl EncounterLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that the requested status is reachable for the slot's
    /// modality.
    pub fn validate_transition(
        &self,
        modality: Modality,
        requested: EncounterStatus,
    ) -> Result<(), ConsultationError> {
        debug!(
            "Validating encounter transition to {} for {} slot",
            requested, modality
        );

        if !self.reachable_statuses(modality).contains(&requested) {
            warn!(
                "Rejected encounter transition to {} for {} slot",
                requested, modality
            );
            return Err(ConsultationError::InvalidStateForModality {
                modality,
                requested,
            });
        }

        Ok(())
    }

    /// Target statuses a doctor may move an encounter to, by modality.
    /// Virtual visits jump straight to finalized; in-person visits may walk
    /// the review/diagnosis pipeline first.
    pub fn reachable_statuses(&self, modality: Modality) -> Vec<EncounterStatus> {
        match modality {
            Modality::Virtual => vec![EncounterStatus::Finalized],
            Modality::InPerson => vec![
                EncounterStatus::InReview,
                EncounterStatus::Diagnosed,
                EncounterStatus::Finalized,
            ],
        }
    }
}

impl Default for EncounterLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
