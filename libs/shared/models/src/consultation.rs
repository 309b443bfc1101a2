// libs/shared/models/src/consultation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Clinical record of the visit behind a booking. Exactly one encounter may
/// ever reference a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub attachment_path: Option<String>,
    pub treatment: Option<String>,
    pub observations: Option<String>,
    /// Patient satisfaction score, 1 to 10. `None` until the patient rates
    /// the finalized encounter; set at most once.
    pub rating: Option<i16>,
    pub status: EncounterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Encounter {
    pub fn is_finalized(&self) -> bool {
        self.status == EncounterStatus::Finalized
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    Started,
    InReview,
    Diagnosed,
    Finalized,
}

impl fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterStatus::Started => write!(f, "started"),
            EncounterStatus::InReview => write!(f, "in_review"),
            EncounterStatus::Diagnosed => write!(f, "diagnosed"),
            EncounterStatus::Finalized => write!(f, "finalized"),
        }
    }
}
