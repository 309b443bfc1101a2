// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::{Booking, BookingStatus, EncounterStatus, Modality, Slot};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Doctor-direct availability publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub modality: Modality,
    pub title: Option<String>,
}

/// Patient booking request: either an explicit `slot_id` reserving a window
/// the doctor already published, or the parameters of a window to create on
/// demand for this patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub slot_id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub title: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub modality: Modality,
}

/// Optional filters for the booking list operations, AND-combined. A present
/// value is always applied; an absent field never is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSearchFilter {
    pub doctor_id: Option<Uuid>,
    pub modality: Option<Modality>,
    pub status: Option<BookingStatus>,
}

impl BookingSearchFilter {
    pub fn matches(&self, booking: &Booking, slot: &Slot) -> bool {
        if let Some(doctor_id) = self.doctor_id {
            if slot.doctor_id != doctor_id {
                return false;
            }
        }
        if let Some(modality) = self.modality {
            if booking.modality != modality {
                return false;
            }
        }
        if let Some(status) = self.status {
            if booking.status != status {
                return false;
            }
        }
        true
    }
}

// ==============================================================================
// READ MODELS
// ==============================================================================

/// Directory entry for a doctor, supplied by the external directory service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl DoctorProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Denormalized booking row for the list operations: the booking plus its
/// slot title, doctor profile and encounter progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub status: BookingStatus,
    pub modality: Modality,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_title: Option<String>,
    pub doctor: Option<DoctorProfile>,
    pub encounter_status: Option<EncounterStatus>,
    pub created_at: DateTime<Utc>,
}

/// Confirmation returned by a successful cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub id: Uuid,
    pub status: BookingStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Slot is not available for booking")]
    SlotUnavailable,

    #[error("Slot overlaps an existing window for this doctor")]
    SlotOverlap,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("An active booking already exists for this slot")]
    DuplicateBooking,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Booking does not belong to the requesting patient")]
    BookingOwnershipViolation,

    #[error("Start time must be before end time")]
    InvalidTimeRange,

    #[error("Doctor directory error: {0}")]
    Directory(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
