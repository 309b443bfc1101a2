// libs/consultation-cell/src/services/consultation.rs
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::ClinicDatastore;
use shared_models::{BookingStatus, Encounter, EncounterStatus, SlotStatus};

use crate::models::{ConsultationError, EncounterWithBooking, UpdateEncounterRequest};
use crate::services::lifecycle::EncounterLifecycleService;

pub struct ConsultationService {
    store: ClinicDatastore,
    lifecycle: EncounterLifecycleService,
}

impl ConsultationService {
    pub fn new(store: ClinicDatastore) -> Self {
        Self {
            store,
            lifecycle: EncounterLifecycleService::new(),
        }
    }

    /// Opens the clinical record for a booking. The caller must be the
    /// doctor who owns the slot behind the booking; a booking admits exactly
    /// one encounter, ever. The booking advances to CONFIRMED in the same
    /// commit. The reason may be empty.
    pub async fn start_encounter(
        &self,
        booking_id: Uuid,
        reason: String,
        doctor_id: Uuid,
    ) -> Result<Encounter, ConsultationError> {
        debug!(
            "Starting encounter on booking {} for doctor {}",
            booking_id, doctor_id
        );

        let encounter = self.store.with_transaction(|tables| {
            let booking = tables
                .bookings
                .find_by_id(booking_id)
                .ok_or(ConsultationError::BookingNotFound)?;
            let slot = tables
                .slots
                .find_by_id(booking.slot_id)
                .ok_or(ConsultationError::SlotNotFound)?;

            if slot.doctor_id != doctor_id {
                warn!(
                    "Doctor {} attempted to start an encounter on slot {} they do not own",
                    doctor_id, slot.id
                );
                return Err(ConsultationError::OwnershipViolation);
            }

            if tables
                .encounters
                .find_one(|e| e.booking_id == booking_id)
                .is_some()
            {
                return Err(ConsultationError::EncounterAlreadyStarted);
            }

            let now = Utc::now();
            let encounter = tables.encounters.insert(Encounter {
                id: Uuid::new_v4(),
                booking_id,
                reason,
                diagnosis: None,
                attachment_path: None,
                treatment: None,
                observations: None,
                rating: None,
                status: EncounterStatus::Started,
                created_at: now,
                updated_at: now,
            });

            tables.bookings.update(booking.id, |b| {
                b.status = BookingStatus::Confirmed;
                b.updated_at = now;
            });

            Ok(encounter)
        })?;

        info!("Encounter {} started on booking {}", encounter.id, booking_id);
        Ok(encounter)
    }

    /// Applies the doctor's clinical fields and moves the encounter to the
    /// requested status, subject to the modality gate. Finalizing also marks
    /// the slot FINISHED and the booking ATTENDED, all in one commit.
    pub async fn update_encounter(
        &self,
        encounter_id: Uuid,
        doctor_id: Uuid,
        request: UpdateEncounterRequest,
    ) -> Result<Encounter, ConsultationError> {
        debug!(
            "Updating encounter {} towards {}",
            encounter_id, request.status
        );

        let target = request.status;
        let updated = self.store.with_transaction(|tables| {
            let encounter = tables
                .encounters
                .find_by_id(encounter_id)
                .ok_or(ConsultationError::EncounterNotFound)?;

            if encounter.is_finalized() {
                return Err(ConsultationError::EncounterAlreadyFinalized);
            }

            let booking = tables
                .bookings
                .find_by_id(encounter.booking_id)
                .ok_or(ConsultationError::BookingNotFound)?;
            let slot = tables
                .slots
                .find_by_id(booking.slot_id)
                .ok_or(ConsultationError::SlotNotFound)?;

            if slot.doctor_id != doctor_id {
                warn!(
                    "Doctor {} attempted to update encounter {} they do not own",
                    doctor_id, encounter_id
                );
                return Err(ConsultationError::OwnershipViolation);
            }

            self.lifecycle.validate_transition(slot.modality, target)?;

            let now = Utc::now();
            let updated = tables
                .encounters
                .update(encounter.id, |e| {
                    if let Some(diagnosis) = request.diagnosis {
                        e.diagnosis = Some(diagnosis);
                    }
                    if let Some(attachment_path) = request.attachment_path {
                        e.attachment_path = Some(attachment_path);
                    }
                    if let Some(treatment) = request.treatment {
                        e.treatment = Some(treatment);
                    }
                    if let Some(observations) = request.observations {
                        e.observations = Some(observations);
                    }
                    if let Some(rating) = request.rating {
                        e.rating = Some(rating);
                    }
                    e.status = target;
                    e.updated_at = now;
                })
                .ok_or(ConsultationError::EncounterNotFound)?;

            if target == EncounterStatus::Finalized {
                tables.slots.update(slot.id, |s| {
                    s.status = SlotStatus::Finished;
                    s.updated_at = now;
                });
                tables.bookings.update(booking.id, |b| {
                    b.status = BookingStatus::Attended;
                    b.updated_at = now;
                });
            }

            Ok(updated)
        })?;

        info!("Encounter {} moved to {}", encounter_id, updated.status);
        Ok(updated)
    }

    /// Records the patient's satisfaction score on a finalized encounter.
    /// The range check runs before any store access; the rating can be set
    /// exactly once.
    pub async fn rate_encounter(
        &self,
        encounter_id: Uuid,
        patient_id: Uuid,
        rating: i16,
    ) -> Result<Encounter, ConsultationError> {
        if !(1..=10).contains(&rating) {
            return Err(ConsultationError::InvalidRating(rating));
        }

        debug!(
            "Rating encounter {} for patient {}",
            encounter_id, patient_id
        );

        let rated = self.store.with_transaction(|tables| {
            let encounter = tables
                .encounters
                .find_by_id(encounter_id)
                .ok_or(ConsultationError::EncounterNotFound)?;

            if !encounter.is_finalized() {
                return Err(ConsultationError::EncounterNotFinalized);
            }

            let booking = tables
                .bookings
                .find_by_id(encounter.booking_id)
                .ok_or(ConsultationError::BookingNotFound)?;

            if booking.patient_id != patient_id {
                warn!(
                    "Patient {} attempted to rate encounter {} they do not own",
                    patient_id, encounter_id
                );
                return Err(ConsultationError::OwnershipViolation);
            }

            if encounter.rating.is_some() {
                return Err(ConsultationError::AlreadyRated);
            }

            tables
                .encounters
                .update(encounter.id, |e| {
                    e.rating = Some(rating);
                    e.updated_at = Utc::now();
                })
                .ok_or(ConsultationError::EncounterNotFound)
        })?;

        info!("Encounter {} rated {}", encounter_id, rating);
        Ok(rated)
    }

    /// The encounter recorded for a booking, with the booking itself.
    /// Read-only.
    pub async fn encounter_by_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<EncounterWithBooking, ConsultationError> {
        debug!("Fetching encounter for booking {}", booking_id);

        self.store.read(|tables| {
            let encounter = tables
                .encounters
                .find_one(|e| e.booking_id == booking_id)
                .ok_or(ConsultationError::EncounterNotFound)?;
            let booking = tables
                .bookings
                .find_by_id(booking_id)
                .ok_or(ConsultationError::BookingNotFound)?;
            Ok(EncounterWithBooking { encounter, booking })
        })
    }
}
