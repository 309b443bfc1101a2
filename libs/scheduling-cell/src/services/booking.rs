// libs/scheduling-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::ClinicDatastore;
use shared_models::{Booking, BookingStatus, Slot, SlotStatus};

use crate::models::{
    BookSlotRequest, BookingSearchFilter, BookingSummary, CancellationReceipt, DoctorProfile,
    ScheduleError,
};
use crate::services::availability::SlotAllocationService;
use crate::services::directory::DoctorDirectory;

pub struct BookingService {
    store: ClinicDatastore,
    allocation: SlotAllocationService,
    directory: Arc<dyn DoctorDirectory>,
    list_limit: usize,
}

impl BookingService {
    pub fn new(
        config: &AppConfig,
        store: ClinicDatastore,
        directory: Arc<dyn DoctorDirectory>,
    ) -> Self {
        let allocation = SlotAllocationService::new(store.clone());
        Self {
            store,
            allocation,
            directory,
            list_limit: config.scheduling_list_limit,
        }
    }

    /// Books the patient into a slot, resolving it first (reservation of an
    /// existing window or on-demand creation), then creating the PENDING
    /// booking. Slot mutation and booking creation commit or roll back
    /// together.
    pub async fn book_slot(
        &self,
        patient_id: Uuid,
        request: BookSlotRequest,
    ) -> Result<Booking, ScheduleError> {
        debug!(
            "Booking slot for patient {} with doctor {}",
            patient_id, request.doctor_id
        );

        let booking = self.store.with_transaction(|tables| {
            let slot = self.allocation.reserve_slot(tables, &request)?;

            // A stale active booking on a slot we just reserved indicates a
            // race or data inconsistency; the booking must still be rejected.
            if tables
                .bookings
                .find_one(|b| b.slot_id == slot.id && b.is_active())
                .is_some()
            {
                warn!("Active booking already exists for slot {}", slot.id);
                return Err(ScheduleError::DuplicateBooking);
            }

            let now = Utc::now();
            let booking = Booking {
                id: Uuid::new_v4(),
                patient_id,
                slot_id: slot.id,
                status: BookingStatus::Pending,
                modality: slot.modality,
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                created_at: now,
                updated_at: now,
            };
            Ok(tables.bookings.insert(booking))
        })?;

        info!(
            "Booking {} created for patient {} on slot {}",
            booking.id, patient_id, booking.slot_id
        );
        Ok(booking)
    }

    /// Bookings owned by the patient, newest first, joined with slot,
    /// doctor and encounter data. Read-only.
    pub async fn list_bookings_for_patient(
        &self,
        patient_id: Uuid,
        filter: BookingSearchFilter,
    ) -> Result<Vec<BookingSummary>, ScheduleError> {
        debug!("Listing bookings for patient {}", patient_id);
        self.list_summaries(|booking, _slot| booking.patient_id == patient_id, &filter)
            .await
    }

    /// Bookings held against the doctor's slots, newest first. Read-only.
    pub async fn list_bookings_for_doctor(
        &self,
        doctor_id: Uuid,
        filter: BookingSearchFilter,
    ) -> Result<Vec<BookingSummary>, ScheduleError> {
        debug!("Listing bookings for doctor {}", doctor_id);
        self.list_summaries(|_booking, slot| slot.doctor_id == doctor_id, &filter)
            .await
    }

    /// Cancels the booking and releases its slot when the slot was OCCUPIED.
    /// A slot in any other status (already finished, for instance) is left
    /// untouched.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        patient_id: Uuid,
    ) -> Result<CancellationReceipt, ScheduleError> {
        debug!("Cancelling booking {} for patient {}", booking_id, patient_id);

        let receipt = self.store.with_transaction(|tables| {
            let booking = tables
                .bookings
                .find_by_id(booking_id)
                .ok_or(ScheduleError::BookingNotFound)?;

            if booking.patient_id != patient_id {
                warn!(
                    "Patient {} attempted to cancel booking {} they do not own",
                    patient_id, booking_id
                );
                return Err(ScheduleError::BookingOwnershipViolation);
            }

            let slot = tables
                .slots
                .find_by_id(booking.slot_id)
                .ok_or(ScheduleError::SlotNotFound)?;

            let now = Utc::now();
            let cancelled = tables
                .bookings
                .update(booking.id, |b| {
                    b.status = BookingStatus::Cancelled;
                    b.updated_at = now;
                })
                .ok_or(ScheduleError::BookingNotFound)?;

            if slot.status == SlotStatus::Occupied {
                tables.slots.update(slot.id, |s| {
                    s.status = SlotStatus::Available;
                    s.updated_at = now;
                });
            }

            Ok(CancellationReceipt {
                id: cancelled.id,
                status: cancelled.status,
            })
        })?;

        info!("Booking {} cancelled", booking_id);
        Ok(receipt)
    }

    async fn list_summaries(
        &self,
        scope: impl Fn(&Booking, &Slot) -> bool,
        filter: &BookingSearchFilter,
    ) -> Result<Vec<BookingSummary>, ScheduleError> {
        let mut rows = self.store.read(|tables| {
            let mut rows = Vec::new();
            for booking in tables.bookings.find_all(|_| true) {
                let Some(slot) = tables.slots.find_by_id(booking.slot_id) else {
                    continue;
                };
                if !scope(&booking, &slot) || !filter.matches(&booking, &slot) {
                    continue;
                }

                let encounter_status = tables
                    .encounters
                    .find_one(|e| e.booking_id == booking.id)
                    .map(|e| e.status);

                rows.push(BookingSummary {
                    id: booking.id,
                    patient_id: booking.patient_id,
                    doctor_id: slot.doctor_id,
                    status: booking.status,
                    modality: booking.modality,
                    date: booking.date,
                    start_time: booking.start_time,
                    end_time: booking.end_time,
                    slot_title: slot.title.clone(),
                    doctor: None,
                    encounter_status,
                    created_at: booking.created_at,
                });
            }
            Ok::<_, ScheduleError>(rows)
        })?;

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(self.list_limit);

        let mut profiles: HashMap<Uuid, Option<DoctorProfile>> = HashMap::new();
        for row in &mut rows {
            let profile = match profiles.get(&row.doctor_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self
                        .directory
                        .doctor_profile(row.doctor_id)
                        .await
                        .map_err(|e| ScheduleError::Directory(e.to_string()))?;
                    profiles.insert(row.doctor_id, fetched.clone());
                    fetched
                }
            };
            row.doctor = profile;
        }

        Ok(rows)
    }
}
