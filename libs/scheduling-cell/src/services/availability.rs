// libs/scheduling-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ClinicDatastore, ClinicTables};
use shared_models::{Slot, SlotStatus};

use crate::models::{AvailabilityRequest, BookSlotRequest, ScheduleError};

pub struct SlotAllocationService {
    store: ClinicDatastore,
}

impl SlotAllocationService {
    pub fn new(store: ClinicDatastore) -> Self {
        Self { store }
    }

    /// Publishes an AVAILABLE window for the doctor. Fails with
    /// `SlotOverlap` when the window intersects any non-cancelled slot the
    /// doctor already holds on that date.
    pub async fn register_availability(
        &self,
        doctor_id: Uuid,
        request: AvailabilityRequest,
    ) -> Result<Slot, ScheduleError> {
        debug!(
            "Registering availability for doctor {} on {} from {} to {}",
            doctor_id, request.date, request.start_time, request.end_time
        );

        validate_time_range(request.start_time, request.end_time)?;

        let slot = self.store.with_transaction(|tables| {
            ensure_no_overlap(
                tables,
                doctor_id,
                request.date,
                request.start_time,
                request.end_time,
            )?;

            let now = Utc::now();
            let slot = Slot {
                id: Uuid::new_v4(),
                doctor_id,
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
                modality: request.modality,
                status: SlotStatus::Available,
                title: request.title,
                created_at: now,
                updated_at: now,
            };
            Ok::<_, ScheduleError>(tables.slots.insert(slot))
        })?;

        info!("Availability {} registered for doctor {}", slot.id, doctor_id);
        Ok(slot)
    }

    /// Resolves the slot a booking will occupy, inside the CALLER's
    /// transaction.
    ///
    /// With an explicit `slot_id` this is a reservation, not a creation: the
    /// slot must exist with status AVAILABLE and the requested modality, and
    /// is marked OCCUPIED. Without one, a fresh slot is created directly as
    /// OCCUPIED once the overlap check clears the window.
    pub fn reserve_slot(
        &self,
        tables: &mut ClinicTables,
        request: &BookSlotRequest,
    ) -> Result<Slot, ScheduleError> {
        match request.slot_id {
            Some(slot_id) => {
                let slot = tables
                    .slots
                    .find_by_id(slot_id)
                    .filter(|s| s.status == SlotStatus::Available && s.modality == request.modality)
                    .ok_or_else(|| {
                        warn!("Slot {} cannot be reserved: absent or mismatched", slot_id);
                        ScheduleError::SlotUnavailable
                    })?;

                tables
                    .slots
                    .update(slot.id, |s| {
                        s.status = SlotStatus::Occupied;
                        if let Some(title) = &request.title {
                            s.title = Some(title.clone());
                        }
                        s.updated_at = Utc::now();
                    })
                    .ok_or(ScheduleError::SlotNotFound)
            }
            None => {
                validate_time_range(request.start_time, request.end_time)?;
                ensure_no_overlap(
                    tables,
                    request.doctor_id,
                    request.date,
                    request.start_time,
                    request.end_time,
                )?;

                let now = Utc::now();
                let slot = Slot {
                    id: Uuid::new_v4(),
                    doctor_id: request.doctor_id,
                    date: request.date,
                    start_time: request.start_time,
                    end_time: request.end_time,
                    modality: request.modality,
                    status: SlotStatus::Occupied,
                    title: request.title.clone(),
                    created_at: now,
                    updated_at: now,
                };
                Ok(tables.slots.insert(slot))
            }
        }
    }
}

fn validate_time_range(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), ScheduleError> {
    if start_time >= end_time {
        return Err(ScheduleError::InvalidTimeRange);
    }
    Ok(())
}

/// Half-open interval test against every non-cancelled slot the doctor holds
/// on the date: `existing.start < new.end AND existing.end > new.start`.
fn ensure_no_overlap(
    tables: &ClinicTables,
    doctor_id: Uuid,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<(), ScheduleError> {
    let conflicting = tables.slots.find_all(|slot| {
        slot.doctor_id == doctor_id
            && slot.date == date
            && slot.blocks_schedule()
            && slot.overlaps(start_time, end_time)
    });

    if !conflicting.is_empty() {
        warn!(
            "Overlap detected for doctor {} on {}: {} conflicting slots",
            doctor_id,
            date,
            conflicting.len()
        );
        return Err(ScheduleError::SlotOverlap);
    }

    Ok(())
}
