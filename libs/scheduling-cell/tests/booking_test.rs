use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    AvailabilityRequest, BookSlotRequest, BookingSearchFilter, DoctorProfile, ScheduleError,
};
use scheduling_cell::services::{BookingService, DoctorDirectory, SlotAllocationService};
use shared_config::AppConfig;
use shared_database::ClinicDatastore;
use shared_models::{Booking, BookingStatus, Modality, SlotStatus};

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct StaticDirectory {
    profiles: HashMap<Uuid, DoctorProfile>,
}

#[async_trait]
impl DoctorDirectory for StaticDirectory {
    async fn doctor_profile(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>> {
        Ok(self.profiles.get(&doctor_id).cloned())
    }
}

struct TestSetup {
    store: ClinicDatastore,
    service: BookingService,
    allocation: SlotAllocationService,
    doctor_id: Uuid,
    patient_id: Uuid,
}

impl TestSetup {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        let store = ClinicDatastore::default();
        let doctor_id = Uuid::new_v4();

        let mut profiles = HashMap::new();
        profiles.insert(
            doctor_id,
            DoctorProfile {
                id: doctor_id,
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                specialty: Some("Cardiology".to_string()),
            },
        );

        let directory = Arc::new(StaticDirectory { profiles });
        let service = BookingService::new(&config, store.clone(), directory);
        let allocation = SlotAllocationService::new(store.clone());

        Self {
            store,
            service,
            allocation,
            doctor_id,
            patient_id: Uuid::new_v4(),
        }
    }

    fn request(&self, start: (u32, u32), end: (u32, u32)) -> BookSlotRequest {
        BookSlotRequest {
            slot_id: None,
            doctor_id: self.doctor_id,
            title: Some("Checkup".to_string()),
            date: date(2024, 12, 2),
            start_time: time(start.0, start.1),
            end_time: time(end.0, end.1),
            modality: Modality::Virtual,
        }
    }

    async fn publish_window(&self, start: (u32, u32), end: (u32, u32)) -> Uuid {
        self.allocation
            .register_availability(
                self.doctor_id,
                AvailabilityRequest {
                    date: date(2024, 12, 2),
                    start_time: time(start.0, start.1),
                    end_time: time(end.0, end.1),
                    modality: Modality::Virtual,
                    title: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    fn slot_status(&self, slot_id: Uuid) -> SlotStatus {
        self.store
            .read(|tables| {
                Ok::<_, ScheduleError>(tables.slots.find_by_id(slot_id).unwrap().status)
            })
            .unwrap()
    }

    fn booking_status(&self, booking_id: Uuid) -> BookingStatus {
        self.store
            .read(|tables| {
                Ok::<_, ScheduleError>(tables.bookings.find_by_id(booking_id).unwrap().status)
            })
            .unwrap()
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

// ==============================================================================
// BOOKING CREATION
// ==============================================================================

#[tokio::test]
async fn booking_without_slot_creates_occupied_window() {
    let setup = TestSetup::new();

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.patient_id, setup.patient_id);
    assert_eq!(booking.modality, Modality::Virtual);
    assert_eq!(booking.start_time, time(14, 0));
    assert_eq!(booking.end_time, time(15, 0));
    assert_eq!(setup.slot_status(booking.slot_id), SlotStatus::Occupied);
}

#[tokio::test]
async fn second_patient_cannot_book_the_same_window() {
    let setup = TestSetup::new();
    let rival = Uuid::new_v4();

    setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();

    let result = setup
        .service
        .book_slot(rival, setup.request((14, 0), (15, 0)))
        .await;
    assert_matches!(result, Err(ScheduleError::SlotOverlap));
}

#[tokio::test]
async fn booking_reserves_a_published_slot() {
    let setup = TestSetup::new();
    let slot_id = setup.publish_window((9, 0), (9, 30)).await;

    // The request carries its own window; the booking must copy the slot's.
    let mut request = setup.request((14, 0), (15, 0));
    request.slot_id = Some(slot_id);

    let booking = setup
        .service
        .book_slot(setup.patient_id, request)
        .await
        .unwrap();

    assert_eq!(booking.slot_id, slot_id);
    assert_eq!(booking.start_time, time(9, 0));
    assert_eq!(booking.end_time, time(9, 30));
    assert_eq!(setup.slot_status(slot_id), SlotStatus::Occupied);
}

#[tokio::test]
async fn reserving_an_absent_or_mismatched_slot_fails() {
    let setup = TestSetup::new();
    let slot_id = setup.publish_window((9, 0), (9, 30)).await;

    let mut unknown = setup.request((9, 0), (9, 30));
    unknown.slot_id = Some(Uuid::new_v4());
    assert_matches!(
        setup.service.book_slot(setup.patient_id, unknown).await,
        Err(ScheduleError::SlotUnavailable)
    );

    let mut wrong_modality = setup.request((9, 0), (9, 30));
    wrong_modality.slot_id = Some(slot_id);
    wrong_modality.modality = Modality::InPerson;
    assert_matches!(
        setup.service.book_slot(setup.patient_id, wrong_modality).await,
        Err(ScheduleError::SlotUnavailable)
    );

    // Occupy the slot, then try to reserve it again.
    let mut first = setup.request((9, 0), (9, 30));
    first.slot_id = Some(slot_id);
    setup.service.book_slot(setup.patient_id, first).await.unwrap();

    let mut second = setup.request((9, 0), (9, 30));
    second.slot_id = Some(slot_id);
    assert_matches!(
        setup.service.book_slot(Uuid::new_v4(), second).await,
        Err(ScheduleError::SlotUnavailable)
    );
}

#[tokio::test]
async fn stale_active_booking_rejects_and_rolls_back_the_reservation() {
    let setup = TestSetup::new();
    let slot_id = setup.publish_window((9, 0), (9, 30)).await;

    // Inject an active booking that still references the available slot,
    // the inconsistency the duplicate check guards against.
    let now = Utc::now();
    setup
        .store
        .with_transaction(|tables| {
            tables.bookings.insert(Booking {
                id: Uuid::new_v4(),
                patient_id: Uuid::new_v4(),
                slot_id,
                status: BookingStatus::Pending,
                modality: Modality::Virtual,
                date: date(2024, 12, 2),
                start_time: time(9, 0),
                end_time: time(9, 30),
                created_at: now,
                updated_at: now,
            });
            Ok::<_, ScheduleError>(())
        })
        .unwrap();

    let mut request = setup.request((9, 0), (9, 30));
    request.slot_id = Some(slot_id);

    let result = setup.service.book_slot(setup.patient_id, request).await;
    assert_matches!(result, Err(ScheduleError::DuplicateBooking));

    // The OCCUPIED mark from the reservation step was rolled back with the
    // failed booking.
    assert_eq!(setup.slot_status(slot_id), SlotStatus::Available);
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

#[tokio::test]
async fn cancelling_releases_an_occupied_slot() {
    let setup = TestSetup::new();

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();

    let receipt = setup
        .service
        .cancel_booking(booking.id, setup.patient_id)
        .await
        .unwrap();

    assert_eq!(receipt.id, booking.id);
    assert_eq!(receipt.status, BookingStatus::Cancelled);
    assert_eq!(setup.booking_status(booking.id), BookingStatus::Cancelled);
    assert_eq!(setup.slot_status(booking.slot_id), SlotStatus::Available);
}

#[tokio::test]
async fn cancelling_leaves_a_finished_slot_untouched() {
    let setup = TestSetup::new();

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();

    setup
        .store
        .with_transaction(|tables| {
            tables
                .slots
                .update(booking.slot_id, |s| s.status = SlotStatus::Finished);
            Ok::<_, ScheduleError>(())
        })
        .unwrap();

    let receipt = setup
        .service
        .cancel_booking(booking.id, setup.patient_id)
        .await
        .unwrap();

    assert_eq!(receipt.status, BookingStatus::Cancelled);
    assert_eq!(setup.slot_status(booking.slot_id), SlotStatus::Finished);
}

#[tokio::test]
async fn cancellation_enforces_ownership_and_existence() {
    let setup = TestSetup::new();

    assert_matches!(
        setup.service.cancel_booking(Uuid::new_v4(), setup.patient_id).await,
        Err(ScheduleError::BookingNotFound)
    );

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();

    let result = setup.service.cancel_booking(booking.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ScheduleError::BookingOwnershipViolation));
    assert_eq!(setup.booking_status(booking.id), BookingStatus::Pending);
}

#[tokio::test]
async fn cancelling_a_booking_with_a_missing_slot_reports_the_fault() {
    let setup = TestSetup::new();

    // Orphaned booking: its slot was never persisted.
    let now = Utc::now();
    let booking_id = Uuid::new_v4();
    setup
        .store
        .with_transaction(|tables| {
            tables.bookings.insert(Booking {
                id: booking_id,
                patient_id: setup.patient_id,
                slot_id: Uuid::new_v4(),
                status: BookingStatus::Pending,
                modality: Modality::Virtual,
                date: date(2024, 12, 2),
                start_time: time(14, 0),
                end_time: time(15, 0),
                created_at: now,
                updated_at: now,
            });
            Ok::<_, ScheduleError>(())
        })
        .unwrap();

    let result = setup.service.cancel_booking(booking_id, setup.patient_id).await;
    assert_matches!(result, Err(ScheduleError::SlotNotFound));
}

#[tokio::test]
async fn released_slot_can_be_rebooked() {
    let setup = TestSetup::new();

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((14, 0), (15, 0)))
        .await
        .unwrap();
    setup
        .service
        .cancel_booking(booking.id, setup.patient_id)
        .await
        .unwrap();

    let mut request = setup.request((14, 0), (15, 0));
    request.slot_id = Some(booking.slot_id);

    let rebooked = setup.service.book_slot(Uuid::new_v4(), request).await.unwrap();
    assert_eq!(rebooked.slot_id, booking.slot_id);
    assert_eq!(setup.slot_status(booking.slot_id), SlotStatus::Occupied);
}

// ==============================================================================
// LISTING
// ==============================================================================

#[tokio::test]
async fn patient_listing_is_newest_first_and_joined() {
    let setup = TestSetup::new();

    let first = setup
        .service
        .book_slot(setup.patient_id, setup.request((9, 0), (10, 0)))
        .await
        .unwrap();
    let second = setup
        .service
        .book_slot(setup.patient_id, setup.request((11, 0), (12, 0)))
        .await
        .unwrap();

    let rows = setup
        .service
        .list_bookings_for_patient(setup.patient_id, BookingSearchFilter::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, second.id);
    assert_eq!(rows[1].id, first.id);

    let doctor = rows[0].doctor.as_ref().unwrap();
    assert_eq!(doctor.full_name(), "Ana Reyes");
    assert_eq!(doctor.specialty.as_deref(), Some("Cardiology"));
    assert_eq!(rows[0].slot_title.as_deref(), Some("Checkup"));
    assert_eq!(rows[0].encounter_status, None);
}

#[tokio::test]
async fn listing_filters_are_and_combined() {
    let setup = TestSetup::new();

    let virtual_booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((9, 0), (10, 0)))
        .await
        .unwrap();

    let mut in_person = setup.request((11, 0), (12, 0));
    in_person.modality = Modality::InPerson;
    let in_person_booking = setup
        .service
        .book_slot(setup.patient_id, in_person)
        .await
        .unwrap();

    setup
        .service
        .cancel_booking(virtual_booking.id, setup.patient_id)
        .await
        .unwrap();

    let virtual_only = setup
        .service
        .list_bookings_for_patient(
            setup.patient_id,
            BookingSearchFilter {
                modality: Some(Modality::Virtual),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(virtual_only.len(), 1);
    assert_eq!(virtual_only[0].id, virtual_booking.id);

    let pending_only = setup
        .service
        .list_bookings_for_patient(
            setup.patient_id,
            BookingSearchFilter {
                status: Some(BookingStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(pending_only.len(), 1);
    assert_eq!(pending_only[0].id, in_person_booking.id);

    let contradictory = setup
        .service
        .list_bookings_for_patient(
            setup.patient_id,
            BookingSearchFilter {
                modality: Some(Modality::InPerson),
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(contradictory.is_empty());
}

#[tokio::test]
async fn doctor_listing_is_scoped_to_their_slots() {
    let setup = TestSetup::new();

    let booking = setup
        .service
        .book_slot(setup.patient_id, setup.request((9, 0), (10, 0)))
        .await
        .unwrap();

    let mut other_doctor = setup.request((9, 0), (10, 0));
    other_doctor.doctor_id = Uuid::new_v4();
    setup
        .service
        .book_slot(setup.patient_id, other_doctor)
        .await
        .unwrap();

    let rows = setup
        .service
        .list_bookings_for_doctor(setup.doctor_id, BookingSearchFilter::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, booking.id);
    assert_eq!(rows[0].doctor_id, setup.doctor_id);
}

#[tokio::test]
async fn listing_respects_the_configured_limit() {
    let setup = TestSetup::with_config(AppConfig {
        scheduling_list_limit: 2,
    });

    for hour in [9, 11, 13] {
        setup
            .service
            .book_slot(setup.patient_id, setup.request((hour, 0), (hour + 1, 0)))
            .await
            .unwrap();
    }

    let rows = setup
        .service
        .list_bookings_for_patient(setup.patient_id, BookingSearchFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}
