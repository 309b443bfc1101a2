// libs/shared/models/src/scheduling.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY SLOTS
// ==============================================================================

/// A doctor's offered availability window: one calendar date plus a
/// `[start_time, end_time)` range, delivered in person or virtually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub modality: Modality,
    pub status: SlotStatus,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Half-open interval intersection: two windows collide when
    /// `self.start < other.end && self.end > other.start`.
    pub fn overlaps(&self, start_time: NaiveTime, end_time: NaiveTime) -> bool {
        self.start_time < end_time && self.end_time > start_time
    }

    /// Cancelled slots free their time range; every other status still
    /// occupies the doctor's schedule for overlap purposes.
    pub fn blocks_schedule(&self) -> bool {
        self.status != SlotStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Occupied,
    Cancelled,
    /// Terminal marker set when the encounter behind the slot's booking
    /// finalizes. A finished slot is never released back to `Available`.
    Finished,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Occupied => write!(f, "occupied"),
            SlotStatus::Cancelled => write!(f, "cancelled"),
            SlotStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Virtual,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::InPerson => write!(f, "in_person"),
            Modality::Virtual => write!(f, "virtual"),
        }
    }
}

// ==============================================================================
// BOOKINGS
// ==============================================================================

/// A patient's reservation against a slot. Date, time range and modality are
/// copied from the slot at creation so the booking row is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub slot_id: Uuid,
    pub status: BookingStatus,
    pub modality: Modality,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Active bookings are the ones that hold their slot: at most one may
    /// reference a slot at any time.
    pub fn is_active(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Attended => write!(f, "attended"),
        }
    }
}
