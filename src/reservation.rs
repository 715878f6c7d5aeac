use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{GuestId, ReservationCode, ReservationId, ReservationKind, ReservationStatus, RoomId};

/// bookable room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub floor: u32,
    pub room_type: String,
    pub price_per_night: Money,
    /// manual override, outside the reservation-driven states
    pub under_maintenance: bool,
}

/// guest identity and contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    pub doc_type: String,
    /// natural key
    pub doc_number: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// reference to the stored identity photo
    pub id_photo: Option<String>,
    pub visit_count: u32,
    pub last_visit: Option<DateTime<Utc>>,
}

/// requested booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub kind: ReservationKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl Stay {
    pub fn nights(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            kind: ReservationKind::Night,
            start_date,
            end_date,
            start_time: None,
            end_time: None,
        }
    }

    pub fn hourly(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            kind: ReservationKind::Hourly,
            start_date: date,
            end_date: date,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// check the date shape required by the booking kind
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            ReservationKind::Night if self.end_date <= self.start_date => Err(format!(
                "night stay must end after it starts ({} -> {})",
                self.start_date, self.end_date
            )),
            ReservationKind::Hourly if self.end_date != self.start_date => Err(format!(
                "hourly stay must start and end on the same date ({} -> {})",
                self.start_date, self.end_date
            )),
            _ => Ok(()),
        }
    }

    /// billable nights, never below one
    pub fn night_count(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days();
        days.max(1) as u32
    }

    /// whether this stay shows up on the calendar for `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self.kind {
            ReservationKind::Hourly => date == self.start_date,
            ReservationKind::Night => self.start_date <= date && date < self.end_date,
        }
    }

    /// room cost at a nightly price
    pub fn price_at(&self, price_per_night: Money) -> Money {
        match self.kind {
            ReservationKind::Night => price_per_night.times(self.night_count()),
            ReservationKind::Hourly => price_per_night,
        }
    }
}

/// reservation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub code: ReservationCode,
    pub room_id: RoomId,
    pub guest_id: GuestId,
    pub stay: Stay,
    pub status: ReservationStatus,

    // billing
    /// room cost, possibly a custom price
    pub total_amount: Money,
    /// every payment ever applied, across all buckets
    pub paid_amount: Money,
    /// paid at booking time
    pub prepaid_amount: Money,

    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_status_change: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn kind(&self) -> ReservationKind {
        self.stay.kind
    }

    /// update status
    pub fn update_status(&mut self, new_status: ReservationStatus, timestamp: DateTime<Utc>) {
        self.status = new_status;
        self.last_status_change = timestamp;
    }
}
