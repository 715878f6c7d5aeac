use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};
use crate::types::{ReservationId, ReservationStatus, RoomId, RoomStatus};

/// everything that can happen to a reservation after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    CheckIn,
    AddCharge,
    TakePayment,
    CheckOut,
    CompleteCleaning,
    Amend,
    Delete,
}

/// transition table: `None` means the event is illegal from that status
pub const fn next_status(from: ReservationStatus, event: LifecycleEvent) -> Option<ReservationStatus> {
    use LifecycleEvent::*;
    use ReservationStatus::*;

    match (from, event) {
        (Reserved, CheckIn) => Some(CheckedIn),
        (Reserved, AddCharge) => Some(Reserved),
        (CheckedIn, AddCharge) => Some(CheckedIn),
        (Reserved, TakePayment) => Some(Reserved),
        (CheckedIn, TakePayment) => Some(CheckedIn),
        (CheckedOut, TakePayment) => Some(CheckedOut),
        (Completed, TakePayment) => Some(Completed),
        (CheckedIn, CheckOut) => Some(CheckedOut),
        (CheckedOut, CompleteCleaning) => Some(Completed),
        (Reserved, Amend) => Some(Reserved),
        (CheckedIn, Amend) => Some(CheckedIn),
        (CheckedOut, Amend) => Some(CheckedOut),
        (Completed, Amend) => Some(Completed),
        (Reserved, Delete) => Some(Cancelled),
        (CheckedOut, Delete) => Some(Cancelled),
        _ => None,
    }
}

impl ReservationStatus {
    /// apply an event, rejecting anything outside the transition table
    pub fn apply(self, event: LifecycleEvent) -> Result<ReservationStatus> {
        next_status(self, event).ok_or(DeskError::InvalidTransition { status: self, event })
    }

    /// still blocks the room calendar for new night bookings
    pub fn blocks_booking(&self) -> bool {
        matches!(self, ReservationStatus::Reserved | ReservationStatus::CheckedIn)
    }

    /// open for billing and visible to counter staff by default
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved | ReservationStatus::CheckedIn)
    }
}

/// room occupancy change caused by a reservation transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyChange {
    /// guest checked in
    Occupied,
    /// guest checked out, room dirty
    Vacated,
    /// cleaning confirmed
    Cleaned,
}

/// append-only occupancy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub room_id: RoomId,
    pub reservation_id: Option<ReservationId>,
    pub change: OccupancyChange,
    pub recorded_at: DateTime<Utc>,
}

/// derive the room status from its occupancy records (oldest first) and the
/// manual maintenance override
pub fn derive_room_status<'a, I>(under_maintenance: bool, records: I) -> RoomStatus
where
    I: IntoIterator<Item = &'a OccupancyRecord>,
{
    if under_maintenance {
        return RoomStatus::Maintenance;
    }

    match records.into_iter().last().map(|r| r.change) {
        Some(OccupancyChange::Occupied) => RoomStatus::Occupied,
        Some(OccupancyChange::Vacated) => RoomStatus::Cleaning,
        Some(OccupancyChange::Cleaned) | None => RoomStatus::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use ReservationStatus::*;

    const ALL_STATUSES: [ReservationStatus; 5] = [Reserved, CheckedIn, CheckedOut, Completed, Cancelled];

    #[test]
    fn test_happy_path() {
        let status = Reserved
            .apply(LifecycleEvent::CheckIn)
            .and_then(|s| s.apply(LifecycleEvent::AddCharge))
            .and_then(|s| s.apply(LifecycleEvent::TakePayment))
            .and_then(|s| s.apply(LifecycleEvent::CheckOut))
            .and_then(|s| s.apply(LifecycleEvent::CompleteCleaning))
            .unwrap();
        assert_eq!(status, Completed);
    }

    #[test]
    fn test_delete_branch() {
        assert_eq!(Reserved.apply(LifecycleEvent::Delete).unwrap(), Cancelled);
        assert_eq!(CheckedOut.apply(LifecycleEvent::Delete).unwrap(), Cancelled);

        let err = CheckedIn.apply(LifecycleEvent::Delete).unwrap_err();
        assert_eq!(err, DeskError::InvalidTransition { status: CheckedIn, event: LifecycleEvent::Delete });
    }

    #[test]
    fn test_cancelled_is_absorbing() {
        let events = [
            LifecycleEvent::CheckIn,
            LifecycleEvent::AddCharge,
            LifecycleEvent::TakePayment,
            LifecycleEvent::CheckOut,
            LifecycleEvent::CompleteCleaning,
            LifecycleEvent::Amend,
            LifecycleEvent::Delete,
        ];
        for event in events {
            assert!(next_status(Cancelled, event).is_none(), "{:?} escaped cancelled", event);
        }
    }

    #[test]
    fn test_charges_only_on_open_stays() {
        for status in ALL_STATUSES {
            let allowed = next_status(status, LifecycleEvent::AddCharge).is_some();
            assert_eq!(allowed, matches!(status, Reserved | CheckedIn), "{}", status);
        }
    }

    #[test]
    fn test_checkout_requires_checked_in() {
        for status in ALL_STATUSES {
            let allowed = next_status(status, LifecycleEvent::CheckOut).is_some();
            assert_eq!(allowed, status == CheckedIn, "{}", status);
        }
    }

    #[test]
    fn test_room_status_follows_latest_record() {
        let room_id = Uuid::new_v4();
        let record = |change| OccupancyRecord {
            room_id,
            reservation_id: None,
            change,
            recorded_at: Utc::now(),
        };

        assert_eq!(derive_room_status(false, &Vec::<OccupancyRecord>::new()), RoomStatus::Available);

        let mut log = vec![record(OccupancyChange::Occupied)];
        assert_eq!(derive_room_status(false, &log), RoomStatus::Occupied);

        log.push(record(OccupancyChange::Vacated));
        assert_eq!(derive_room_status(false, &log), RoomStatus::Cleaning);

        log.push(record(OccupancyChange::Cleaned));
        assert_eq!(derive_room_status(false, &log), RoomStatus::Available);

        // override wins over the log
        assert_eq!(derive_room_status(true, &log), RoomStatus::Maintenance);
    }
}
