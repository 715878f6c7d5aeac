use crate::errors::{DeskError, Result};
use crate::reservation::{Reservation, Stay};
use crate::types::{ReservationId, ReservationKind, RoomId};

/// booking admission check for one room
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    pub room_id: RoomId,
    pub stay: &'a Stay,
    /// reservation being amended, never conflicts with itself
    pub ignore: Option<ReservationId>,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(room_id: RoomId, stay: &'a Stay) -> Self {
        Self { room_id, stay, ignore: None }
    }

    pub fn ignoring(mut self, reservation_id: ReservationId) -> Self {
        self.ignore = Some(reservation_id);
        self
    }

    /// whether an existing reservation still holds the room
    fn considers(&self, existing: &Reservation) -> bool {
        existing.room_id == self.room_id
            && !existing.is_deleted()
            && existing.status.blocks_booking()
            && Some(existing.id) != self.ignore
    }

    /// first existing reservation that blocks the request
    pub fn first_conflict<'r, I>(&self, existing: I) -> Option<&'r Reservation>
    where
        I: IntoIterator<Item = &'r Reservation>,
    {
        existing
            .into_iter()
            .filter(|r| self.considers(r))
            .find(|r| stays_collide(self.stay, &r.stay))
    }

    /// accept, or reject naming the first conflicting reservation
    pub fn check<'r, I>(&self, existing: I) -> Result<()>
    where
        I: IntoIterator<Item = &'r Reservation>,
    {
        match self.first_conflict(existing) {
            None => Ok(()),
            Some(other) => Err(DeskError::Conflict {
                reason: format!(
                    "room already booked by reservation {} from {} to {}",
                    other.code, other.stay.start_date, other.stay.end_date
                ),
            }),
        }
    }
}

/// only two night stays can collide, as half-open date ranges
pub fn stays_collide(a: &Stay, b: &Stay) -> bool {
    match (a.kind, b.kind) {
        (ReservationKind::Night, ReservationKind::Night) => {
            a.start_date < b.end_date && b.start_date < a.end_date
        }
        // hourly stays are kept apart by the occupied-room gate at check-in
        _ => false,
    }
}
