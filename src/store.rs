use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::inventory::StockBook;
use crate::ledger::{BalanceSheet, Ledger};
use crate::reservation::{Guest, Reservation, Room};
use crate::state::{derive_room_status, OccupancyRecord};
use crate::types::{
    FlowKind, GuestId, PaymentMethod, ReservationCode, ReservationId, ReservationStatus, RoomId, RoomStatus,
};

/// single authoritative in-memory store
///
/// Cloned at the start of every transaction; the clone replaces the
/// original only when the transaction succeeds.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) rooms: BTreeMap<RoomId, Room>,
    pub(crate) guests: BTreeMap<GuestId, Guest>,
    pub(crate) reservations: BTreeMap<ReservationId, Reservation>,
    pub(crate) ledger: Ledger,
    pub(crate) inventory: StockBook,
    pub(crate) occupancy: Vec<OccupancyRecord>,
    /// last issued code, deleted reservations keep theirs
    pub(crate) last_code: ReservationCode,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(&self, room_id: RoomId) -> Result<&Room> {
        self.rooms.get(&room_id).ok_or(DeskError::NotFound { entity: "room", id: room_id })
    }

    pub(crate) fn room_mut(&mut self, room_id: RoomId) -> Result<&mut Room> {
        self.rooms
            .get_mut(&room_id)
            .ok_or(DeskError::NotFound { entity: "room", id: room_id })
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// derived from the occupancy log and the maintenance flag
    pub fn room_status(&self, room_id: RoomId) -> Result<RoomStatus> {
        let room = self.room(room_id)?;
        let records = self.occupancy.iter().filter(|r| r.room_id == room_id);
        Ok(derive_room_status(room.under_maintenance, records))
    }

    pub fn guest(&self, guest_id: GuestId) -> Result<&Guest> {
        self.guests
            .get(&guest_id)
            .ok_or(DeskError::NotFound { entity: "guest", id: guest_id })
    }

    pub(crate) fn guest_mut(&mut self, guest_id: GuestId) -> Result<&mut Guest> {
        self.guests
            .get_mut(&guest_id)
            .ok_or(DeskError::NotFound { entity: "guest", id: guest_id })
    }

    pub fn guest_by_doc(&self, doc_number: &str) -> Option<&Guest> {
        self.guests.values().find(|g| g.doc_number == doc_number)
    }

    /// live reservation, soft-deleted ones are not found
    pub fn reservation(&self, reservation_id: ReservationId) -> Result<&Reservation> {
        self.reservations
            .get(&reservation_id)
            .filter(|r| !r.is_deleted())
            .ok_or(DeskError::NotFound { entity: "reservation", id: reservation_id })
    }

    pub(crate) fn reservation_mut(&mut self, reservation_id: ReservationId) -> Result<&mut Reservation> {
        self.reservations
            .get_mut(&reservation_id)
            .filter(|r| !r.is_deleted())
            .ok_or(DeskError::NotFound { entity: "reservation", id: reservation_id })
    }

    /// every live reservation
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values().filter(|r| !r.is_deleted())
    }

    pub fn reservations_for_room(&self, room_id: RoomId) -> impl Iterator<Item = &Reservation> {
        self.reservations().filter(move |r| r.room_id == room_id)
    }

    /// checked-in reservation currently holding the room, latest start first
    pub fn checked_in_reservation(&self, room_id: RoomId) -> Option<&Reservation> {
        self.reservations_for_room(room_id)
            .filter(|r| r.status == ReservationStatus::CheckedIn)
            .max_by_key(|r| r.stay.start_date)
    }

    pub fn balance(&self, reservation_id: ReservationId) -> Result<BalanceSheet> {
        let reservation = self.reservation(reservation_id)?;
        Ok(BalanceSheet::compute(reservation, self.ledger.for_reservation(reservation_id)))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn inventory(&self) -> &StockBook {
        &self.inventory
    }

    pub fn occupancy(&self) -> &[OccupancyRecord] {
        &self.occupancy
    }

    /// cash received minus cash paid out, over the whole ledger
    pub fn cash_on_hand(&self) -> Money {
        self.ledger
            .iter()
            .filter(|e| e.method == PaymentMethod::Cash)
            .fold(Money::ZERO, |acc, e| match e.flow {
                FlowKind::Income => acc + e.amount,
                FlowKind::Expense => acc - e.amount,
                FlowKind::Charge => acc,
            })
    }

    pub(crate) fn issue_code(&mut self) -> ReservationCode {
        self.last_code = self.last_code.next();
        self.last_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_code_after_default() {
        let mut store = Store::default();
        assert_eq!(store.issue_code(), ReservationCode(1));
        assert_eq!(store.issue_code(), ReservationCode(2));
        assert_eq!(store.last_code, ReservationCode(2));
    }

    #[test]
    fn test_empty_store_has_no_cash() {
        let store = Store::new();
        assert_eq!(store.cash_on_hand(), Money::ZERO);
        assert_eq!(store.rooms().count(), 0);
    }
}
