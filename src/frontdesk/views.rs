/// read-only projections of the desk state
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityGrid, GridBuilder};
use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::ledger::{BalanceSheet, EntryFilter, LedgerEntry};
use crate::reservation::{Guest, Reservation, Room};
use crate::store::Store;
use crate::types::{
    Actor, Bucket, FlowKind, PaymentMethod, ReservationCode, ReservationId, ReservationKind, ReservationStatus,
    RoomId, RoomStatus,
};
use crate::webhooks::{DocumentValidator, Notifier};

use super::FrontDesk;

/// serializable balance breakdown of a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub room_cost: Money,
    pub mak_charges: Money,
    pub makala_charges: Money,
    pub immediate_mak: Money,
    pub immediate_makala: Money,
    pub total_debt: Money,
    pub paid: Money,
    pub outstanding: Money,
    pub net_room: Money,
    pub net_mak: Money,
    pub net_makala: Money,
}

impl BalanceView {
    pub fn from_sheet(sheet: &BalanceSheet) -> Self {
        BalanceView {
            room_cost: sheet.room_cost,
            mak_charges: sheet.mak_charges,
            makala_charges: sheet.makala_charges,
            immediate_mak: sheet.immediate_mak,
            immediate_makala: sheet.immediate_makala,
            total_debt: sheet.total_debt(),
            paid: sheet.paid,
            outstanding: sheet.outstanding().floor_zero(),
            net_room: sheet.net(Bucket::Room),
            net_mak: sheet.net(Bucket::Mak),
            net_makala: sheet.net(Bucket::Makala),
        }
    }
}

/// one line of the reservation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRow {
    pub id: ReservationId,
    pub code: ReservationCode,
    pub room_id: RoomId,
    pub room_number: String,
    pub guest_name: String,
    pub guest_doc_number: String,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub consumption_total: Money,
    pub outstanding: Money,
}

impl ReservationRow {
    fn build(store: &Store, reservation: &Reservation) -> Result<Self> {
        let room = store.room(reservation.room_id)?;
        let guest = store.guest(reservation.guest_id)?;
        let sheet = store.balance(reservation.id)?;

        Ok(ReservationRow {
            id: reservation.id,
            code: reservation.code,
            room_id: room.id,
            room_number: room.number.clone(),
            guest_name: guest.name.clone(),
            guest_doc_number: guest.doc_number.clone(),
            status: reservation.status,
            kind: reservation.stay.kind,
            start_date: reservation.stay.start_date,
            end_date: reservation.stay.end_date,
            start_time: reservation.stay.start_time,
            end_time: reservation.stay.end_time,
            total_amount: reservation.total_amount,
            paid_amount: reservation.paid_amount,
            consumption_total: sheet.consumption_total(),
            outstanding: sheet.outstanding().floor_zero(),
        })
    }
}

/// reservation list filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationFilter {
    /// counters default to reserved and checked in, admins to everything
    pub statuses: Option<Vec<ReservationStatus>>,
    /// stays overlapping `[from, to]`
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// substring of the guest document number
    pub doc_query: Option<String>,
}

impl ReservationFilter {
    pub fn with_statuses(mut self, statuses: Vec<ReservationStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_doc(mut self, doc_query: impl Into<String>) -> Self {
        self.doc_query = Some(doc_query.into());
        self
    }

    fn matches(&self, actor: &Actor, reservation: &Reservation, guest: &Guest) -> bool {
        let status_ok = match &self.statuses {
            Some(statuses) => statuses.contains(&reservation.status),
            None => actor.is_admin() || reservation.status.is_active(),
        };
        status_ok
            && self.from.map_or(true, |from| reservation.stay.end_date >= from)
            && self.to.map_or(true, |to| reservation.stay.start_date <= to)
            && self
                .doc_query
                .as_deref()
                .map_or(true, |q| guest.doc_number.contains(q.trim()))
    }
}

/// reservation with its guest, ledger and balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationDetail {
    pub reservation: ReservationRow,
    pub guest: Guest,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub balance: BalanceView,
    pub entries: Vec<LedgerEntry>,
}

impl ReservationDetail {
    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// room list entry with its derived status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: RoomId,
    pub number: String,
    pub floor: u32,
    pub room_type: String,
    pub price_per_night: Money,
    pub status: RoomStatus,
    pub has_active_reservation: bool,
    pub has_checked_in_reservation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub amount: Money,
}

/// income and expense over a range of business days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
    /// cash income minus cash expense
    pub cash_balance: Money,
    pub by_method: Vec<MethodTotal>,
}

impl CashSummary {
    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

const REPORTED_METHODS: [PaymentMethod; 4] = [
    PaymentMethod::Cash,
    PaymentMethod::Yape,
    PaymentMethod::Card,
    PaymentMethod::Transfer,
];

impl<N: Notifier, V: DocumentValidator> FrontDesk<N, V> {
    /// live reservations visible to `actor`, by start date
    pub fn reservations(&self, actor: &Actor, filter: &ReservationFilter) -> Result<Vec<ReservationRow>> {
        let mut rows = Vec::new();
        for reservation in self.store.reservations() {
            let guest = self.store.guest(reservation.guest_id)?;
            if filter.matches(actor, reservation, guest) {
                rows.push(ReservationRow::build(&self.store, reservation)?);
            }
        }
        rows.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.code.cmp(&b.code)));
        Ok(rows)
    }

    pub fn reservation_detail(&self, reservation_id: ReservationId) -> Result<ReservationDetail> {
        let reservation = self.store.reservation(reservation_id)?;
        let sheet = self.store.balance(reservation_id)?;

        Ok(ReservationDetail {
            reservation: ReservationRow::build(&self.store, reservation)?,
            guest: self.store.guest(reservation.guest_id)?.clone(),
            notes: reservation.notes.clone(),
            created_by: reservation.created_by.clone(),
            balance: BalanceView::from_sheet(&sheet),
            entries: self.store.ledger().for_reservation(reservation_id).cloned().collect(),
        })
    }

    /// room catalogue sorted by floor and number
    pub fn rooms(&self) -> Result<Vec<RoomView>> {
        let mut views = self
            .store
            .rooms()
            .map(|room| -> Result<RoomView> {
                let mut held = self.store.reservations_for_room(room.id);
                let has_checked_in = self.store.checked_in_reservation(room.id).is_some();
                Ok(RoomView {
                    id: room.id,
                    number: room.number.clone(),
                    floor: room.floor,
                    room_type: room.room_type.clone(),
                    price_per_night: room.price_per_night,
                    status: self.store.room_status(room.id)?,
                    has_active_reservation: held.any(|r| r.status.is_active()),
                    has_checked_in_reservation: has_checked_in,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        views.sort_by(|a, b| a.floor.cmp(&b.floor).then_with(|| a.number.cmp(&b.number)));
        Ok(views)
    }

    /// calendar grid over the inclusive window `[from, to]`
    pub fn availability(&self, from: NaiveDate, to: NaiveDate) -> Result<AvailabilityGrid> {
        let builder = GridBuilder::new(from, to, self.config.booking.max_window_days)?;
        let rooms = self
            .store
            .rooms()
            .map(|room| -> Result<(&Room, RoomStatus)> { Ok((room, self.store.room_status(room.id)?)) })
            .collect::<Result<Vec<_>>>()?;

        Ok(builder.build(&rooms, self.store.reservations(), |reservation| {
            self.store.guest(reservation.guest_id).ok().map(|g| g.name.clone())
        }))
    }

    /// ledger entries matching `filter`, newest first
    pub fn entries(&self, filter: &EntryFilter) -> Vec<&LedgerEntry> {
        let offset = self.config.booking.business_utc_offset_minutes;
        let mut entries: Vec<&LedgerEntry> = self
            .store
            .ledger()
            .iter()
            .filter(|e| filter.matches(e, offset))
            .collect();
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        entries
    }

    /// money in and out over `[from, to]`; room charges are not income
    pub fn cash_summary(&self, from: NaiveDate, to: NaiveDate) -> Result<CashSummary> {
        if to < from {
            return Err(DeskError::validation(format!("range ends before it starts ({} -> {})", from, to)));
        }

        let mut summary = CashSummary {
            from,
            to,
            total_income: Money::ZERO,
            total_expense: Money::ZERO,
            balance: Money::ZERO,
            cash_balance: Money::ZERO,
            by_method: REPORTED_METHODS
                .iter()
                .map(|method| MethodTotal { method: *method, amount: Money::ZERO })
                .collect(),
        };

        for entry in self.entries(&EntryFilter::between(from, to)) {
            match entry.flow {
                FlowKind::Income => {
                    summary.total_income += entry.amount;
                    if entry.method == PaymentMethod::Cash {
                        summary.cash_balance += entry.amount;
                    }
                    if let Some(total) = summary.by_method.iter_mut().find(|t| t.method == entry.method) {
                        total.amount += entry.amount;
                    }
                }
                FlowKind::Expense => {
                    summary.total_expense += entry.amount;
                    if entry.method == PaymentMethod::Cash {
                        summary.cash_balance -= entry.amount;
                    }
                }
                FlowKind::Charge => {}
            }
        }

        summary.balance = summary.total_income - summary.total_expense;
        Ok(summary)
    }
}
