use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::inventory::ProductLine;
use crate::reservation::Reservation;
use crate::types::{
    Bucket, BusinessKind, EntryId, FlowKind, PaymentMethod, PaymentOrigin, ReservationId, RoomId,
};

/// one money movement, immutable except through an explicit edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub reservation_id: Option<ReservationId>,
    pub room_id: Option<RoomId>,
    pub flow: FlowKind,
    pub kind: BusinessKind,
    pub amount: Money,
    pub method: PaymentMethod,
    /// debt bucket a charge raises or a payment settles
    pub bucket: Option<Bucket>,
    /// set on reservation payments only
    pub origin: Option<PaymentOrigin>,
    pub lines: Vec<ProductLine>,
    /// category label as shown on the cash report
    pub category: String,
    pub description: Option<String>,
    pub evidence: Option<String>,
    pub created_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// consumption billed to a room and not yet paid
    pub fn is_room_charge(&self) -> bool {
        self.flow == FlowKind::Charge && self.method == PaymentMethod::RoomCharge
    }

    /// money received against a reservation balance
    pub fn is_reservation_payment(&self) -> bool {
        self.flow == FlowKind::Income && self.kind == BusinessKind::ReservationPayment
    }

    pub fn is_immediate_for(&self, bucket: Bucket) -> bool {
        self.is_reservation_payment() && self.origin == Some(PaymentOrigin::Immediate(bucket))
    }

    /// local calendar day the entry belongs to
    pub fn business_day(&self, utc_offset_minutes: i32) -> NaiveDate {
        business_day(self.recorded_at, utc_offset_minutes)
    }
}

/// calendar day of `at` in the business time zone
pub fn business_day(at: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_minutes * 60) {
        Some(offset) => at.with_timezone(&offset).date_naive(),
        None => at.date_naive(),
    }
}

/// filter for ledger listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub flow: Option<FlowKind>,
    pub kind: Option<BusinessKind>,
}

impl EntryFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &LedgerEntry, utc_offset_minutes: i32) -> bool {
        let day = entry.business_day(utc_offset_minutes);
        self.from.map_or(true, |from| day >= from)
            && self.to.map_or(true, |to| day <= to)
            && self.flow.map_or(true, |flow| entry.flow == flow)
            && self.kind.map_or(true, |kind| entry.kind == kind)
    }
}

/// append-only list of ledger entries
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: LedgerEntry) -> EntryId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// only the edit operation mutates an entry in place
    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut LedgerEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn for_reservation(&self, reservation_id: ReservationId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(move |e| e.reservation_id == Some(reservation_id))
    }

    /// sum of every payment booked against a reservation
    pub fn payments_total(&self, reservation_id: ReservationId) -> Money {
        self.for_reservation(reservation_id)
            .filter(|e| e.is_reservation_payment())
            .map(|e| e.amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// debt position of a reservation, split by bucket
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub room_cost: Money,
    pub mak_charges: Money,
    pub makala_charges: Money,
    pub immediate_mak: Money,
    pub immediate_makala: Money,
    /// running total of all payments, the reservation's `paid_amount`
    pub paid: Money,
}

impl BalanceSheet {
    /// build from the reservation and its ledger entries
    pub fn compute<'a, I>(reservation: &Reservation, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut sheet = BalanceSheet {
            room_cost: reservation.total_amount,
            paid: reservation.paid_amount,
            ..Self::default()
        };

        for entry in entries {
            if entry.reservation_id != Some(reservation.id) {
                continue;
            }
            if entry.is_room_charge() {
                match entry.bucket {
                    Some(Bucket::Mak) => sheet.mak_charges += entry.amount,
                    // charges without a product cart are restobar consumption
                    _ => sheet.makala_charges += entry.amount,
                }
            } else if entry.is_immediate_for(Bucket::Mak) {
                sheet.immediate_mak += entry.amount;
            } else if entry.is_immediate_for(Bucket::Makala) {
                sheet.immediate_makala += entry.amount;
            }
        }

        sheet
    }

    pub fn consumption_total(&self) -> Money {
        self.mak_charges + self.makala_charges
    }

    /// room cost plus every consumption charge
    pub fn total_debt(&self) -> Money {
        self.room_cost + self.consumption_total()
    }

    /// what the guest still owes, negative when overpaid
    pub fn outstanding(&self) -> Money {
        self.total_debt() - self.paid
    }

    pub fn gross(&self, bucket: Bucket) -> Money {
        match bucket {
            Bucket::Room => self.room_cost,
            Bucket::Mak => self.mak_charges,
            Bucket::Makala => self.makala_charges,
        }
    }

    pub fn immediate(&self, bucket: Bucket) -> Money {
        match bucket {
            Bucket::Room => Money::ZERO,
            Bucket::Mak => self.immediate_mak,
            Bucket::Makala => self.immediate_makala,
        }
    }

    /// part of a bucket left for generic payments
    pub fn net(&self, bucket: Bucket) -> Money {
        (self.gross(bucket) - self.immediate(bucket)).floor_zero()
    }

    pub fn immediate_total(&self) -> Money {
        self.immediate_mak + self.immediate_makala
    }

    /// generic payments already applied, walking the waterfall from the start
    pub fn generic_paid(&self) -> Money {
        (self.paid - self.immediate_total()).floor_zero()
    }
}
