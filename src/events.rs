use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    Bucket, BusinessKind, EntryId, GuestId, ReservationCode, ReservationId, ReservationStatus, RoomId,
};

/// all events that can be emitted by the desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    ReservationCreated {
        reservation_id: ReservationId,
        code: ReservationCode,
        room_id: RoomId,
        guest_id: GuestId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_amount: Money,
        prepaid_amount: Money,
        timestamp: DateTime<Utc>,
    },
    GuestCheckedIn {
        reservation_id: ReservationId,
        guest_id: GuestId,
        room_id: RoomId,
        visit_count: u32,
        timestamp: DateTime<Utc>,
    },
    GuestCheckedOut {
        reservation_id: ReservationId,
        room_id: RoomId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    RoomCleaned {
        room_id: RoomId,
        reservation_id: Option<ReservationId>,
        timestamp: DateTime<Utc>,
    },
    ReservationAmended {
        reservation_id: ReservationId,
        fields: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    ReservationDeleted {
        reservation_id: ReservationId,
        timestamp: DateTime<Utc>,
    },

    // billing events
    ChargeAdded {
        reservation_id: ReservationId,
        entry_id: EntryId,
        bucket: Bucket,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ImmediatePaymentReceived {
        reservation_id: ReservationId,
        entry_id: EntryId,
        bucket: Bucket,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentAllocated {
        reservation_id: ReservationId,
        amount: Money,
        to_room: Money,
        to_mak: Money,
        to_makala: Money,
        timestamp: DateTime<Utc>,
    },
    SaleRecorded {
        entry_id: EntryId,
        kind: BusinessKind,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ExpenseRecorded {
        entry_id: EntryId,
        amount: Money,
        category: String,
        timestamp: DateTime<Utc>,
    },
    EntryEdited {
        entry_id: EntryId,
        old_amount: Money,
        new_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // room events
    MaintenanceToggled {
        room_id: RoomId,
        under_maintenance: bool,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        reservation_id: ReservationId,
        old_status: ReservationStatus,
        new_status: ReservationStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// publish events staged by a committed transaction
    pub fn extend(&mut self, staged: Vec<Event>) {
        self.events.extend(staged);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
