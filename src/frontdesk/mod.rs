pub mod billing;
pub mod lifecycle;
pub mod views;

use crate::config::DeskConfig;
use crate::errors::Result;
use crate::events::EventStore;
use crate::payments::PaymentAllocator;
use crate::store::Store;
use crate::webhooks::{DocumentValidator, Notification, Notifier};

pub use billing::{EntryEdit, ExpenseRequest, SaleItems, SaleReceipt, SaleRequest};
pub use lifecycle::{CheckInRequest, GuestDetails, NewReservation, NewRoom, ReservationUpdate};
pub use views::{
    BalanceView, CashSummary, MethodTotal, ReservationDetail, ReservationFilter, ReservationRow, RoomView,
};

/// front desk: owns the store and runs every mutation as one transaction
pub struct FrontDesk<N: Notifier, V: DocumentValidator> {
    pub config: DeskConfig,
    pub events: EventStore,
    store: Store,
    notifier: N,
    validator: V,
}

impl<N: Notifier, V: DocumentValidator> FrontDesk<N, V> {
    /// create new desk
    pub fn new(config: DeskConfig, notifier: N, validator: V) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            events: EventStore::new(),
            store: Store::new(),
            notifier,
            validator,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn allocator(&self) -> PaymentAllocator {
        PaymentAllocator::new(self.config.billing.allocation_epsilon)
    }

    /// run `op` against a copy of the store; the copy and its events replace
    /// the live state only if `op` succeeds
    ///
    /// The whole store is cloned on every call, so each mutation costs time
    /// and memory linear in the number of rooms, guests, reservations, ledger
    /// entries and stock movements held.
    fn transact<T, F>(&mut self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&mut Store, &mut EventStore) -> Result<T>,
    {
        let mut staged = self.store.clone();
        let mut events = EventStore::new();

        match op(&mut staged, &mut events) {
            Ok(value) => {
                let emitted = events.events().len();
                self.store = staged;
                self.events.extend(events.take_events());
                tracing::debug!(operation, events = emitted, "transaction committed");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }

    /// fire and forget, failures never undo the committed operation
    fn publish(&self, notification: Notification) {
        let event = notification.label();
        if let Err(e) = self.notifier.notify(notification) {
            tracing::warn!(event, error = %e, "notification dropped");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::decimal::Money;
    use crate::reservation::Stay;
    use crate::types::{Actor, ReservationId, RoomId};
    use crate::webhooks::{EchoDocumentValidator, IdentityPhoto, MemoryNotifier};
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    pub type TestDesk = FrontDesk<MemoryNotifier, EchoDocumentValidator>;

    pub fn clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap()))
    }

    pub fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    pub fn admin() -> Actor {
        Actor::admin("marta")
    }

    pub fn counter() -> Actor {
        Actor::counter("luis")
    }

    pub fn desk() -> TestDesk {
        FrontDesk::new(DeskConfig::default(), MemoryNotifier::new(), EchoDocumentValidator).unwrap()
    }

    pub fn room(desk: &mut TestDesk, number: &str, price: i64) -> RoomId {
        desk.add_room(&admin(), NewRoom::new(number, 1, "doble", Money::from_major(price)))
            .unwrap()
    }

    pub fn guest(doc: &str) -> GuestDetails {
        GuestDetails::new("Rosa Quispe", doc)
    }

    /// book nights `from..to` in january
    pub fn book(desk: &mut TestDesk, room_id: RoomId, doc: &str, from: u32, to: u32) -> ReservationId {
        let time = clock();
        let request = NewReservation::new(room_id, guest(doc), Stay::nights(date(from), date(to)));
        desk.create_reservation(&counter(), request, &time).unwrap().id
    }

    pub fn check_in_request(doc: &str) -> CheckInRequest {
        CheckInRequest {
            phone: "987654321".to_string(),
            email: "rosa@example.com".to_string(),
            photo: IdentityPhoto::new("dni.jpg", doc.as_bytes().to_vec()),
        }
    }

    pub fn check_in(desk: &mut TestDesk, reservation_id: ReservationId, doc: &str) {
        let time = clock();
        desk.check_in(&counter(), reservation_id, check_in_request(doc), &time)
            .unwrap();
    }
}
