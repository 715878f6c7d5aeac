use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::ConflictDetector;
use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::LedgerEntry;
use crate::reservation::{Guest, Reservation, Room, Stay};
use crate::state::{LifecycleEvent, OccupancyChange, OccupancyRecord};
use crate::store::Store;
use crate::types::{
    Actor, Bucket, BusinessKind, FlowKind, GuestId, PaymentMethod, PaymentOrigin, ReservationId, ReservationKind,
    ReservationStatus, RoomId, RoomStatus,
};
use crate::webhooks::{
    DocumentValidator, DocumentVerdict, FieldChange, GuestContact, IdentityPhoto, Notification, Notifier,
    StaySummary, VisitTier,
};

use super::FrontDesk;

/// room to add to the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoom {
    pub number: String,
    pub floor: u32,
    pub room_type: String,
    pub price_per_night: Money,
}

impl NewRoom {
    pub fn new(number: impl Into<String>, floor: u32, room_type: impl Into<String>, price_per_night: Money) -> Self {
        Self {
            number: number.into(),
            floor,
            room_type: room_type.into(),
            price_per_night,
        }
    }
}

/// guest identity given at booking time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub doc_number: String,
    /// falls back to the configured default
    pub doc_type: Option<String>,
}

impl GuestDetails {
    pub fn new(name: impl Into<String>, doc_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_number: doc_number.into(),
            doc_type: None,
        }
    }
}

/// booking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    pub room_id: RoomId,
    pub guest: GuestDetails,
    pub stay: Stay,
    /// custom price, replaces the computed room cost
    pub total_amount: Option<Money>,
    pub prepaid_amount: Money,
    pub prepaid_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewReservation {
    pub fn new(room_id: RoomId, guest: GuestDetails, stay: Stay) -> Self {
        Self {
            room_id,
            guest,
            stay,
            total_amount: None,
            prepaid_amount: Money::ZERO,
            prepaid_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = Some(total);
        self
    }

    pub fn with_prepaid(mut self, amount: Money, method: PaymentMethod) -> Self {
        self.prepaid_amount = amount;
        self.prepaid_method = method;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// contact details and document photo collected at the counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub phone: String,
    pub email: String,
    pub photo: IdentityPhoto,
}

/// partial reservation update, `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub room_id: Option<RoomId>,
    pub guest_name: Option<String>,
    pub guest_doc_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_amount: Option<Money>,
    pub notes: Option<String>,
}

impl<N: Notifier, V: DocumentValidator> FrontDesk<N, V> {
    /// add a room to the catalogue
    pub fn add_room(&mut self, actor: &Actor, room: NewRoom) -> Result<RoomId> {
        // validate
        if !actor.is_admin() {
            return Err(DeskError::forbidden("only admins manage rooms"));
        }
        if room.number.trim().is_empty() {
            return Err(DeskError::validation("room number is required"));
        }
        if room.price_per_night.is_negative() {
            return Err(DeskError::validation(format!(
                "nightly price cannot be negative: {}",
                room.price_per_night
            )));
        }

        self.transact("add_room", |store, _| {
            if store.rooms().any(|r| r.number == room.number) {
                return Err(DeskError::validation(format!("room {} already exists", room.number)));
            }
            let id = Uuid::new_v4();
            store.rooms.insert(
                id,
                Room {
                    id,
                    number: room.number,
                    floor: room.floor,
                    room_type: room.room_type,
                    price_per_night: room.price_per_night,
                    under_maintenance: false,
                },
            );
            Ok(id)
        })
    }

    /// put a free room under maintenance or release it
    pub fn set_maintenance(
        &mut self,
        actor: &Actor,
        room_id: RoomId,
        under_maintenance: bool,
        time_provider: &SafeTimeProvider,
    ) -> Result<RoomStatus> {
        let now = time_provider.now();

        self.transact("set_maintenance", |store, events| {
            let status = store.room_status(room_id)?;
            match (under_maintenance, status) {
                (true, RoomStatus::Available) | (false, RoomStatus::Maintenance) => {}
                (true, status) => {
                    return Err(DeskError::RoomUnavailable {
                        status,
                        reason: "only an available room can go under maintenance".to_string(),
                    })
                }
                (false, _) => return Err(DeskError::validation("room is not under maintenance")),
            }

            store.room_mut(room_id)?.under_maintenance = under_maintenance;
            events.emit(Event::MaintenanceToggled {
                room_id,
                under_maintenance,
                timestamp: now,
            });
            tracing::info!(%room_id, under_maintenance, actor = %actor.name, "maintenance toggled");
            store.room_status(room_id)
        })
    }

    /// book a room; status starts as reserved
    pub fn create_reservation(
        &mut self,
        actor: &Actor,
        request: NewReservation,
        time_provider: &SafeTimeProvider,
    ) -> Result<Reservation> {
        let now = time_provider.now();
        let tolerance = self.config.billing.overpayment_tolerance;
        let default_doc_type = self.config.booking.default_doc_type.clone();

        // validate
        let NewReservation {
            room_id,
            guest,
            mut stay,
            total_amount,
            prepaid_amount,
            prepaid_method,
            notes,
        } = request;

        if guest.doc_number.trim().is_empty() {
            return Err(DeskError::validation("guest document number is required"));
        }
        stay.validate().map_err(DeskError::validation)?;
        match stay.kind {
            ReservationKind::Night => {
                stay.start_time = None;
                stay.end_time = None;
            }
            ReservationKind::Hourly => {
                if let (Some(start), Some(end)) = (stay.start_time, stay.end_time) {
                    if end <= start {
                        return Err(DeskError::validation(format!(
                            "hourly stay must end after it starts ({} -> {})",
                            start, end
                        )));
                    }
                }
            }
        }

        let room = self.store.room(room_id)?;
        let total = total_amount.unwrap_or_else(|| stay.price_at(room.price_per_night));
        if total.is_negative() {
            return Err(DeskError::validation(format!("total amount cannot be negative: {}", total)));
        }
        if prepaid_amount.is_negative() {
            return Err(DeskError::validation(format!(
                "prepaid amount cannot be negative: {}",
                prepaid_amount
            )));
        }
        if prepaid_amount.as_decimal() > total.as_decimal() + tolerance {
            return Err(DeskError::validation(format!(
                "prepaid amount {} exceeds the total {}",
                prepaid_amount, total
            )));
        }
        if prepaid_method == PaymentMethod::RoomCharge {
            return Err(DeskError::validation("room charge is not a payment method"));
        }
        let existing_guest = self.store.guest_by_doc(guest.doc_number.trim()).is_some();
        if !existing_guest && guest.name.trim().is_empty() {
            return Err(DeskError::validation("guest name is required for a new guest"));
        }

        self.transact("create_reservation", |store, events| {
            let guest_id = find_or_create_guest(store, &guest, &default_doc_type);

            ConflictDetector::new(room_id, &stay).check(store.reservations_for_room(room_id))?;

            let code = store.issue_code();
            let id = Uuid::new_v4();
            let reservation = Reservation {
                id,
                code,
                room_id,
                guest_id,
                stay,
                status: ReservationStatus::Reserved,
                total_amount: total,
                paid_amount: prepaid_amount,
                prepaid_amount,
                notes,
                created_by: Some(actor.name.clone()),
                created_at: now,
                last_status_change: now,
                deleted_at: None,
            };
            store.reservations.insert(id, reservation.clone());

            if prepaid_amount.is_positive() {
                let guest_name = store.guest(guest_id)?.name.clone();
                store.ledger.record(LedgerEntry {
                    id: Uuid::new_v4(),
                    reservation_id: Some(id),
                    room_id: Some(room_id),
                    flow: FlowKind::Income,
                    kind: BusinessKind::ReservationPayment,
                    amount: prepaid_amount,
                    method: prepaid_method,
                    bucket: Some(Bucket::Room),
                    origin: Some(PaymentOrigin::Generic),
                    lines: Vec::new(),
                    category: "Habitación".to_string(),
                    description: Some(format!("Adelanto Reserva #{} - {}", code, guest_name)),
                    evidence: None,
                    created_by: Some(actor.name.clone()),
                    recorded_at: now,
                });
            }

            events.emit(Event::ReservationCreated {
                reservation_id: id,
                code,
                room_id,
                guest_id,
                start_date: stay.start_date,
                end_date: stay.end_date,
                total_amount: total,
                prepaid_amount,
                timestamp: now,
            });
            tracing::info!(%code, %room_id, total = %total, "reservation created");
            Ok(reservation)
        })
    }

    /// run the document reader against the guest's document number
    pub fn validate_document(&self, reservation_id: ReservationId, photo: &IdentityPhoto) -> Result<DocumentVerdict> {
        if photo.bytes.is_empty() {
            return Err(DeskError::validation("identity photo is empty"));
        }
        let reservation = self.store.reservation(reservation_id)?;
        let guest = self.store.guest(reservation.guest_id)?;

        self.validator
            .validate(photo, &guest.doc_number)
            .map_err(|e| {
                tracing::warn!(%reservation_id, error = %e, "document validation unavailable");
                DeskError::DocumentRejected {
                    message: e.to_string(),
                    extracted: None,
                }
            })
    }

    /// reserved -> checked_in, room becomes occupied
    pub fn check_in(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        request: CheckInRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Reservation> {
        let now = time_provider.now();

        // validate
        let phone = request.phone.trim().to_string();
        let email = request.email.trim().to_string();
        if phone.is_empty() || email.is_empty() || request.photo.bytes.is_empty() {
            return Err(DeskError::validation(
                "identity photo, phone and email are required for check-in",
            ));
        }
        {
            let reservation = self.store.reservation(reservation_id)?;
            reservation.status.apply(LifecycleEvent::CheckIn)?;
            ensure_room_free(&self.store, reservation.room_id)?;
        }

        let verdict = self.validate_document(reservation_id, &request.photo)?;
        if !verdict.success {
            return Err(DeskError::DocumentRejected {
                message: verdict
                    .message
                    .unwrap_or_else(|| "document number does not match the reservation".to_string()),
                extracted: verdict.extracted,
            });
        }

        let photo_ref = request.photo.file_name.clone();
        let checked_in = self.transact("check_in", |store, events| {
            let reservation = store.reservation(reservation_id)?.clone();
            let next = reservation.status.apply(LifecycleEvent::CheckIn)?;
            ensure_room_free(store, reservation.room_id)?;

            let guest = store.guest_mut(reservation.guest_id)?;
            guest.phone = Some(phone);
            guest.email = Some(email);
            guest.id_photo = Some(photo_ref);
            guest.visit_count += 1;
            guest.last_visit = Some(now);
            let visit_count = guest.visit_count;

            let updated = transition(store, events, reservation_id, next, now)?;
            store.occupancy.push(OccupancyRecord {
                room_id: reservation.room_id,
                reservation_id: Some(reservation_id),
                change: OccupancyChange::Occupied,
                recorded_at: now,
            });

            events.emit(Event::GuestCheckedIn {
                reservation_id,
                guest_id: reservation.guest_id,
                room_id: reservation.room_id,
                visit_count,
                timestamp: now,
            });
            tracing::info!(code = %reservation.code, visit_count, "guest checked in");
            Ok(updated)
        })?;

        if let (Ok(guest), Ok(room)) = (
            self.store.guest(checked_in.guest_id),
            self.store.room(checked_in.room_id),
        ) {
            let notification = Notification::CheckIn {
                guest: GuestContact {
                    name: guest.name.clone(),
                    phone: guest.phone.clone(),
                    email: guest.email.clone(),
                    visit_count: guest.visit_count,
                    doc_number: guest.doc_number.clone(),
                },
                reservation: StaySummary {
                    room_number: room.number.clone(),
                    start_date: checked_in.stay.start_date,
                    end_date: checked_in.stay.end_date,
                },
                message_type: VisitTier::from_visit_count(guest.visit_count),
                timestamp: now,
            };
            self.publish(notification);
        }

        tracing::debug!(actor = %actor.name, "check-in complete");
        Ok(checked_in)
    }

    /// checked_in -> checked_out once the debt is settled, room goes to cleaning
    pub fn check_out(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Reservation> {
        let now = time_provider.now();
        let tolerance = self.config.billing.checkout_tolerance;

        let checked_out = self.transact("check_out", |store, events| {
            let reservation = store.reservation(reservation_id)?.clone();
            let next = reservation.status.apply(LifecycleEvent::CheckOut)?;

            let debt = store.balance(reservation_id)?.outstanding();
            if debt.as_decimal() > tolerance {
                return Err(DeskError::DebtRemaining { debt });
            }

            let updated = transition(store, events, reservation_id, next, now)?;
            store.occupancy.push(OccupancyRecord {
                room_id: reservation.room_id,
                reservation_id: Some(reservation_id),
                change: OccupancyChange::Vacated,
                recorded_at: now,
            });

            events.emit(Event::GuestCheckedOut {
                reservation_id,
                room_id: reservation.room_id,
                total_paid: updated.paid_amount,
                timestamp: now,
            });
            tracing::info!(code = %reservation.code, actor = %actor.name, "guest checked out");
            Ok(updated)
        })?;

        if let (Ok(guest), Ok(room)) = (
            self.store.guest(checked_out.guest_id),
            self.store.room(checked_out.room_id),
        ) {
            let notification = Notification::CheckOut {
                guest_name: guest.name.clone(),
                guest_phone: guest.phone.clone(),
                room_number: room.number.clone(),
                timestamp: now,
            };
            self.publish(notification);
        }

        Ok(checked_out)
    }

    /// cleaning -> available; completes the stay that left the room dirty
    pub fn mark_room_clean(
        &mut self,
        actor: &Actor,
        room_id: RoomId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<ReservationId>> {
        let now = time_provider.now();

        self.transact("mark_room_clean", |store, events| {
            let status = store.room_status(room_id)?;
            if status != RoomStatus::Cleaning {
                return Err(DeskError::RoomUnavailable {
                    status,
                    reason: "room is not waiting for cleaning".to_string(),
                });
            }

            let vacated_by = store
                .occupancy
                .iter()
                .rev()
                .find(|r| r.room_id == room_id && r.change == OccupancyChange::Vacated)
                .and_then(|r| r.reservation_id);

            let mut completed = None;
            if let Some(reservation_id) = vacated_by {
                let status = store.reservation(reservation_id).map(|r| r.status);
                if let Ok(ReservationStatus::CheckedOut) = status {
                    let next = ReservationStatus::CheckedOut.apply(LifecycleEvent::CompleteCleaning)?;
                    transition(store, events, reservation_id, next, now)?;
                    completed = Some(reservation_id);
                }
            }

            store.occupancy.push(OccupancyRecord {
                room_id,
                reservation_id: completed,
                change: OccupancyChange::Cleaned,
                recorded_at: now,
            });
            events.emit(Event::RoomCleaned {
                room_id,
                reservation_id: completed,
                timestamp: now,
            });
            tracing::info!(%room_id, actor = %actor.name, "room cleaned");
            Ok(completed)
        })
    }

    /// amend a reservation; counters may only touch end date, total and notes
    pub fn update_reservation(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        mut update: ReservationUpdate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<FieldChange>> {
        let now = time_provider.now();
        let tolerance = self.config.billing.overpayment_tolerance;

        // validate
        update.guest_doc_number = update.guest_doc_number.map(|d| d.trim().to_string());
        let current = self.store.reservation(reservation_id)?.clone();
        let current_guest = self.store.guest(current.guest_id)?.clone();
        if !actor.is_admin() {
            let restricted = [
                ("room", update.room_id.map_or(false, |id| id != current.room_id)),
                (
                    "guest name",
                    update.guest_name.as_ref().map_or(false, |n| *n != current_guest.name),
                ),
                (
                    "guest document",
                    update
                        .guest_doc_number
                        .as_ref()
                        .map_or(false, |d| *d != current_guest.doc_number),
                ),
                (
                    "start date",
                    update.start_date.map_or(false, |d| d != current.stay.start_date),
                ),
            ];
            if let Some((field, _)) = restricted.iter().find(|(_, changed)| *changed) {
                return Err(DeskError::forbidden(format!("counter staff cannot change the {}", field)));
            }
        }
        if let Some(total) = update.total_amount {
            if total.is_negative() {
                return Err(DeskError::validation(format!("total amount cannot be negative: {}", total)));
            }
        }

        let changes = self.transact("update_reservation", |store, events| {
            let mut reservation = store.reservation(reservation_id)?.clone();
            reservation.status.apply(LifecycleEvent::Amend)?;
            let mut changes = Vec::new();

            // guest identity
            let mut guest = store.guest(reservation.guest_id)?.clone();
            if let Some(name) = update.guest_name.filter(|n| *n != guest.name) {
                if name.trim().is_empty() {
                    return Err(DeskError::validation("guest name cannot be empty"));
                }
                changes.push(FieldChange::new("guest_name", &guest.name, &name));
                guest.name = name;
            }
            if let Some(doc) = update.guest_doc_number.filter(|d| *d != guest.doc_number) {
                if doc.trim().is_empty() {
                    return Err(DeskError::validation("guest document cannot be empty"));
                }
                if store.guest_by_doc(&doc).map_or(false, |other| other.id != guest.id) {
                    return Err(DeskError::validation(format!("document {} belongs to another guest", doc)));
                }
                changes.push(FieldChange::new("guest_doc_number", &guest.doc_number, &doc));
                guest.doc_number = doc;
            }

            // room and dates
            let mut rebook = false;
            if let Some(room_id) = update.room_id.filter(|id| *id != reservation.room_id) {
                if reservation.status == ReservationStatus::CheckedIn {
                    return Err(DeskError::validation("check the guest out before moving rooms"));
                }
                let old_room = store.room(reservation.room_id)?;
                let new_room = store.room(room_id)?;
                changes.push(FieldChange::new(
                    "room",
                    format!("#{} ({})", old_room.number, old_room.room_type),
                    format!("#{} ({})", new_room.number, new_room.room_type),
                ));
                reservation.room_id = room_id;
                rebook = true;
            }
            if let Some(start) = update.start_date.filter(|d| *d != reservation.stay.start_date) {
                changes.push(FieldChange::new("start_date", reservation.stay.start_date, start));
                reservation.stay.start_date = start;
                rebook = true;
            }
            if let Some(end) = update.end_date.filter(|d| *d != reservation.stay.end_date) {
                changes.push(FieldChange::new("end_date", reservation.stay.end_date, end));
                reservation.stay.end_date = end;
                rebook = true;
            }
            if rebook {
                reservation.stay.validate().map_err(DeskError::validation)?;
                if reservation.status.blocks_booking() {
                    let others = store.reservations_for_room(reservation.room_id);
                    ConflictDetector::new(reservation.room_id, &reservation.stay)
                        .ignoring(reservation_id)
                        .check(others)?;
                }
            }

            // billing and notes
            if let Some(total) = update.total_amount.filter(|t| *t != reservation.total_amount) {
                changes.push(FieldChange::new(
                    "total_amount",
                    format!("S/ {}", reservation.total_amount),
                    format!("S/ {}", total),
                ));
                reservation.total_amount = total;

                let consumption = store.balance(reservation_id)?.consumption_total();
                let ceiling = (total + consumption).as_decimal() + tolerance;
                if reservation.paid_amount.as_decimal() > ceiling {
                    return Err(DeskError::validation(format!(
                        "total {} is below the {} already paid",
                        total + consumption,
                        reservation.paid_amount
                    )));
                }
            }
            if let Some(notes) = update.notes.filter(|n| Some(n) != reservation.notes.as_ref()) {
                changes.push(FieldChange::new(
                    "notes",
                    reservation.notes.as_deref().unwrap_or("(empty)"),
                    &notes,
                ));
                reservation.notes = Some(notes);
            }

            if changes.is_empty() {
                return Ok(changes);
            }

            store.guests.insert(guest.id, guest);
            store.reservations.insert(reservation_id, reservation);
            events.emit(Event::ReservationAmended {
                reservation_id,
                fields: changes.iter().map(|c| c.field.clone()).collect(),
                timestamp: now,
            });
            tracing::info!(%reservation_id, changed = changes.len(), "reservation amended");
            Ok(changes)
        })?;

        if !changes.is_empty() {
            self.publish(Notification::ReservationUpdate {
                reservation_code: current.code,
                changed_fields: changes.clone(),
                updated_by: actor.name.clone(),
                timestamp: now,
            });
        }

        Ok(changes)
    }

    /// soft delete; the ledger keeps every entry
    pub fn delete_reservation(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        if !actor.is_admin() {
            return Err(DeskError::forbidden("only admins delete reservations"));
        }
        let now = time_provider.now();

        self.transact("delete_reservation", |store, events| {
            let reservation = store.reservation(reservation_id)?.clone();
            let next = reservation.status.apply(LifecycleEvent::Delete)?;

            let sheet = store.balance(reservation_id)?;
            if sheet.paid < sheet.consumption_total() {
                return Err(DeskError::UnpaidConsumption {
                    charges: sheet.consumption_total(),
                    paid: sheet.paid,
                });
            }

            transition(store, events, reservation_id, next, now)?;
            store.reservation_mut(reservation_id)?.deleted_at = Some(now);
            events.emit(Event::ReservationDeleted {
                reservation_id,
                timestamp: now,
            });
            tracing::info!(code = %reservation.code, "reservation deleted");
            Ok(())
        })
    }
}

/// the room gate checked before anyone moves in
fn ensure_room_free(store: &Store, room_id: RoomId) -> Result<()> {
    let status = store.room_status(room_id)?;
    let reason = match status {
        RoomStatus::Available => return Ok(()),
        RoomStatus::Occupied => "check out the current guest before checking in a new one",
        RoomStatus::Cleaning => "mark the room clean before checking in",
        RoomStatus::Maintenance => "room is under maintenance",
    };
    Err(DeskError::RoomUnavailable {
        status,
        reason: reason.to_string(),
    })
}

fn find_or_create_guest(store: &mut Store, details: &GuestDetails, default_doc_type: &str) -> GuestId {
    let doc_number = details.doc_number.trim();
    if let Some(existing) = store.guest_by_doc(doc_number) {
        return existing.id;
    }

    let id = Uuid::new_v4();
    store.guests.insert(
        id,
        Guest {
            id,
            name: details.name.trim().to_string(),
            doc_type: details.doc_type.clone().unwrap_or_else(|| default_doc_type.to_string()),
            doc_number: doc_number.to_string(),
            phone: None,
            email: None,
            id_photo: None,
            visit_count: 0,
            last_visit: None,
        },
    );
    id
}

/// set a new status and record the change
fn transition(
    store: &mut Store,
    events: &mut EventStore,
    reservation_id: ReservationId,
    new_status: ReservationStatus,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let reservation = store.reservation_mut(reservation_id)?;
    let old_status = reservation.status;
    reservation.update_status(new_status, now);

    events.emit(Event::StatusChanged {
        reservation_id,
        old_status,
        new_status,
        timestamp: now,
    });
    Ok(reservation.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontdesk::test_support::*;
    use crate::ledger::LedgerEntry;
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_night_reservation() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);

        let time = clock();
        let request = NewReservation::new(room_id, guest("45871236"), Stay::nights(date(1), date(3)))
            .with_prepaid(Money::from_major(50), PaymentMethod::Yape);
        let reservation = desk.create_reservation(&counter(), request, &time).unwrap();

        assert_eq!(reservation.status, ReservationStatus::Reserved);
        assert_eq!(reservation.total_amount, Money::from_major(198));
        assert_eq!(reservation.paid_amount, Money::from_major(50));
        assert_eq!(reservation.code.0, 1);

        let entries: Vec<&LedgerEntry> = desk.store().ledger().for_reservation(reservation.id).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, PaymentMethod::Yape);
        assert_eq!(entries[0].origin, Some(PaymentOrigin::Generic));

        let guest = desk.store().guest(reservation.guest_id).unwrap();
        assert_eq!(guest.doc_type, "DNI");
        assert_eq!(guest.visit_count, 0);
    }

    #[test]
    fn test_hourly_total_is_flat_and_custom_price_wins() {
        let mut desk = desk();
        let room_id = room(&mut desk, "102", 80);
        let time = clock();

        let hourly = Stay::hourly(
            date(2),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        let reservation = desk
            .create_reservation(&counter(), NewReservation::new(room_id, guest("1"), hourly), &time)
            .unwrap();
        assert_eq!(reservation.total_amount, Money::from_major(80));

        let custom = NewReservation::new(room_id, guest("2"), Stay::nights(date(5), date(8)))
            .with_total(Money::from_decimal(dec!(150.50)));
        let reservation = desk.create_reservation(&counter(), custom, &time).unwrap();
        assert_eq!(reservation.total_amount, Money::from_decimal(dec!(150.50)));
    }

    #[test]
    fn test_create_rejects_bad_requests() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let time = clock();

        let same_day = NewReservation::new(room_id, guest("1"), Stay::nights(date(3), date(3)));
        assert!(matches!(
            desk.create_reservation(&counter(), same_day, &time),
            Err(DeskError::Validation { .. })
        ));

        let negative = NewReservation::new(room_id, guest("1"), Stay::nights(date(3), date(4)))
            .with_total(Money::from_major(-1));
        assert!(desk.create_reservation(&counter(), negative, &time).is_err());

        let overpaid = NewReservation::new(room_id, guest("1"), Stay::nights(date(3), date(4)))
            .with_prepaid(Money::from_major(150), PaymentMethod::Cash);
        assert!(desk.create_reservation(&counter(), overpaid, &time).is_err());

        let unknown_room = NewReservation::new(Uuid::new_v4(), guest("1"), Stay::nights(date(3), date(4)));
        assert!(matches!(
            desk.create_reservation(&counter(), unknown_room, &time),
            Err(DeskError::NotFound { entity: "room", .. })
        ));

        // nothing was written
        assert_eq!(desk.store().reservations().count(), 0);
        assert!(desk.store().ledger().is_empty());
    }

    #[test]
    fn test_conflict_rolls_back_guest_and_code() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        book(&mut desk, room_id, "1", 1, 5);
        let time = clock();

        let overlapping = NewReservation::new(room_id, guest("2"), Stay::nights(date(3), date(7)));
        let err = desk.create_reservation(&counter(), overlapping, &time).unwrap_err();
        assert!(matches!(err, DeskError::Conflict { .. }));
        assert!(desk.store().guest_by_doc("2").is_none());

        let touching = NewReservation::new(room_id, guest("2"), Stay::nights(date(5), date(7)));
        let reservation = desk.create_reservation(&counter(), touching, &time).unwrap();
        assert_eq!(reservation.code.0, 2);
    }

    #[test]
    fn test_existing_guest_is_reused() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let first = book(&mut desk, room_id, "45871236", 1, 2);
        let second = book(&mut desk, room_id, "45871236", 3, 4);

        let store = desk.store();
        assert_eq!(
            store.reservation(first).unwrap().guest_id,
            store.reservation(second).unwrap().guest_id
        );
    }

    #[test]
    fn test_check_in_flow() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "45871236", 1, 3);

        check_in(&mut desk, id, "45871236");

        let store = desk.store();
        assert_eq!(store.reservation(id).unwrap().status, ReservationStatus::CheckedIn);
        assert_eq!(store.room_status(room_id).unwrap(), RoomStatus::Occupied);
        let guest = store.guest_by_doc("45871236").unwrap();
        assert_eq!(guest.visit_count, 1);
        assert_eq!(guest.phone.as_deref(), Some("987654321"));
        assert_eq!(guest.id_photo.as_deref(), Some("dni.jpg"));

        let sent = desk.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Notification::CheckIn { message_type: VisitTier::FirstVisit, .. }));
    }

    #[test]
    fn test_check_in_requires_contact_and_matching_document() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "45871236", 1, 3);
        let time = clock();

        let mut missing_email = check_in_request("45871236");
        missing_email.email = " ".to_string();
        assert!(matches!(
            desk.check_in(&counter(), id, missing_email, &time),
            Err(DeskError::Validation { .. })
        ));

        let err = desk
            .check_in(&counter(), id, check_in_request("99999999"), &time)
            .unwrap_err();
        assert!(matches!(err, DeskError::DocumentRejected { extracted: Some(ref d), .. } if d == "99999999"));
        assert_eq!(desk.store().reservation(id).unwrap().status, ReservationStatus::Reserved);
        assert_eq!(desk.store().guest_by_doc("45871236").unwrap().visit_count, 0);
    }

    #[test]
    fn test_check_in_gate_blocks_occupied_and_dirty_rooms() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 60);
        let time = clock();

        let slot = |h: u32| {
            Stay::hourly(
                date(2),
                NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(h + 2, 0, 0).unwrap(),
            )
        };
        let first = desk
            .create_reservation(&counter(), NewReservation::new(room_id, guest("1"), slot(10)), &time)
            .unwrap()
            .id;
        let second = desk
            .create_reservation(&counter(), NewReservation::new(room_id, guest("2"), slot(13)), &time)
            .unwrap()
            .id;

        check_in(&mut desk, first, "1");
        let err = desk
            .check_in(&counter(), second, check_in_request("2"), &time)
            .unwrap_err();
        assert!(matches!(err, DeskError::RoomUnavailable { status: RoomStatus::Occupied, .. }));

        desk.add_payment(
            &counter(),
            first,
            crate::payments::PaymentRequest::new(Money::from_major(60), PaymentMethod::Cash),
            &time,
        )
        .unwrap();
        desk.check_out(&counter(), first, &time).unwrap();

        let err = desk
            .check_in(&counter(), second, check_in_request("2"), &time)
            .unwrap_err();
        assert!(matches!(err, DeskError::RoomUnavailable { status: RoomStatus::Cleaning, .. }));

        desk.mark_room_clean(&counter(), room_id, &time).unwrap();
        check_in(&mut desk, second, "2");
    }

    #[test]
    fn test_checkout_needs_settled_debt() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "1", 1, 3);
        check_in(&mut desk, id, "1");
        let time = clock();

        let err = desk.check_out(&counter(), id, &time).unwrap_err();
        assert_eq!(err, DeskError::DebtRemaining { debt: Money::from_major(198) });
        assert_eq!(desk.store().room_status(room_id).unwrap(), RoomStatus::Occupied);
    }

    #[test]
    fn test_mark_room_clean_completes_stay() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "1", 1, 2);
        check_in(&mut desk, id, "1");
        let time = clock();

        // nothing to clean yet
        assert!(desk.mark_room_clean(&counter(), room_id, &time).is_err());

        desk.add_payment(
            &counter(),
            id,
            crate::payments::PaymentRequest::new(Money::from_major(99), PaymentMethod::Card),
            &time,
        )
        .unwrap();
        desk.check_out(&counter(), id, &time).unwrap();
        assert_eq!(desk.store().room_status(room_id).unwrap(), RoomStatus::Cleaning);

        let completed = desk.mark_room_clean(&counter(), room_id, &time).unwrap();
        assert_eq!(completed, Some(id));
        assert_eq!(desk.store().reservation(id).unwrap().status, ReservationStatus::Completed);
        assert_eq!(desk.store().room_status(room_id).unwrap(), RoomStatus::Available);
    }

    #[test]
    fn test_counter_update_restrictions() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let other_room = room(&mut desk, "102", 99);
        let id = book(&mut desk, room_id, "1", 1, 3);
        let time = clock();

        let move_room = ReservationUpdate {
            room_id: Some(other_room),
            ..ReservationUpdate::default()
        };
        assert!(matches!(
            desk.update_reservation(&counter(), id, move_room.clone(), &time),
            Err(DeskError::Forbidden { .. })
        ));
        let changes = desk.update_reservation(&admin(), id, move_room, &time).unwrap();
        assert_eq!(changes[0].field, "room");

        let extend = ReservationUpdate {
            end_date: Some(date(4)),
            notes: Some("late arrival".to_string()),
            ..ReservationUpdate::default()
        };
        let changes = desk.update_reservation(&counter(), id, extend, &time).unwrap();
        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["end_date", "notes"]);

        let sent = desk.notifier().sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Notification::ReservationUpdate { updated_by, .. } if updated_by == "luis"));
    }

    #[test]
    fn test_update_trims_document_number() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "45871236", 1, 3);
        let time = clock();

        let padded = ReservationUpdate {
            guest_doc_number: Some(" 45871236 ".to_string()),
            ..ReservationUpdate::default()
        };
        let changes = desk.update_reservation(&counter(), id, padded, &time).unwrap();
        assert!(changes.is_empty());
        assert!(desk.notifier().sent().is_empty());

        let replaced = ReservationUpdate {
            guest_doc_number: Some("  70000001\t".to_string()),
            ..ReservationUpdate::default()
        };
        let changes = desk.update_reservation(&admin(), id, replaced, &time).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "guest_doc_number");

        let guest_id = desk.store().reservation(id).unwrap().guest_id;
        assert_eq!(desk.store().guest(guest_id).unwrap().doc_number, "70000001");
        assert_eq!(desk.store().guest_by_doc("70000001").map(|g| g.id), Some(guest_id));
        assert_eq!(desk.store().guests.len(), 1);
    }

    #[test]
    fn test_update_rechecks_conflicts() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let first = book(&mut desk, room_id, "1", 1, 3);
        book(&mut desk, room_id, "2", 5, 7);
        let time = clock();

        let extend = ReservationUpdate {
            end_date: Some(date(6)),
            ..ReservationUpdate::default()
        };
        let err = desk.update_reservation(&counter(), first, extend, &time).unwrap_err();
        assert!(matches!(err, DeskError::Conflict { .. }));
        assert_eq!(desk.store().reservation(first).unwrap().stay.end_date, date(3));
        assert!(desk.notifier().sent().is_empty());
    }

    #[test]
    fn test_update_keeps_paid_within_total() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let time = clock();
        let request = NewReservation::new(room_id, guest("1"), Stay::nights(date(1), date(3)))
            .with_prepaid(Money::from_major(150), PaymentMethod::Cash);
        let id = desk.create_reservation(&counter(), request, &time).unwrap().id;

        let cut = ReservationUpdate {
            total_amount: Some(Money::from_major(100)),
            ..ReservationUpdate::default()
        };
        assert!(desk.update_reservation(&counter(), id, cut, &time).is_err());
    }

    #[test]
    fn test_delete_rules() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let id = book(&mut desk, room_id, "1", 1, 3);
        check_in(&mut desk, id, "1");
        let time = clock();

        assert!(matches!(
            desk.delete_reservation(&counter(), id, &time),
            Err(DeskError::Forbidden { .. })
        ));
        assert!(matches!(
            desk.delete_reservation(&admin(), id, &time),
            Err(DeskError::InvalidTransition { status: ReservationStatus::CheckedIn, .. })
        ));

        let later = book(&mut desk, room_id, "2", 10, 12);
        desk.delete_reservation(&admin(), later, &time).unwrap();
        assert!(matches!(
            desk.store().reservation(later),
            Err(DeskError::NotFound { .. })
        ));

        // the code is not reused
        let next = book(&mut desk, room_id, "3", 10, 12);
        assert_eq!(desk.store().reservation(next).unwrap().code.0, 3);
    }

    #[test]
    fn test_maintenance_only_on_available_rooms() {
        let mut desk = desk();
        let room_id = room(&mut desk, "101", 99);
        let time = clock();

        assert!(desk.set_maintenance(&counter(), room_id, false, &time).is_err());
        assert_eq!(desk.set_maintenance(&counter(), room_id, true, &time).unwrap(), RoomStatus::Maintenance);

        let id = book(&mut desk, room_id, "1", 1, 3);
        let err = desk
            .check_in(&counter(), id, check_in_request("1"), &time)
            .unwrap_err();
        assert!(matches!(err, DeskError::RoomUnavailable { status: RoomStatus::Maintenance, .. }));

        assert_eq!(desk.set_maintenance(&admin(), room_id, false, &time).unwrap(), RoomStatus::Available);
        check_in(&mut desk, id, "1");
        assert!(desk.set_maintenance(&admin(), room_id, true, &time).is_err());
    }
}
