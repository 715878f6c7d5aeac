use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::events::Event;
use crate::inventory::{lines_total, CartItem, ProductLine};
use crate::ledger::LedgerEntry;
use crate::payments::{check_overpayment, PaymentRequest, PaymentResult};
use crate::state::LifecycleEvent;
use crate::store::Store;
use crate::types::{
    Actor, Bucket, BusinessKind, EntryId, FlowKind, PaymentMethod, PaymentOrigin, ProductId, ReservationId, RoomId,
};
use crate::webhooks::{DocumentValidator, Notifier};

use super::FrontDesk;

/// what was sold at the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleItems {
    /// mak: products drawn from stock
    Products(Vec<CartItem>),
    /// makala: restobar consumption at a flat amount
    Flat { amount: Money },
}

impl SaleItems {
    pub fn kind(&self) -> BusinessKind {
        match self {
            SaleItems::Products(_) => BusinessKind::MakSale,
            SaleItems::Flat { .. } => BusinessKind::MakalaSale,
        }
    }
}

/// point of sale request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: SaleItems,
    pub method: PaymentMethod,
    /// room the customer is staying in, if any
    pub room_id: Option<RoomId>,
    pub description: Option<String>,
    pub evidence: Option<String>,
}

impl SaleRequest {
    pub fn products(cart: Vec<CartItem>, method: PaymentMethod) -> Self {
        Self {
            items: SaleItems::Products(cart),
            method,
            room_id: None,
            description: None,
            evidence: None,
        }
    }

    pub fn flat(amount: Money, method: PaymentMethod) -> Self {
        Self {
            items: SaleItems::Flat { amount },
            method,
            room_id: None,
            description: None,
            evidence: None,
        }
    }

    pub fn for_room(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// entries written by a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_entry: EntryId,
    /// immediate payment booked next to a room charge
    pub payment_entry: Option<EntryId>,
    pub reservation_id: Option<ReservationId>,
    pub amount: Money,
}

/// cash taken out of the till
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
}

impl ExpenseRequest {
    pub fn new(amount: Money, category: impl Into<String>) -> Self {
        Self {
            amount,
            category: category.into(),
            description: None,
        }
    }
}

/// correction of a ledger entry, `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryEdit {
    pub amount: Option<Money>,
    pub method: Option<PaymentMethod>,
    pub description: Option<String>,
    /// new product cart, product sales only
    pub items: Option<Vec<CartItem>>,
}

impl<N: Notifier, V: DocumentValidator> FrontDesk<N, V> {
    /// register a product with its opening stock
    pub fn add_product(
        &mut self,
        actor: &Actor,
        name: &str,
        price: Money,
        opening_stock: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<ProductId> {
        if !actor.is_admin() {
            return Err(DeskError::forbidden("only admins manage products"));
        }
        let now = time_provider.now();
        self.transact("add_product", |store, _| store.inventory.add_product(name, price, opening_stock, now))
    }

    /// book incoming stock, returns the new stock level
    pub fn receive_stock(
        &mut self,
        actor: &Actor,
        product_id: ProductId,
        quantity: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<u32> {
        if !actor.is_admin() {
            return Err(DeskError::forbidden("only admins receive stock"));
        }
        let now = time_provider.now();
        let note = format!("received by {}", actor.name);
        self.transact("receive_stock", |store, _| store.inventory.receive(product_id, quantity, &note, now))
    }

    /// bill a product cart to a reservation as restobar consumption
    pub fn add_consumption(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        cart: Vec<CartItem>,
        description: Option<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<EntryId> {
        let now = time_provider.now();

        self.transact("add_consumption", |store, events| {
            let reservation = store.reservation(reservation_id)?.clone();
            reservation.status.apply(LifecycleEvent::AddCharge)?;

            let note = format!("consumption reservation #{}", reservation.code);
            let lines = store.inventory.withdraw(&cart, &note, now)?;
            let amount = lines_total(&lines);

            let entry_id = store.ledger.record(LedgerEntry {
                id: Uuid::new_v4(),
                reservation_id: Some(reservation_id),
                room_id: Some(reservation.room_id),
                flow: FlowKind::Charge,
                kind: BusinessKind::MakalaSale,
                amount,
                method: PaymentMethod::RoomCharge,
                bucket: Some(Bucket::Makala),
                origin: None,
                lines,
                category: "Restobar".to_string(),
                description: description.or_else(|| Some(format!("Consumo Reserva #{}", reservation.code))),
                evidence: None,
                created_by: Some(actor.name.clone()),
                recorded_at: now,
            });

            events.emit(Event::ChargeAdded {
                reservation_id,
                entry_id,
                bucket: Bucket::Makala,
                amount,
                timestamp: now,
            });
            tracing::info!(code = %reservation.code, amount = %amount, "consumption charged");
            Ok(entry_id)
        })
    }

    /// mak or makala sale, charged to a checked-in room when one is given
    pub fn record_sale(
        &mut self,
        actor: &Actor,
        request: SaleRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<SaleReceipt> {
        let now = time_provider.now();

        // validate
        if let SaleItems::Flat { amount } = request.items {
            if !amount.is_positive() {
                return Err(DeskError::validation(format!("sale amount must be positive, got {}", amount)));
            }
        }
        if request.method == PaymentMethod::RoomCharge && request.room_id.is_none() {
            return Err(DeskError::validation("room charge needs a room"));
        }

        self.transact("record_sale", |store, events| {
            let kind = request.items.kind();
            let bucket = match kind {
                BusinessKind::MakSale => Bucket::Mak,
                _ => Bucket::Makala,
            };

            let reservation = match request.room_id {
                Some(room_id) => {
                    store.room(room_id)?;
                    store.checked_in_reservation(room_id).cloned()
                }
                None => None,
            };
            if reservation.is_none() && request.method == PaymentMethod::RoomCharge {
                return Err(DeskError::validation("room charge needs a checked-in reservation"));
            }

            let (lines, amount) = match &request.items {
                SaleItems::Products(cart) => {
                    let lines = store.inventory.withdraw(cart, "counter sale", now)?;
                    let amount = lines_total(&lines);
                    (lines, amount)
                }
                SaleItems::Flat { amount } => (Vec::new(), *amount),
            };

            let base = SaleEntry {
                kind,
                bucket,
                amount,
                evidence: request.evidence.clone(),
                actor,
                now,
            };

            let Some(reservation) = reservation else {
                let sale_entry = store.ledger.record(base.entry(
                    FlowKind::Income,
                    request.method,
                    None,
                    request.room_id,
                    lines,
                    request.description.clone(),
                ));
                events.emit(Event::SaleRecorded {
                    entry_id: sale_entry,
                    kind,
                    amount,
                    timestamp: now,
                });
                tracing::info!(?kind, amount = %amount, "sale recorded");
                return Ok(SaleReceipt {
                    sale_entry,
                    payment_entry: None,
                    reservation_id: None,
                    amount,
                });
            };

            // always billed to the room, even when paid on the spot
            let sale_entry = store.ledger.record(base.entry(
                FlowKind::Charge,
                PaymentMethod::RoomCharge,
                Some(reservation.id),
                Some(reservation.room_id),
                lines,
                request.description.clone(),
            ));
            events.emit(Event::ChargeAdded {
                reservation_id: reservation.id,
                entry_id: sale_entry,
                bucket,
                amount,
                timestamp: now,
            });

            let mut payment_entry = None;
            if request.method != PaymentMethod::RoomCharge && amount.is_positive() {
                let mut payment = base.entry(
                    FlowKind::Income,
                    request.method,
                    Some(reservation.id),
                    Some(reservation.room_id),
                    Vec::new(),
                    Some(format!("Pago inmediato Reserva #{}", reservation.code)),
                );
                payment.kind = BusinessKind::ReservationPayment;
                payment.origin = Some(PaymentOrigin::Immediate(bucket));
                payment.category = match bucket {
                    Bucket::Mak => "Pago Inmediato (Venta Mak)".to_string(),
                    _ => "Pago Inmediato (Venta Makala)".to_string(),
                };
                let entry_id = store.ledger.record(payment);
                store.reservation_mut(reservation.id)?.paid_amount += amount;

                events.emit(Event::ImmediatePaymentReceived {
                    reservation_id: reservation.id,
                    entry_id,
                    bucket,
                    amount,
                    timestamp: now,
                });
                payment_entry = Some(entry_id);
            }

            events.emit(Event::SaleRecorded {
                entry_id: sale_entry,
                kind,
                amount,
                timestamp: now,
            });
            tracing::info!(code = %reservation.code, ?kind, amount = %amount, paid = payment_entry.is_some(), "sale charged to room");
            Ok(SaleReceipt {
                sale_entry,
                payment_entry,
                reservation_id: Some(reservation.id),
                amount,
            })
        })
    }

    /// generic payment split over room, mak and makala in waterfall order
    pub fn add_payment(
        &mut self,
        actor: &Actor,
        reservation_id: ReservationId,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentResult> {
        let now = time_provider.now();
        let billing = self.config.billing.clone();
        let allocator = self.allocator();

        // validate
        request.validate(&billing)?;

        self.transact("add_payment", |store, events| {
            let reservation = store.reservation(reservation_id)?.clone();
            reservation.status.apply(LifecycleEvent::TakePayment)?;

            let sheet = store.balance(reservation_id)?;
            check_overpayment(&sheet, request.amount, &billing)?;

            let allocation = allocator.allocate(&sheet, request.amount);
            let mut entries = Vec::with_capacity(allocation.splits.len());
            for split in &allocation.splits {
                let description = match split.bucket {
                    Bucket::Room => request
                        .description
                        .clone()
                        .unwrap_or_else(|| "Pago Habitación".to_string()),
                    Bucket::Mak => "Pago Consumo Mak (Diferido)".to_string(),
                    Bucket::Makala => "Pago Consumo Makala (Diferido)".to_string(),
                };
                entries.push(store.ledger.record(LedgerEntry {
                    id: Uuid::new_v4(),
                    reservation_id: Some(reservation_id),
                    room_id: Some(reservation.room_id),
                    flow: FlowKind::Income,
                    kind: BusinessKind::ReservationPayment,
                    amount: split.amount,
                    method: request.method,
                    bucket: Some(split.bucket),
                    origin: Some(PaymentOrigin::Generic),
                    lines: Vec::new(),
                    category: split.bucket.payment_label().to_string(),
                    description: Some(description),
                    evidence: request.evidence.clone(),
                    created_by: Some(actor.name.clone()),
                    recorded_at: now,
                }));
            }

            let updated = store.reservation_mut(reservation_id)?;
            updated.paid_amount += request.amount;
            let paid_amount = updated.paid_amount;
            let outstanding = store.balance(reservation_id)?.outstanding();

            events.emit(Event::PaymentAllocated {
                reservation_id,
                amount: request.amount,
                to_room: allocation.to(Bucket::Room),
                to_mak: allocation.to(Bucket::Mak),
                to_makala: allocation.to(Bucket::Makala),
                timestamp: now,
            });
            tracing::info!(
                code = %reservation.code,
                amount = %request.amount,
                outstanding = %outstanding,
                "payment applied"
            );

            Ok(PaymentResult {
                reservation_id,
                amount: request.amount,
                allocation,
                entries,
                paid_amount,
                outstanding: outstanding.floor_zero(),
            })
        })
    }

    /// cash expense, never more than the till holds
    pub fn record_expense(
        &mut self,
        actor: &Actor,
        request: ExpenseRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<EntryId> {
        let now = time_provider.now();

        // validate
        if !request.amount.is_positive() {
            return Err(DeskError::validation(format!(
                "expense amount must be positive, got {}",
                request.amount
            )));
        }
        if request.category.trim().is_empty() {
            return Err(DeskError::validation("expense category is required"));
        }

        self.transact("record_expense", |store, events| {
            let available = store.cash_on_hand();
            if request.amount > available {
                return Err(DeskError::InsufficientCash {
                    available,
                    requested: request.amount,
                });
            }

            let entry_id = store.ledger.record(LedgerEntry {
                id: Uuid::new_v4(),
                reservation_id: None,
                room_id: None,
                flow: FlowKind::Expense,
                kind: BusinessKind::Expense,
                amount: request.amount,
                method: PaymentMethod::Cash,
                bucket: None,
                origin: None,
                lines: Vec::new(),
                category: request.category.trim().to_string(),
                description: request.description,
                evidence: None,
                created_by: Some(actor.name.clone()),
                recorded_at: now,
            });

            events.emit(Event::ExpenseRecorded {
                entry_id,
                amount: request.amount,
                category: request.category,
                timestamp: now,
            });
            Ok(entry_id)
        })
    }

    /// correct a ledger entry; product sales go back through stock
    pub fn edit_entry(
        &mut self,
        actor: &Actor,
        entry_id: EntryId,
        edit: EntryEdit,
        time_provider: &SafeTimeProvider,
    ) -> Result<LedgerEntry> {
        if !actor.is_admin() {
            return Err(DeskError::forbidden("only admins edit ledger entries"));
        }
        let now = time_provider.now();
        let billing = self.config.billing.clone();

        self.transact("edit_entry", |store, events| {
            let original = store
                .ledger
                .get(entry_id)
                .cloned()
                .ok_or(DeskError::NotFound { entity: "entry", id: entry_id })?;
            let mut edited = original.clone();

            if edit.items.is_some() && edit.amount.is_some() {
                return Err(DeskError::validation("edit either the product cart or the amount, not both"));
            }
            if edit.items.is_none() && edit.amount.is_some() && !original.lines.is_empty() {
                return Err(DeskError::validation("the amount of a product sale follows its cart"));
            }

            match edit.items {
                Some(cart) => {
                    if original.kind != BusinessKind::MakSale {
                        return Err(DeskError::validation("only product sales carry a product cart"));
                    }
                    let note = format!("edit of entry {}", entry_id);
                    store.inventory.restore(&original.lines, &note, now);
                    edited.lines = store.inventory.withdraw(&cart, &note, now)?;
                    edited.amount = lines_total(&edited.lines);
                }
                None => {
                    if let Some(amount) = edit.amount {
                        if !amount.is_positive() {
                            return Err(DeskError::validation(format!("amount must be positive, got {}", amount)));
                        }
                        edited.amount = amount;
                    }
                }
            }

            if let Some(method) = edit.method {
                check_method(&original, method)?;
                edited.method = method;
            }
            if let Some(description) = edit.description {
                edited.description = Some(description);
            }

            if original.flow == FlowKind::Expense && original.method == PaymentMethod::Cash {
                let available = store.cash_on_hand() + original.amount;
                if edited.method == PaymentMethod::Cash && edited.amount > available {
                    return Err(DeskError::InsufficientCash {
                        available,
                        requested: edited.amount,
                    });
                }
            }

            let (old_amount, new_amount) = (original.amount, edited.amount);
            if let Some(entry) = store.ledger.get_mut(entry_id) {
                *entry = edited.clone();
            }

            if let Some(reservation_id) = edited.reservation_id {
                resync_reservation(store, reservation_id, &original, &billing)?;
            }

            events.emit(Event::EntryEdited {
                entry_id,
                old_amount,
                new_amount,
                timestamp: now,
            });
            tracing::info!(%entry_id, old = %old_amount, new = %new_amount, "ledger entry edited");
            Ok(edited)
        })
    }
}

/// shared fields of the entries a sale writes
struct SaleEntry<'a> {
    kind: BusinessKind,
    bucket: Bucket,
    amount: Money,
    evidence: Option<String>,
    actor: &'a Actor,
    now: DateTime<Utc>,
}

impl SaleEntry<'_> {
    fn entry(
        &self,
        flow: FlowKind,
        method: PaymentMethod,
        reservation_id: Option<ReservationId>,
        room_id: Option<RoomId>,
        lines: Vec<ProductLine>,
        description: Option<String>,
    ) -> LedgerEntry {
        let category = match self.kind {
            BusinessKind::MakSale => "Venta Mak",
            _ => "Venta Makala",
        };
        LedgerEntry {
            id: Uuid::new_v4(),
            reservation_id,
            room_id,
            flow,
            kind: self.kind,
            amount: self.amount,
            method,
            bucket: Some(self.bucket),
            origin: None,
            lines,
            category: category.to_string(),
            description,
            evidence: self.evidence.clone(),
            created_by: Some(self.actor.name.clone()),
            recorded_at: self.now,
        }
    }
}

/// methods an entry may switch to without changing what it is
fn check_method(entry: &LedgerEntry, method: PaymentMethod) -> Result<()> {
    let allowed = match entry.flow {
        FlowKind::Charge => method == PaymentMethod::RoomCharge,
        FlowKind::Expense => method == PaymentMethod::Cash,
        FlowKind::Income => method != PaymentMethod::RoomCharge,
    };
    if allowed {
        Ok(())
    } else {
        Err(DeskError::validation(format!(
            "a {:?} entry cannot use {:?}",
            entry.flow, method
        )))
    }
}

/// bring `paid_amount` back in line with the ledger and re-check the invariant
fn resync_reservation(
    store: &mut Store,
    reservation_id: ReservationId,
    original: &LedgerEntry,
    billing: &BillingConfig,
) -> Result<()> {
    // entries of deleted reservations are corrected in the ledger only
    if store.reservation(reservation_id).is_err() {
        return Ok(());
    }

    if original.is_reservation_payment() {
        let paid = store.ledger.payments_total(reservation_id);
        store.reservation_mut(reservation_id)?.paid_amount = paid;
    }

    let sheet = store.balance(reservation_id)?;
    if sheet.paid.as_decimal() > sheet.total_debt().as_decimal() + billing.overpayment_tolerance {
        return Err(DeskError::validation(format!(
            "paid amount {} would exceed the total debt {}",
            sheet.paid,
            sheet.total_debt()
        )));
    }
    Ok(())
}
