use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a room
pub type RoomId = Uuid;

/// unique identifier for a guest
pub type GuestId = Uuid;

/// unique identifier for a reservation
pub type ReservationId = Uuid;

/// unique identifier for a ledger entry
pub type EntryId = Uuid;

/// unique identifier for a product
pub type ProductId = Uuid;

/// sequential human-readable reservation code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationCode(pub u32);

impl ReservationCode {
    pub fn next(self) -> Self {
        ReservationCode(self.0 + 1)
    }
}

impl fmt::Display for ReservationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// how a reservation is billed and scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    /// date range billed per calendar night
    #[default]
    Night,
    /// same-day stay billed at a flat rate
    Hourly,
}

/// reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// booked, guest not yet arrived
    Reserved,
    /// guest in the room
    CheckedIn,
    /// guest left, room waiting for cleaning
    CheckedOut,
    /// room cleaned after the stay
    Completed,
    /// soft deleted
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// room occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
    Cleaning,
    Maintenance,
}

/// money flow direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// money received
    Income,
    /// money paid out of the till
    Expense,
    /// debt billed to a room, nothing received yet
    Charge,
}

/// business meaning of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessKind {
    /// restobar consumption, flat amount (makala)
    MakalaSale,
    /// product sale drawing on stock (mak)
    MakSale,
    /// payment against a reservation balance
    ReservationPayment,
    /// cash leaving the till
    Expense,
}

/// payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Yape,
    Card,
    Transfer,
    /// billed to the room, settled later
    RoomCharge,
}

/// independent debt bucket of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// room cost
    Room,
    /// product consumption
    Mak,
    /// restobar consumption
    Makala,
}

impl Bucket {
    /// waterfall order for generic payments
    pub const WATERFALL: [Bucket; 3] = [Bucket::Room, Bucket::Mak, Bucket::Makala];

    /// consumption bucket fed by a sale kind
    pub fn for_sale(kind: BusinessKind) -> Option<Bucket> {
        match kind {
            BusinessKind::MakSale => Some(Bucket::Mak),
            BusinessKind::MakalaSale => Some(Bucket::Makala),
            _ => None,
        }
    }

    /// label written on generic payment entries
    pub fn payment_label(&self) -> &'static str {
        match self {
            Bucket::Room => "Pago Reserva (Habitación)",
            Bucket::Mak => "Pago Venta Mak",
            Bucket::Makala => "Pago Venta Makala",
        }
    }
}

/// where a payment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOrigin {
    /// paid at the moment of a consumption sale, settles that bucket directly
    Immediate(Bucket),
    /// paid against the running balance, split by the waterfall
    Generic,
}

/// role of the person operating the desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Counter,
}

/// person performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(name: impl Into<String>) -> Self {
        Self { name: name.into(), role: Role::Admin }
    }

    pub fn counter(name: impl Into<String>) -> Self {
        Self { name: name.into(), role: Role::Counter }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
