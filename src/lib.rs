pub mod availability;
pub mod config;
pub mod conflict;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod frontdesk;
pub mod inventory;
pub mod ledger;
pub mod payments;
pub mod reservation;
pub mod state;
pub mod store;
pub mod types;
pub mod webhooks;

// re-export key types
pub use availability::{AvailabilityCell, AvailabilityGrid, DisplayStatus, GridBuilder, DISPLAY_PRIORITY};
pub use config::{BillingConfig, BookingConfig, ConfigError, DeskConfig, WebhookConfig};
pub use conflict::ConflictDetector;
pub use decimal::Money;
pub use errors::{DeskError, Result};
pub use events::{Event, EventStore};
pub use frontdesk::{
    BalanceView, CashSummary, CheckInRequest, EntryEdit, ExpenseRequest, FrontDesk, GuestDetails, NewReservation,
    NewRoom, ReservationDetail, ReservationFilter, ReservationRow, ReservationUpdate, RoomView, SaleItems,
    SaleReceipt, SaleRequest,
};
pub use inventory::{CartItem, Product, ProductLine, StockBook};
pub use ledger::{BalanceSheet, EntryFilter, Ledger, LedgerEntry};
pub use payments::{Allocation, BucketSplit, PaymentAllocator, PaymentRequest, PaymentResult};
pub use reservation::{Guest, Reservation, Room, Stay};
pub use state::{next_status, LifecycleEvent, OccupancyChange, OccupancyRecord};
pub use types::{
    Actor, Bucket, BusinessKind, EntryId, FlowKind, GuestId, PaymentMethod, PaymentOrigin, ProductId,
    ReservationCode, ReservationId, ReservationKind, ReservationStatus, Role, RoomId, RoomStatus,
};
pub use webhooks::{
    DocumentValidator, DocumentVerdict, EchoDocumentValidator, IdentityPhoto, MemoryNotifier, NoopNotifier,
    Notification, Notifier, VisitTier, WebhookDocumentValidator, WebhookNotifier,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
