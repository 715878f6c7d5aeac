use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::state::LifecycleEvent;
use crate::types::{ReservationStatus, RoomStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeskError {
    #[error("invalid request: {message}")]
    Validation {
        message: String,
    },

    #[error("booking conflict: {reason}")]
    Conflict {
        reason: String,
    },

    #[error("room is {status:?}: {reason}")]
    RoomUnavailable {
        status: RoomStatus,
        reason: String,
    },

    #[error("outstanding debt of {debt} must be paid before checkout")]
    DebtRemaining {
        debt: Money,
    },

    #[error("payment exceeds total debt: outstanding {outstanding}, attempted {attempted}")]
    Overpayment {
        outstanding: Money,
        attempted: Money,
    },

    #[error("consumption charges of {charges} exceed paid amount {paid}")]
    UnpaidConsumption {
        charges: Money,
        paid: Money,
    },

    #[error("insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },

    #[error("insufficient cash on hand: available {available}, requested {requested}")]
    InsufficientCash {
        available: Money,
        requested: Money,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("cannot {event:?} a reservation that is {status}")]
    InvalidTransition {
        status: ReservationStatus,
        event: LifecycleEvent,
    },

    #[error("not permitted: {message}")]
    Forbidden {
        message: String,
    },

    #[error("identity document rejected: {message}")]
    DocumentRejected {
        message: String,
        extracted: Option<String>,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl DeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        DeskError::Validation { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DeskError::Forbidden { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
