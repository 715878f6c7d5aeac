pub mod waterfall;

use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::ledger::BalanceSheet;
use crate::types::{EntryId, PaymentMethod, ReservationId};

pub use waterfall::{Allocation, BucketSplit, PaymentAllocator};

/// payment request against a reservation balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub description: Option<String>,
    /// reference to the stored payment evidence
    pub evidence: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Money, method: PaymentMethod) -> Self {
        Self {
            amount,
            method,
            description: None,
            evidence: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// shape checks that need no balance
    pub fn validate(&self, billing: &BillingConfig) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(DeskError::validation(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        if !self.amount.has_at_most_decimals(billing.payment_decimals) {
            return Err(DeskError::validation(format!(
                "payment amount {} must be a whole amount",
                self.amount
            )));
        }
        if self.method == PaymentMethod::RoomCharge {
            return Err(DeskError::validation("room charge is not a payment method"));
        }
        Ok(())
    }
}

/// reject payments that would push the paid total past the debt
pub fn check_overpayment(sheet: &BalanceSheet, amount: Money, billing: &BillingConfig) -> Result<()> {
    let limit = sheet.total_debt().as_decimal() + billing.overpayment_tolerance;
    if (sheet.paid + amount).as_decimal() > limit {
        return Err(DeskError::Overpayment {
            outstanding: sheet.outstanding().floor_zero(),
            attempted: amount,
        });
    }
    Ok(())
}

/// outcome of a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub reservation_id: ReservationId,
    pub amount: Money,
    pub allocation: Allocation,
    /// one entry per bucket that received money
    pub entries: Vec<EntryId>,
    pub paid_amount: Money,
    pub outstanding: Money,
}
