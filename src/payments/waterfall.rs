use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::BalanceSheet;
use crate::types::Bucket;

/// portion of a payment assigned to one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSplit {
    pub bucket: Bucket,
    pub amount: Money,
}

/// how a generic payment is spread over the debt buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// splits in waterfall order, only buckets above the epsilon
    pub splits: Vec<BucketSplit>,
    /// generic cursor before and after the payment
    pub cursor_before: Money,
    pub cursor_after: Money,
    /// paid past the end of the last bucket, within tolerance
    pub excess: Money,
}

impl Allocation {
    pub fn to(&self, bucket: Bucket) -> Money {
        self.splits
            .iter()
            .filter(|s| s.bucket == bucket)
            .map(|s| s.amount)
            .sum()
    }

    pub fn total(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }
}

/// fixed-priority waterfall over the net buckets
#[derive(Debug, Clone)]
pub struct PaymentAllocator {
    order: [Bucket; 3],
    epsilon: Decimal,
}

impl Default for PaymentAllocator {
    fn default() -> Self {
        Self::new(Decimal::new(1, 3))
    }
}

impl PaymentAllocator {
    /// room first, then product consumption, then restobar consumption
    pub fn new(epsilon: Decimal) -> Self {
        Self {
            order: Bucket::WATERFALL,
            epsilon,
        }
    }

    /// lay the net buckets end to end and intersect them with
    /// `[generic_paid, generic_paid + amount)`
    pub fn allocate(&self, sheet: &BalanceSheet, amount: Money) -> Allocation {
        let start = sheet.generic_paid();
        let end = start + amount;

        let mut splits = Vec::with_capacity(self.order.len());
        let mut offset = Money::ZERO;

        for bucket in self.order {
            let lo = offset;
            let hi = offset + sheet.net(bucket);
            offset = hi;

            let part = (end.min(hi) - start.max(lo)).floor_zero();
            if part.as_decimal() > self.epsilon {
                splits.push(BucketSplit { bucket, amount: part });
            }
        }

        let allocated: Money = splits.iter().map(|s| s.amount).sum();
        let excess = (amount - allocated).floor_zero();

        // keep the ledger summing to the payment: the excess rides on the
        // last bucket that received money
        if excess.as_decimal() > self.epsilon {
            match splits.last_mut() {
                Some(last) => last.amount += excess,
                None => splits.push(BucketSplit { bucket: Bucket::Room, amount: excess }),
            }
        }

        tracing::debug!(
            amount = %amount,
            cursor = %start,
            splits = splits.len(),
            excess = %excess,
            "payment allocated"
        );

        Allocation {
            splits,
            cursor_before: start,
            cursor_after: end,
            excess,
        }
    }
}
