use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// Payment identifier, monotonically increasing per group and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A direct settlement between two members.
///
/// `payer` is whoever held the debt when the payment was recorded, which may
/// be the target of the command rather than its sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// The debtor at recording time.
    pub payer: MemberId,
    /// The creditor at recording time.
    pub payee: MemberId,
    pub amount: Decimal,
    /// `ledger[payer][payee]` right after the transfer. Stored as a display
    /// snapshot, never re-derived.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}
