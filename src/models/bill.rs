use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// Bill identifier, monotonically increasing per group. Never reused, so a
/// stale id in a long-lived chat message fails loudly instead of touching
/// the wrong bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillId(pub u64);

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who shares a new bill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Participants {
    /// Every member registered at creation time.
    Everyone,
    /// The payer carries the whole amount alone.
    PayerAlone,
    /// An explicit selection. The payer is always included on top of it.
    Selected(BTreeSet<MemberId>),
}

/// A shared expense and its current split.
///
/// The shares and the unclaimed pool mirror exactly what has been booked
/// against the ledger, so a bill can be deleted at any point by replaying
/// them in reverse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub description: String,
    pub total: Decimal,
    pub payer: MemberId,
    /// Amount owed by each participant. A zero share still marks the member
    /// as participating.
    pub shares: BTreeMap<MemberId, Decimal>,
    /// Equal mode re-divides `total` on every participant change; manual
    /// mode keeps whatever amounts were assigned.
    pub equal: bool,
    /// Money the payer advanced that no current participant claims.
    pub unclaimed: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn is_participant(&self, member: MemberId) -> bool {
        self.shares.contains_key(&member)
    }

    pub fn participant_count(&self) -> usize {
        self.shares.len()
    }
}

/// Ledger-visible outcome of toggling a bill participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParticipantChange {
    /// The member joined with this share: zero, the equal share after
    /// redistribution, or the whole unclaimed pool.
    Added { share: Decimal },
    /// The member left the bill. `to_unclaimed` says whether their share
    /// moved into the unclaimed pool (manual mode) or was spread over the
    /// remaining participants (equal mode).
    Removed { share: Decimal, to_unclaimed: bool },
    /// The bill already matched the requested state.
    Unchanged,
}
