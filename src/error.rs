use thiserror::Error;

use crate::models::{BillId, MemberId, PaymentId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Zero, negative, over-precision, or over-cap amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Reference to a member that is not registered in the group
    #[error("Member {0} is not registered")]
    UnknownMember(MemberId),

    /// Member is already registered in the group
    #[error("Member {0} is already registered")]
    AlreadyRegistered(MemberId),

    /// Bill with the given id does not exist (stale id)
    #[error("Bill {0} not found")]
    UnknownBill(BillId),

    /// Payment with the given id does not exist (stale id)
    #[error("Payment {0} not found")]
    UnknownPayment(PaymentId),

    /// Operation needs at least one bill participant
    #[error("Bill has no participants")]
    EmptyParticipantSet,

    /// A payment needs two distinct members
    #[error("Cannot record a payment to yourself")]
    SelfPayment,

    /// A ledger transfer needs two distinct accounts
    #[error("Cannot transfer between an account and itself")]
    SelfTransfer,

    /// A manual split session is already collecting amounts for this group
    #[error("A manual split is already in progress")]
    ManualSplitActive,

    /// No manual split session is collecting amounts
    #[error("No manual split in progress")]
    ManualSplitIdle,

    /// Unparseable manual-split entry; the same participant is prompted again
    #[error("Could not parse amount: {0:?}")]
    InvalidInput(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),
}
