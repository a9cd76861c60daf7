use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::bill::BillId;
use super::member::MemberId;

/// Transient state of a manual-split collection run.
///
/// At most one session exists per group. It is dropped, never recovered,
/// when the bill it points at is deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSplitSession {
    pub bill_id: BillId,
    /// Participants still waiting to be prompted, in prompt order.
    pub queue: VecDeque<MemberId>,
    /// The participant whose amount is being collected right now.
    pub current: MemberId,
}

/// What the manual-split workflow expects after an accepted amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitProgress {
    /// Prompt this participant next.
    Next(MemberId),
    /// Every participant has an amount and the session is over.
    Done,
}
