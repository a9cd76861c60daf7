//! Per-group expense state and the operations that mutate it.
//!
//! An [`ExpenseGroup`] owns its roster, ledger, bill and payment tables and
//! the manual-split session. Groups never share state, so callers can hold
//! one instance per chat and process events for different groups in
//! parallel. Every operation validates its input before touching the
//! ledger, and every ledger effect it applies can be reversed by the
//! matching delete operation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::models::{
    Account, Bill, BillId, GroupId, ManualSplitSession, MemberId, NameResolver, ParticipantChange,
    Participants, Payment, PaymentId, SplitProgress,
};
use crate::money;

/// One member's outstanding debts, for rendering a summary line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSummary {
    /// Who this member owes, smallest debt first.
    pub owes: Vec<(MemberId, Decimal)>,
    /// Who owes this member, largest debt first.
    pub owed_by: Vec<(MemberId, Decimal)>,
    /// Money advanced for manually split bills that nobody claims.
    pub unclaimed: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseGroup {
    id: GroupId,
    members: BTreeSet<MemberId>,
    ledger: Ledger,
    bills: BTreeMap<BillId, Bill>,
    payments: BTreeMap<PaymentId, Payment>,
    next_bill_id: u64,
    next_payment_id: u64,
    split_session: Option<ManualSplitSession>,
}

impl ExpenseGroup {
    pub fn new(id: GroupId) -> Self {
        info!("Creating expense group {}", id);
        ExpenseGroup {
            id,
            members: BTreeSet::new(),
            ledger: Ledger::new(),
            bills: BTreeMap::new(),
            payments: BTreeMap::new(),
            next_bill_id: 0,
            next_payment_id: 0,
            split_session: None,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ROSTER

    /// Adds a member to the roster and zero-fills their ledger row and
    /// column. A member who left and rejoins gets their old balances back
    /// untouched.
    pub fn register_member(&mut self, member: MemberId) -> Result<(), LedgerError> {
        info!("Registering member {} in group {}", member, self.id);
        if !self.members.insert(member) {
            warn!("Member {} already registered in group {}", member, self.id);
            return Err(LedgerError::AlreadyRegistered(member));
        }
        self.ledger.register(member);
        debug!("Member {} registered", member);
        Ok(())
    }

    /// Drops a member from the roster. Their balances and bill shares stay;
    /// leaving does not erase history.
    pub fn remove_member(&mut self, member: MemberId) -> bool {
        info!("Removing member {} from group {}", member, self.id);
        self.members.remove(&member)
    }

    pub fn is_member(&self, member: MemberId) -> bool {
        self.members.contains(&member)
    }

    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.members.iter().copied()
    }

    fn require_member(&self, member: MemberId) -> Result<(), LedgerError> {
        if self.members.contains(&member) {
            Ok(())
        } else {
            warn!("Member {} is not registered in group {}", member, self.id);
            Err(LedgerError::UnknownMember(member))
        }
    }

    // BILLS

    /// Creates an equal-split bill and books each participant's share
    /// against the payer. The payer always participates, whatever
    /// `participants` says.
    pub fn create_bill(
        &mut self,
        description: String,
        total: Decimal,
        payer: MemberId,
        participants: Participants,
    ) -> Result<Bill, LedgerError> {
        info!(
            "Creating bill '{}' for {} paid by {} in group {}",
            description, total, payer, self.id
        );
        money::validate_amount(total)?;
        self.require_member(payer)?;
        let mut selected: BTreeSet<MemberId> = match participants {
            Participants::Everyone => self.members.iter().copied().collect(),
            Participants::PayerAlone => BTreeSet::new(),
            Participants::Selected(chosen) => {
                for member in &chosen {
                    self.require_member(*member)?;
                }
                chosen
            }
        };
        selected.insert(payer);

        // Plain division; sub-cent remainders stay on each share.
        let share = total / Decimal::from(selected.len() as u64);
        let shares: BTreeMap<MemberId, Decimal> =
            selected.iter().map(|member| (*member, share)).collect();
        for member in &selected {
            if *member != payer {
                self.ledger
                    .transfer(Account::Member(*member), Account::Member(payer), share)?;
            }
        }

        let bill = Bill {
            id: BillId(self.next_bill_id),
            description,
            total,
            payer,
            shares,
            equal: true,
            unclaimed: Decimal::ZERO,
            created_at: Utc::now(),
        };
        self.next_bill_id += 1;
        self.bills.insert(bill.id, bill.clone());
        debug!(
            "Bill {} created with {} participants owing {} each",
            bill.id,
            bill.participant_count(),
            share
        );
        Ok(bill)
    }

    pub fn bill(&self, bill_id: BillId) -> Option<&Bill> {
        self.bills.get(&bill_id)
    }

    pub fn bills(&self) -> impl Iterator<Item = &Bill> {
        self.bills.values()
    }

    /// Deletes a bill and reverses every ledger effect it currently
    /// accounts for. Shares were kept synchronized with the ledger through
    /// every edit, so reversing the current shares undoes the bill's whole
    /// net effect. Aborts the manual split session if it targets this bill.
    pub fn delete_bill(&mut self, bill_id: BillId) -> Result<Bill, LedgerError> {
        info!("Deleting bill {} in group {}", bill_id, self.id);
        let Some(bill) = self.bills.remove(&bill_id) else {
            warn!("Bill {} not found in group {}", bill_id, self.id);
            return Err(LedgerError::UnknownBill(bill_id));
        };
        if matches!(&self.split_session, Some(session) if session.bill_id == bill_id) {
            info!("Aborting manual split for deleted bill {}", bill_id);
            self.split_session = None;
        }
        let payer = Account::Member(bill.payer);
        for (member, share) in &bill.shares {
            if *member != bill.payer {
                self.ledger
                    .transfer(payer, Account::Member(*member), *share)?;
            }
        }
        if !bill.unclaimed.is_zero() {
            self.ledger
                .transfer(payer, Account::Unclaimed, bill.unclaimed)?;
        }
        debug!("Bill {} deleted, ledger effects reversed", bill_id);
        Ok(bill)
    }

    /// Puts a member on a bill or takes them off it, keeping shares and
    /// ledger synchronized. Adding requires a registered member; removal
    /// works for departed members too, since their shares outlive them.
    pub fn set_participant(
        &mut self,
        bill_id: BillId,
        member: MemberId,
        participating: bool,
    ) -> Result<ParticipantChange, LedgerError> {
        info!(
            "Setting participant {} to {} on bill {} in group {}",
            member, participating, bill_id, self.id
        );
        if participating && !self.members.contains(&member) {
            warn!("Member {} is not registered in group {}", member, self.id);
            return Err(LedgerError::UnknownMember(member));
        }
        let Some(bill) = self.bills.get_mut(&bill_id) else {
            warn!("Bill {} not found in group {}", bill_id, self.id);
            return Err(LedgerError::UnknownBill(bill_id));
        };
        let payer = bill.payer;
        let change = if participating {
            if bill.is_participant(member) {
                debug!("Member {} already on bill {}", member, bill_id);
                ParticipantChange::Unchanged
            } else if bill.equal {
                bill.shares.insert(member, Decimal::ZERO);
                redistribute(&mut self.ledger, bill)?;
                let share = bill.shares.get(&member).copied().unwrap_or(Decimal::ZERO);
                ParticipantChange::Added { share }
            } else if bill.unclaimed > Decimal::ZERO {
                // The newcomer takes over the whole unclaimed pool.
                let pool = bill.unclaimed;
                bill.shares.insert(member, pool);
                bill.unclaimed = Decimal::ZERO;
                if member != payer {
                    self.ledger
                        .transfer(Account::Member(member), Account::Member(payer), pool)?;
                }
                self.ledger
                    .transfer(Account::Member(payer), Account::Unclaimed, pool)?;
                ParticipantChange::Added { share: pool }
            } else {
                bill.shares.insert(member, Decimal::ZERO);
                ParticipantChange::Added {
                    share: Decimal::ZERO,
                }
            }
        } else {
            match bill.shares.remove(&member) {
                None => {
                    debug!("Member {} not on bill {}", member, bill_id);
                    ParticipantChange::Unchanged
                }
                Some(share) => {
                    if member != payer {
                        self.ledger
                            .transfer(Account::Member(payer), Account::Member(member), share)?;
                    }
                    if bill.equal {
                        redistribute(&mut self.ledger, bill)?;
                        ParticipantChange::Removed {
                            share,
                            to_unclaimed: false,
                        }
                    } else {
                        bill.unclaimed += share;
                        self.ledger
                            .transfer(Account::Unclaimed, Account::Member(payer), share)?;
                        ParticipantChange::Removed {
                            share,
                            to_unclaimed: true,
                        }
                    }
                }
            }
        };
        if !participating {
            self.prune_session_member(bill_id, member);
        }
        debug!("Participant change on bill {}: {:?}", bill_id, change);
        Ok(change)
    }

    /// Switches a bill between equal and manual splitting. Switching to
    /// equal folds any unclaimed pool back into the split and recomputes
    /// every share; switching to manual only flips the flag, leaving the
    /// current shares in place.
    pub fn set_split_mode(&mut self, bill_id: BillId, equal: bool) -> Result<(), LedgerError> {
        info!(
            "Setting bill {} split mode to equal={} in group {}",
            bill_id, equal, self.id
        );
        if equal && matches!(&self.split_session, Some(session) if session.bill_id == bill_id) {
            warn!("Manual split in progress for bill {}", bill_id);
            return Err(LedgerError::ManualSplitActive);
        }
        let Some(bill) = self.bills.get_mut(&bill_id) else {
            warn!("Bill {} not found in group {}", bill_id, self.id);
            return Err(LedgerError::UnknownBill(bill_id));
        };
        if equal {
            redistribute(&mut self.ledger, bill)?;
        }
        bill.equal = equal;
        debug!(
            "Bill {} now splits {}",
            bill_id,
            if equal { "equally" } else { "manually" }
        );
        Ok(())
    }

    /// Reassigns who paid a bill. Every participant's share moves from the
    /// old payer to the new one, and an unclaimed advance migrates with it.
    pub fn set_payer(&mut self, bill_id: BillId, new_payer: MemberId) -> Result<(), LedgerError> {
        info!(
            "Changing payer of bill {} to {} in group {}",
            bill_id, new_payer, self.id
        );
        self.require_member(new_payer)?;
        let Some(bill) = self.bills.get_mut(&bill_id) else {
            warn!("Bill {} not found in group {}", bill_id, self.id);
            return Err(LedgerError::UnknownBill(bill_id));
        };
        let old_payer = bill.payer;
        if old_payer == new_payer {
            debug!("Bill {} already paid by {}", bill_id, new_payer);
            return Ok(());
        }
        bill.payer = new_payer;
        for (member, share) in &bill.shares {
            if *member != old_payer {
                self.ledger.transfer(
                    Account::Member(old_payer),
                    Account::Member(*member),
                    *share,
                )?;
            }
            if *member != new_payer {
                self.ledger.transfer(
                    Account::Member(*member),
                    Account::Member(new_payer),
                    *share,
                )?;
            }
        }
        if !bill.unclaimed.is_zero() {
            self.ledger.transfer(
                Account::Member(old_payer),
                Account::Unclaimed,
                bill.unclaimed,
            )?;
            self.ledger.transfer(
                Account::Unclaimed,
                Account::Member(new_payer),
                bill.unclaimed,
            )?;
        }
        debug!(
            "Bill {} payer changed from {} to {}",
            bill_id, old_payer, new_payer
        );
        Ok(())
    }

    // PAYMENTS

    /// Records a direct settlement between two members. The recorded payer
    /// is whoever holds the debt right now, not necessarily the sender of
    /// the command, so "A paid B" and "B was paid by A" land identically.
    pub fn record_payment(
        &mut self,
        sender: MemberId,
        target: MemberId,
        amount: Decimal,
    ) -> Result<Payment, LedgerError> {
        info!(
            "Recording payment of {} between {} and {} in group {}",
            amount, sender, target, self.id
        );
        money::validate_amount(amount)?;
        if sender == target {
            warn!("Member {} tried to record a payment to themselves", sender);
            return Err(LedgerError::SelfPayment);
        }
        self.require_member(sender)?;
        self.require_member(target)?;

        let sender_owes = self
            .ledger
            .balance(Account::Member(sender), Account::Member(target))
            > Decimal::ZERO;
        let (payer, payee) = if sender_owes {
            (sender, target)
        } else {
            (target, sender)
        };
        self.ledger
            .transfer(Account::Member(payer), Account::Member(payee), -amount)?;
        let balance = self
            .ledger
            .balance(Account::Member(payer), Account::Member(payee));

        let payment = Payment {
            id: PaymentId(self.next_payment_id),
            payer,
            payee,
            amount,
            balance,
            created_at: Utc::now(),
        };
        self.next_payment_id += 1;
        self.payments.insert(payment.id, payment.clone());
        debug!(
            "Payment {} recorded, {} now owes {} to {}",
            payment.id, payer, balance, payee
        );
        Ok(payment)
    }

    pub fn payment(&self, payment_id: PaymentId) -> Option<&Payment> {
        self.payments.get(&payment_id)
    }

    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    /// Deletes a payment and reverses exactly the transfer it applied,
    /// using the stored payer and payee rather than the current ledger
    /// sign.
    pub fn delete_payment(&mut self, payment_id: PaymentId) -> Result<Payment, LedgerError> {
        info!("Deleting payment {} in group {}", payment_id, self.id);
        let Some(payment) = self.payments.remove(&payment_id) else {
            warn!("Payment {} not found in group {}", payment_id, self.id);
            return Err(LedgerError::UnknownPayment(payment_id));
        };
        self.ledger.transfer(
            Account::Member(payment.payer),
            Account::Member(payment.payee),
            payment.amount,
        )?;
        debug!("Payment {} deleted, transfer reversed", payment_id);
        Ok(payment)
    }

    // MANUAL SPLIT

    /// Starts collecting per-participant amounts for a bill. The bill
    /// flips to manual mode and participants are prompted one at a time,
    /// ordered by display name with the member id as tie-break. Only one
    /// session may run per group.
    pub fn begin_manual_split(
        &mut self,
        bill_id: BillId,
        names: &dyn NameResolver,
    ) -> Result<MemberId, LedgerError> {
        info!(
            "Starting manual split for bill {} in group {}",
            bill_id, self.id
        );
        if self.split_session.is_some() {
            warn!("A manual split is already in progress in group {}", self.id);
            return Err(LedgerError::ManualSplitActive);
        }
        let Some(bill) = self.bills.get_mut(&bill_id) else {
            warn!("Bill {} not found in group {}", bill_id, self.id);
            return Err(LedgerError::UnknownBill(bill_id));
        };
        let mut order: Vec<MemberId> = bill.shares.keys().copied().collect();
        order.sort_by_key(|id| (names.display_name(*id).unwrap_or_default(), *id));
        let mut queue = VecDeque::from(order);
        let Some(current) = queue.pop_front() else {
            warn!("Bill {} has no participants to split between", bill_id);
            return Err(LedgerError::EmptyParticipantSet);
        };
        bill.equal = false;
        self.split_session = Some(ManualSplitSession {
            bill_id,
            queue,
            current,
        });
        debug!("Manual split started, first target is {}", current);
        Ok(current)
    }

    /// Feeds one entered amount to the active session. The current target's
    /// share is set to the amount and the ledger adjusted by the
    /// difference. Unparseable or invalid input leaves the session where it
    /// is, so the same participant is prompted again.
    pub fn submit_manual_amount(&mut self, input: &str) -> Result<SplitProgress, LedgerError> {
        let Some(session) = &self.split_session else {
            warn!("No manual split in progress in group {}", self.id);
            return Err(LedgerError::ManualSplitIdle);
        };
        let bill_id = session.bill_id;
        let target = session.current;
        info!(
            "Manual split amount for {} on bill {} in group {}",
            target, bill_id, self.id
        );
        let amount = money::parse_amount(input)?;
        money::validate_share(amount)?;
        let Some(bill) = self.bills.get_mut(&bill_id) else {
            self.split_session = None;
            return Err(LedgerError::UnknownBill(bill_id));
        };
        let old = bill.shares.get(&target).copied().unwrap_or(Decimal::ZERO);
        bill.shares.insert(target, amount);
        let delta = amount - old;
        if target != bill.payer && !delta.is_zero() {
            self.ledger
                .transfer(Account::Member(target), Account::Member(bill.payer), delta)?;
        }
        debug!("Share for {} on bill {} set to {}", target, bill_id, amount);
        let progress = self.advance_session();
        if progress == SplitProgress::Done {
            info!("Manual split for bill {} complete", bill_id);
        }
        Ok(progress)
    }

    /// Drops the active session without touching any shares already
    /// assigned. Returns whether there was one.
    pub fn abort_manual_split(&mut self) -> bool {
        match self.split_session.take() {
            Some(session) => {
                info!(
                    "Manual split for bill {} aborted in group {}",
                    session.bill_id, self.id
                );
                true
            }
            None => false,
        }
    }

    pub fn split_session(&self) -> Option<&ManualSplitSession> {
        self.split_session.as_ref()
    }

    /// Moves the session to the next queued participant who is still on
    /// the bill, ending it when nobody is left.
    fn advance_session(&mut self) -> SplitProgress {
        let Some(session) = self.split_session.as_mut() else {
            return SplitProgress::Done;
        };
        let bill = self.bills.get(&session.bill_id);
        while let Some(next) = session.queue.pop_front() {
            if bill.map(|b| b.is_participant(next)).unwrap_or(false) {
                session.current = next;
                return SplitProgress::Next(next);
            }
        }
        self.split_session = None;
        SplitProgress::Done
    }

    /// Keeps the session consistent when a participant is taken off its
    /// bill: they leave the queue, and if they were the current target the
    /// session moves on without them.
    fn prune_session_member(&mut self, bill_id: BillId, member: MemberId) {
        let Some(session) = self.split_session.as_mut() else {
            return;
        };
        if session.bill_id != bill_id {
            return;
        }
        session.queue.retain(|queued| *queued != member);
        if session.current == member {
            info!(
                "Manual split target {} left bill {}, moving on",
                member, bill_id
            );
            self.advance_session();
        }
    }

    // BALANCES

    /// Signed amount `a` owes `b`. Positive means `a` is in debt.
    pub fn balance_between(&self, a: MemberId, b: MemberId) -> Decimal {
        self.ledger.balance(Account::Member(a), Account::Member(b))
    }

    /// Every ordered pair of members with the signed amount the first owes
    /// the second. Members who left the roster still show up, since their
    /// balances survive them.
    pub fn balances(&self) -> Vec<(MemberId, MemberId, Decimal)> {
        let members: Vec<MemberId> = self.ledger.accounts().filter_map(Account::member).collect();
        let mut pairs = Vec::new();
        for a in &members {
            for b in &members {
                if a != b {
                    pairs.push((
                        *a,
                        *b,
                        self.ledger.balance(Account::Member(*a), Account::Member(*b)),
                    ));
                }
            }
        }
        pairs
    }

    /// Money `member` has advanced for manually split bills that no
    /// participant currently claims.
    pub fn unclaimed_advance(&self, member: MemberId) -> Decimal {
        -self.ledger.balance(Account::Member(member), Account::Unclaimed)
    }

    pub fn is_settled(&self, a: MemberId, b: MemberId) -> bool {
        money::is_settled(self.balance_between(a, b))
    }

    /// Outstanding debts for one member, split into what they owe and what
    /// they are owed, each deterministically ordered by amount with the
    /// member id as tie-break. Settled balances are filtered out.
    pub fn member_summary(&self, member: MemberId) -> MemberSummary {
        let account = Account::Member(member);
        let mut owes = Vec::new();
        let mut owed_by = Vec::new();
        for other in self.ledger.accounts().filter_map(Account::member) {
            if other == member {
                continue;
            }
            let amount = self.ledger.balance(account, Account::Member(other));
            if money::is_settled(amount) {
                continue;
            }
            if amount > Decimal::ZERO {
                owes.push((other, amount));
            } else {
                owed_by.push((other, -amount));
            }
        }
        owes.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        owed_by.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        MemberSummary {
            owes,
            owed_by,
            unclaimed: self.unclaimed_advance(member),
        }
    }
}

/// Recomputes every share of an equal-split bill to `total / count` and
/// books each participant's difference against the payer. Any unclaimed
/// pool is folded back first so the full total is what gets divided. A
/// bill with no participants is left alone rather than divided by zero.
fn redistribute(ledger: &mut Ledger, bill: &mut Bill) -> Result<(), LedgerError> {
    let count = bill.shares.len();
    if count == 0 {
        return Ok(());
    }
    reclaim_pool(ledger, bill)?;
    let average = bill.total / Decimal::from(count as u64);
    let payer = bill.payer;
    for (member, share) in bill.shares.iter_mut() {
        let delta = average - *share;
        *share = average;
        if *member != payer && !delta.is_zero() {
            ledger.transfer(Account::Member(*member), Account::Member(payer), delta)?;
        }
    }
    Ok(())
}

/// Folds an unclaimed pool back into the bill before an equal
/// redistribution spreads it over the participants. With nobody left on
/// the bill there is no split to fold it into, so the pool stays.
fn reclaim_pool(ledger: &mut Ledger, bill: &mut Bill) -> Result<(), LedgerError> {
    if bill.unclaimed.is_zero() || bill.shares.is_empty() {
        return Ok(());
    }
    let pool = bill.unclaimed;
    bill.unclaimed = Decimal::ZERO;
    ledger.transfer(Account::Member(bill.payer), Account::Unclaimed, pool)?;
    Ok(())
}
