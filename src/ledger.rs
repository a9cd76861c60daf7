//! The pairwise debt matrix.
//!
//! `balances[a][b]` is the signed amount account `a` owes account `b`.
//! Every mutation goes through [`Ledger::transfer`], which updates the two
//! mirrored cells together, so two invariants hold at every call boundary:
//!
//! * anti-symmetry: `balances[a][b] == -balances[b][a]`
//! * conservation: the sum over all cells is zero
//!
//! The matrix has one extra axis, [`Account::Unclaimed`], for money a payer
//! advanced that no participant currently claims. Because the sentinel is an
//! ordinary account, both invariants stay global statements with no special
//! cases.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::models::{Account, MemberId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<Account, BTreeMap<Account, Decimal>>,
}

impl Ledger {
    /// An empty matrix holding only the sentinel row.
    pub fn new() -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(Account::Unclaimed, BTreeMap::new());
        Ledger { balances }
    }

    /// Gives `member` a zero-filled row and column against every existing
    /// account. Idempotent: cells that already exist keep their value, so a
    /// member who left and came back still sees their old balances.
    pub fn register(&mut self, member: MemberId) {
        let account = Account::Member(member);
        let others: Vec<Account> = self.balances.keys().copied().collect();
        let row = self.balances.entry(account).or_default();
        for other in &others {
            if *other != account {
                row.entry(*other).or_insert(Decimal::ZERO);
            }
        }
        for other in others {
            if other != account {
                self.balances
                    .entry(other)
                    .or_default()
                    .entry(account)
                    .or_insert(Decimal::ZERO);
            }
        }
    }

    /// Moves `amount` of debt from `debtor` towards `creditor`: afterwards
    /// `debtor` owes `creditor` exactly `amount` more than before. `amount`
    /// may be negative, which every reversal in the crate relies on.
    ///
    /// Both mirrored cells are written back to back with no fallible step in
    /// between, so a returned error means the matrix was not touched.
    pub fn transfer(
        &mut self,
        debtor: Account,
        creditor: Account,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if debtor == creditor {
            return Err(LedgerError::SelfTransfer);
        }
        *self
            .balances
            .entry(debtor)
            .or_default()
            .entry(creditor)
            .or_insert(Decimal::ZERO) += amount;
        *self
            .balances
            .entry(creditor)
            .or_default()
            .entry(debtor)
            .or_insert(Decimal::ZERO) -= amount;
        Ok(())
    }

    /// Signed amount `a` owes `b`. Cells that were never written are zero.
    pub fn balance(&self, a: Account, b: Account) -> Decimal {
        self.balances
            .get(&a)
            .and_then(|row| row.get(&b))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Accounts that have a row in the matrix, sentinel included.
    pub fn accounts(&self) -> impl Iterator<Item = Account> + '_ {
        self.balances.keys().copied()
    }

    /// Every stored cell as `(debtor, creditor, amount)`. Cells never
    /// written are implicitly zero and not yielded.
    pub fn cells(&self) -> impl Iterator<Item = (Account, Account, Decimal)> + '_ {
        self.balances
            .iter()
            .flat_map(|(a, row)| row.iter().map(move |(b, amount)| (*a, *b, *amount)))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
