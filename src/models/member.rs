use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque member identifier supplied by the chat platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub i64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the chat group that owns a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One axis of the ledger matrix: a member, or the sentinel pseudo-member
/// that holds money advanced for a bill which no participant has claimed.
///
/// Serialized as a plain string key (`"42"` / `"unclaimed"`) so a ledger
/// persists as an ordinary JSON object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Account {
    Member(MemberId),
    Unclaimed,
}

impl Account {
    /// The member behind this account, unless it is the sentinel.
    pub fn member(self) -> Option<MemberId> {
        match self {
            Account::Member(id) => Some(id),
            Account::Unclaimed => None,
        }
    }
}

impl From<MemberId> for Account {
    fn from(id: MemberId) -> Self {
        Account::Member(id)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        match account {
            Account::Member(id) => id.0.to_string(),
            Account::Unclaimed => "unclaimed".to_string(),
        }
    }
}

impl TryFrom<String> for Account {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "unclaimed" {
            return Ok(Account::Unclaimed);
        }
        value
            .parse::<i64>()
            .map(|raw| Account::Member(MemberId(raw)))
            .map_err(|_| format!("invalid account key: {value:?}"))
    }
}

/// Resolves a member id to a display name.
///
/// Names live in the chat platform's directory and are looked up on demand,
/// never cached in core state, so renames are picked up the next time an
/// ordering needs them.
pub trait NameResolver {
    fn display_name(&self, id: MemberId) -> Option<String>;
}

impl NameResolver for HashMap<MemberId, String> {
    fn display_name(&self, id: MemberId) -> Option<String> {
        self.get(&id).cloned()
    }
}
