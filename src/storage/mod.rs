use crate::error::LedgerError;
use crate::group::ExpenseGroup;
use crate::models::GroupId;

/// Persistence boundary. A group is stored as one opaque document; the
/// engine never reads or writes partial state.
pub trait GroupStore {
    /// Persists a group's full state, replacing any previous document.
    fn save(&mut self, group: &ExpenseGroup) -> Result<(), LedgerError>;

    /// Loads a group, or `None` if it was never saved.
    fn load(&self, group_id: GroupId) -> Result<Option<ExpenseGroup>, LedgerError>;

    /// Every group id with a stored document.
    fn group_ids(&self) -> Vec<GroupId>;
}

pub mod in_memory;
