use std::collections::HashMap;

use log::debug;

use crate::error::LedgerError;
use crate::group::ExpenseGroup;
use crate::models::GroupId;
use crate::storage::GroupStore;

/// Keeps each group as an opaque JSON document, the same shape a file or
/// database backend would hold.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: HashMap<GroupId, serde_json::Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            documents: HashMap::new(),
        }
    }
}

impl GroupStore for InMemoryStore {
    fn save(&mut self, group: &ExpenseGroup) -> Result<(), LedgerError> {
        let document =
            serde_json::to_value(group).map_err(|err| LedgerError::Storage(err.to_string()))?;
        if self.documents.get(&group.id()) == Some(&document) {
            debug!("Group {} unchanged, skipping save", group.id());
            return Ok(());
        }
        self.documents.insert(group.id(), document);
        debug!("Group {} saved", group.id());
        Ok(())
    }

    fn load(&self, group_id: GroupId) -> Result<Option<ExpenseGroup>, LedgerError> {
        match self.documents.get(&group_id) {
            Some(document) => serde_json::from_value(document.clone())
                .map(Some)
                .map_err(|err| LedgerError::Storage(err.to_string())),
            None => Ok(None),
        }
    }

    fn group_ids(&self) -> Vec<GroupId> {
        self.documents.keys().copied().collect()
    }
}
