pub mod constants;
pub mod error;
pub mod group;
pub mod ledger;
pub mod models;
pub mod money;
pub mod storage;

pub use error::LedgerError;
pub use group::{ExpenseGroup, MemberSummary};
pub use ledger::Ledger;
pub use storage::in_memory::InMemoryStore;
pub use storage::GroupStore;

#[cfg(test)]
mod tests;
