pub mod bill;
pub mod member;
pub mod payment;
pub mod session;

pub use bill::{Bill, BillId, ParticipantChange, Participants};
pub use member::{Account, GroupId, MemberId, NameResolver};
pub use payment::{Payment, PaymentId};
pub use session::{ManualSplitSession, SplitProgress};
