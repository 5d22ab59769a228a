//! Leave ledger core: pure balance reconciliation shared by the list,
//! request-creation and status-transition endpoints.

pub mod balance;
pub mod quantity;
pub mod transition;
pub mod validate;

pub use balance::UsageRecord;
pub use quantity::Quantity;
