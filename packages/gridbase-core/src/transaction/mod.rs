//! Scoped transactions over the object store with atomic commit.

mod change;
#[allow(clippy::module_inception)]
mod transaction;

pub use change::Change;
pub use transaction::{Transaction, TxMode};
