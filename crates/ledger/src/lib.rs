//! Expense ledger.
//!
//! Holds the [`ExpenseRecord`] model, the append-only [`LedgerStore`] backed
//! by a plain text file, and the [`reports`] computed from a snapshot of it.
//! The ledger file is the single source of truth; reports are never stored.

pub use error::LedgerError;
pub use money::MoneyCents;
pub use record::{DEFAULT_CATEGORY, ExpenseRecord, RecordKey};
pub use store::{CategoryUpdate, ClearOutcome, LedgerStore};

pub mod reports;

mod error;
mod money;
mod record;
mod store;

type ResultLedger<T> = Result<T, LedgerError>;
