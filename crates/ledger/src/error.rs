//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`Io`] thrown when the backing file cannot be read or written.
//! - [`InvalidAmount`] thrown when a money amount cannot be parsed.
//! - [`InvalidRecord`] thrown when a record violates its invariants.
//! - [`Overflow`] thrown when a total does not fit in the money type.
//!
//!  [`Io`]: LedgerError::Io
//!  [`InvalidAmount`]: LedgerError::InvalidAmount
//!  [`InvalidRecord`]: LedgerError::InvalidRecord
//!  [`Overflow`]: LedgerError::Overflow
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Total overflow while summing {0}")]
    Overflow(&'static str),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRecord(a), Self::InvalidRecord(b)) => a == b,
            (Self::Overflow(a), Self::Overflow(b)) => a == b,
            _ => false,
        }
    }
}
