//! Errors raised while handling a message.
//!
//! None of them leave the agent: each one is logged and turned into a single
//! reply to the conversation that caused it.
use ledger::LedgerError;
use thiserror::Error;

use crate::parsing::ParseError;

#[derive(Error, Debug)]
pub enum BotError {
    /// The message looked like an expense but did not follow the pattern.
    #[error("malformed expense: {0}")]
    Parse(ParseError),
    /// The message had the expense shape with an unusable amount/description.
    #[error("invalid expense: {0}")]
    Validation(ParseError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<ParseError> for BotError {
    fn from(err: ParseError) -> Self {
        if err.is_validation() {
            BotError::Validation(err)
        } else {
            BotError::Parse(err)
        }
    }
}
