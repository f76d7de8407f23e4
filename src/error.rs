//! Error kinds reported by the engine.
//!
//! Every error here is caused by invalid input or an explicit cancellation, so
//! nothing is retried internally; the failing operation reports synchronously
//! to its caller.

use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A hand evaluation was requested on fewer than 5, more than 7, or
    /// duplicated cards.
    #[error("hand must contain 5 to 7 distinct cards, got {got}")]
    InvalidHandSize { got: usize },

    /// A deal requested more cards than the deck still holds.
    #[error("deck holds {remaining} cards, cannot deal {requested}")]
    InsufficientCards { requested: usize, remaining: usize },

    /// Fixed and excluded cards overlap, or leave too small a pool to fill the
    /// unknown slots.
    #[error("overconstrained hand: {0}")]
    OverconstrainedHand(String),

    /// An equity query was made with no contenders.
    #[error("no contenders given")]
    EmptyContenderSet,

    /// A Monte Carlo equity query was made with a zero trial budget.
    #[error("trial budget must be positive")]
    InvalidBudget,

    /// A computation was aborted by the caller-supplied deadline.
    #[error("computation cancelled by deadline")]
    Cancelled,

    /// A betting action violated the table rules. The pot ledger is untouched
    /// whenever this is returned.
    #[error("illegal action: {0}")]
    IllegalAction(String),
}
