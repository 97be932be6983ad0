use thiserror::Error;

use super::suggestion::{SuggestionId, SuggestionStatus};
use super::transaction::TransactionId;

/// Failure modes of the linking workflow. Scoring and candidate search
/// never fail on normal input; everything here comes out of the
/// accept/reject/manual-link paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Suggestion {0} not found")]
    SuggestionNotFound(SuggestionId),
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),
    #[error("Suggestion {0} was already {1}")]
    AlreadyReviewed(SuggestionId, SuggestionStatus),
    #[error("Transaction {0} is already part of a transfer")]
    AlreadyLinked(TransactionId),
    #[error("Both transactions belong to the same account")]
    SameAccount,
    #[error("Amounts do not cancel: {0} and {1}")]
    AmountMismatch(i64, i64),
    #[error("Zero-amount transactions cannot be linked")]
    ZeroAmount,
}
