use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LinkError;
use super::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionId(pub i64);

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse operator-facing triage label derived from the raw score.
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("Unknown confidence: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    /// Accepted and rejected are final; only pending rows may transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SuggestionStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SuggestionStatus::Pending),
            "accepted" => Ok(SuggestionStatus::Accepted),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(format!("Unknown suggestion status: '{other}'")),
        }
    }
}

/// Canonical storage order for an unordered transaction pair. `(a, b)`
/// and `(b, a)` name the same suggestion, so rows always persist with
/// the smaller id first and the unique index does the rest.
pub fn ordered_pair(a: TransactionId, b: TransactionId) -> (TransactionId, TransactionId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One reviewable candidate pair. Rows are never deleted; they move
/// `pending -> accepted | rejected` exactly once and stay as an audit
/// trail of matching decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub id: SuggestionId,
    pub transaction_a_id: TransactionId,
    pub transaction_b_id: TransactionId,
    pub score: i64,
    pub confidence: Confidence,
    pub is_credit_payment: bool,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl MatchSuggestion {
    pub fn touches(&self, id: TransactionId) -> bool {
        self.transaction_a_id == id || self.transaction_b_id == id
    }

    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), LinkError> {
        self.transition(SuggestionStatus::Accepted, now)
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), LinkError> {
        self.transition(SuggestionStatus::Rejected, now)
    }

    fn transition(&mut self, next: SuggestionStatus, now: DateTime<Utc>) -> Result<(), LinkError> {
        if self.status.is_terminal() {
            return Err(LinkError::AlreadyReviewed(self.id, self.status));
        }
        self.status = next;
        self.reviewed_at = Some(now);
        Ok(())
    }
}
