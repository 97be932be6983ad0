use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::account::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Normal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Normal => "normal",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(TransactionKind::Normal),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("Unknown transaction kind: '{other}'")),
        }
    }
}

/// A persisted transaction as the matching engine sees it. Negative
/// amounts are outflows, positive amounts inflows, always in cents.
///
/// Invariant: `kind == Transfer` implies `linked_account_id` is set and a
/// counterpart row of equal magnitude and opposite sign points back here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub linked_account_id: Option<AccountId>,
    pub amount_cents: i64,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_inflow(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn is_outflow(&self) -> bool {
        self.amount_cents < 0
    }

    /// Already half of a linked transfer pair.
    pub fn is_linked(&self) -> bool {
        self.kind == TransactionKind::Transfer
    }

    /// The exact amount the other side of a transfer would carry.
    pub fn counter_amount_cents(&self) -> i64 {
        -self.amount_cents
    }
}

/// Input shape for creating a transaction; ids and timestamps are
/// assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount_cents: i64,
    pub description: String,
    pub date: NaiveDate,
}
