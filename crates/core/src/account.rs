use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Cash,
}

impl AccountType {
    /// Credit accounts are the one type the matching engine treats
    /// specially: an inflow into one marks a card payment.
    pub fn is_credit(self) -> bool {
        matches!(self, AccountType::Credit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Cash => "cash",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit" => Ok(AccountType::Credit),
            "cash" => Ok(AccountType::Cash),
            other => Err(format!("Unknown account type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<AccountId>,
    pub name: String,
    pub account_type: AccountType,
    pub is_archived: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(name: &str, account_type: AccountType) -> Self {
        Account {
            id: None,
            name: name.to_string(),
            account_type,
            is_archived: false,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_credit_is_credit() {
        assert!(AccountType::Credit.is_credit());
        assert!(!AccountType::Checking.is_credit());
        assert!(!AccountType::Savings.is_credit());
        assert!(!AccountType::Cash.is_credit());
    }

    #[test]
    fn account_type_string_round_trip() {
        for t in [
            AccountType::Checking,
            AccountType::Savings,
            AccountType::Credit,
            AccountType::Cash,
        ] {
            assert_eq!(t.as_str().parse::<AccountType>().unwrap(), t);
        }
    }

    #[test]
    fn account_type_parse_rejects_unknown() {
        assert!("brokerage".parse::<AccountType>().is_err());
    }
}
