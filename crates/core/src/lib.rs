pub mod account;
pub mod error;
pub mod money;
pub mod suggestion;
pub mod transaction;

pub use account::{Account, AccountId, AccountType};
pub use error::LinkError;
pub use money::Money;
pub use suggestion::{ordered_pair, Confidence, MatchSuggestion, SuggestionId, SuggestionStatus};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionKind};
