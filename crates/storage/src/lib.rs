pub mod db;
pub mod error;
pub mod scan;
pub mod suggestions;
pub mod transactions;

#[cfg(test)]
pub(crate) mod testutil;

pub use db::{create_db, create_memory_db, get_account, get_all_accounts, insert_account, DbPool};
pub use error::StoreError;
pub use scan::scan_for_matches;
pub use suggestions::{
    accept_suggestion, get_suggestion, insert_pending, list_suggestions, manual_link,
    reject_suggestion,
};
pub use transactions::{get_transaction, insert_transaction, list_transactions};
