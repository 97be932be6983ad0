use chrono::NaiveDate;

use tandem_core::{AccountId, AccountType, NewTransaction, Transaction};

use crate::db::{create_memory_db, insert_account, DbPool};
use crate::transactions::insert_transaction;

pub(crate) async fn test_db() -> DbPool {
    create_memory_db().await.unwrap()
}

pub(crate) async fn account(pool: &DbPool, name: &str, account_type: AccountType) -> AccountId {
    insert_account(pool, name, account_type)
        .await
        .unwrap()
        .id
        .unwrap()
}

pub(crate) async fn tx(
    pool: &DbPool,
    account_id: AccountId,
    amount_cents: i64,
    description: &str,
    date: (i32, u32, u32),
) -> Transaction {
    insert_transaction(
        pool,
        &NewTransaction {
            account_id,
            amount_cents,
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        },
    )
    .await
    .unwrap()
}
