use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use tandem_core::{AccountId, NewTransaction, Transaction, TransactionId, TransactionKind};

use crate::db::DbPool;
use crate::error::StoreError;

pub async fn insert_transaction(
    pool: &DbPool,
    new: &NewTransaction,
) -> Result<Transaction, StoreError> {
    let created_at = Utc::now();
    let row = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO transactions (account_id, kind, amount_cents, description, date, created_at) \
         VALUES (?, 'normal', ?, ?, ?, ?) RETURNING id",
    )
    .bind(new.account_id.0)
    .bind(new.amount_cents)
    .bind(&new.description)
    .bind(new.date)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(Transaction {
        id: TransactionId(row.0),
        account_id: new.account_id,
        kind: TransactionKind::Normal,
        linked_account_id: None,
        amount_cents: new.amount_cents,
        description: new.description.clone(),
        date: new.date,
        created_at,
    })
}

pub async fn get_transaction(
    pool: &DbPool,
    id: TransactionId,
) -> Result<Option<Transaction>, StoreError> {
    let mut conn = pool.acquire().await?;
    Ok(fetch_transaction(&mut *conn, id).await?)
}

pub async fn list_transactions(pool: &DbPool) -> Result<Vec<Transaction>, StoreError> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, account_id, kind, linked_account_id, amount_cents, description, date, created_at \
         FROM transactions ORDER BY date DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_transaction).collect())
}

/// Connection-level fetch so lifecycle operations can read inside their
/// own transaction scope.
pub(crate) async fn fetch_transaction(
    conn: &mut SqliteConnection,
    id: TransactionId,
) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, account_id, kind, linked_account_id, amount_cents, description, date, created_at \
         FROM transactions WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(map_transaction))
}

/// Retype both halves of a confirmed pair as a linked transfer, each
/// pointing at the other's account. Runs on the caller's transaction so
/// the two UPDATEs commit together or not at all.
pub(crate) async fn link_pair(
    conn: &mut SqliteConnection,
    a: &Transaction,
    b: &Transaction,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE transactions SET kind = 'transfer', linked_account_id = ? WHERE id = ?")
        .bind(b.account_id.0)
        .bind(a.id.0)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE transactions SET kind = 'transfer', linked_account_id = ? WHERE id = ?")
        .bind(a.account_id.0)
        .bind(b.id.0)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) type TransactionRow = (
    i64,
    i64,
    String,
    Option<i64>,
    i64,
    String,
    chrono::NaiveDate,
    DateTime<Utc>,
);

pub(crate) fn map_transaction(r: TransactionRow) -> Transaction {
    Transaction {
        id: TransactionId(r.0),
        account_id: AccountId(r.1),
        kind: r.2.parse().unwrap_or_default(),
        linked_account_id: r.3.map(AccountId),
        amount_cents: r.4,
        description: r.5,
        date: r.6,
        created_at: r.7,
    }
}
