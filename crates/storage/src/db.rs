use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

use tandem_core::{Account, AccountId, AccountType};

use crate::error::StoreError;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    configure(&pool).await?;
    run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests. Single connection, same schema.
pub async fn create_memory_db() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure(&pool).await?;
    run_migrations(&pool).await?;

    Ok(pool)
}

async fn configure(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            account_type TEXT NOT NULL,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            kind TEXT NOT NULL DEFAULT 'normal',
            linked_account_id INTEGER,
            amount_cents INTEGER NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (account_id) REFERENCES accounts(id),
            FOREIGN KEY (linked_account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Candidate search filters on exact counter-amount plus a date range.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_amount_date ON transactions(amount_cents, date)",
    )
    .execute(pool)
    .await?;

    // The CHECK plus the unique index make the unordered-pair constraint a
    // database guarantee, not an application courtesy: rows always store
    // the smaller transaction id first, and a second insert of the same
    // pair conflicts no matter which side found it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_suggestions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_a_id INTEGER NOT NULL,
            transaction_b_id INTEGER NOT NULL,
            score INTEGER NOT NULL,
            confidence TEXT NOT NULL,
            is_credit_payment INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            reviewed_at TEXT,
            FOREIGN KEY (transaction_a_id) REFERENCES transactions(id),
            FOREIGN KEY (transaction_b_id) REFERENCES transactions(id),
            CHECK (transaction_a_id < transaction_b_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_suggestions_pair ON match_suggestions(transaction_a_id, transaction_b_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_suggestions_status ON match_suggestions(status)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_suggestions_tx_a ON match_suggestions(transaction_a_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_suggestions_tx_b ON match_suggestions(transaction_b_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_account(
    pool: &DbPool,
    name: &str,
    account_type: AccountType,
) -> Result<Account, StoreError> {
    let created_at = Utc::now();
    let row = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO accounts (name, account_type, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(account_type.as_str())
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(Account {
        id: Some(AccountId(row.0)),
        name: name.to_string(),
        account_type,
        is_archived: false,
        created_at: Some(created_at),
    })
}

pub async fn get_account(pool: &DbPool, id: AccountId) -> Result<Option<Account>, StoreError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, account_type, is_archived, created_at FROM accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_account))
}

pub async fn get_all_accounts(pool: &DbPool) -> Result<Vec<Account>, StoreError> {
    let rows = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, account_type, is_archived, created_at FROM accounts WHERE is_archived = 0 ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_account).collect())
}

/// Connection-level fetch for use inside lifecycle transactions. Account
/// rows are foreign-key guaranteed, so a miss is treated as a database
/// error rather than a domain one.
pub(crate) async fn fetch_account(
    conn: &mut sqlx::SqliteConnection,
    id: AccountId,
) -> Result<Account, sqlx::Error> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, account_type, is_archived, created_at FROM accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_one(conn)
    .await?;

    Ok(map_account(row))
}

type AccountRow = (i64, String, String, i64, chrono::DateTime<Utc>);

fn map_account(r: AccountRow) -> Account {
    Account {
        id: Some(AccountId(r.0)),
        name: r.1,
        account_type: AccountType::from_str(&r.2).unwrap_or(AccountType::Checking),
        is_archived: r.3 != 0,
        created_at: Some(r.4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_backed_db_creates_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tandem.db");

        let pool = create_db(&path).await.unwrap();
        let account = insert_account(&pool, "Checking", AccountType::Checking)
            .await
            .unwrap();
        drop(pool);

        // Migrations are idempotent and data survives a reopen.
        let pool = create_db(&path).await.unwrap();
        let accounts = get_all_accounts(&pool).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, account.id);
        assert_eq!(accounts[0].account_type, AccountType::Checking);
    }

    #[tokio::test]
    async fn account_round_trip_preserves_type() {
        let pool = create_memory_db().await.unwrap();
        for (name, account_type) in [
            ("Checking", AccountType::Checking),
            ("Savings", AccountType::Savings),
            ("Visa", AccountType::Credit),
            ("Wallet", AccountType::Cash),
        ] {
            let inserted = insert_account(&pool, name, account_type).await.unwrap();
            let loaded = get_account(&pool, inserted.id.unwrap()).await.unwrap().unwrap();
            assert_eq!(loaded.account_type, account_type);
            assert_eq!(loaded.name, name);
        }
    }

    #[tokio::test]
    async fn unknown_account_is_none() {
        let pool = create_memory_db().await.unwrap();
        assert!(get_account(&pool, AccountId(99)).await.unwrap().is_none());
    }
}
