use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use tandem_core::{
    ordered_pair, Confidence, LinkError, MatchSuggestion, SuggestionId, SuggestionStatus,
    Transaction, TransactionId, TransactionKind,
};
use tandem_match::{evaluate_pair, MatchTuning, Side};

use crate::db::{fetch_account, DbPool};
use crate::error::StoreError;
use crate::transactions::{fetch_transaction, link_pair};

/// Record a new pending suggestion for an unordered pair. A no-op when
/// any row for the pair already exists: the unique index is the
/// authority, so two concurrent scans arriving from opposite sides
/// deduplicate instead of double-inserting.
pub async fn insert_pending(
    pool: &DbPool,
    a: TransactionId,
    b: TransactionId,
    score: i64,
    confidence: Confidence,
    is_credit_payment: bool,
) -> Result<Option<MatchSuggestion>, StoreError> {
    let (pa, pb) = ordered_pair(a, b);
    if pa == pb {
        return Ok(None);
    }

    let created_at = Utc::now();
    let row = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO match_suggestions \
         (transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at) \
         VALUES (?, ?, ?, ?, ?, 'pending', ?) \
         ON CONFLICT(transaction_a_id, transaction_b_id) DO NOTHING \
         RETURNING id",
    )
    .bind(pa.0)
    .bind(pb.0)
    .bind(score)
    .bind(confidence.as_str())
    .bind(is_credit_payment as i64)
    .bind(created_at)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id,)| MatchSuggestion {
        id: SuggestionId(id),
        transaction_a_id: pa,
        transaction_b_id: pb,
        score,
        confidence,
        is_credit_payment,
        status: SuggestionStatus::Pending,
        created_at,
        reviewed_at: None,
    }))
}

pub async fn get_suggestion(
    pool: &DbPool,
    id: SuggestionId,
) -> Result<Option<MatchSuggestion>, StoreError> {
    let mut conn = pool.acquire().await?;
    Ok(fetch_suggestion(&mut *conn, id).await?)
}

/// Review listing, best candidates first.
pub async fn list_suggestions(
    pool: &DbPool,
    status: Option<SuggestionStatus>,
) -> Result<Vec<MatchSuggestion>, StoreError> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, SuggestionRow>(
                "SELECT id, transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at, reviewed_at \
                 FROM match_suggestions WHERE status = ? ORDER BY score DESC, id ASC",
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SuggestionRow>(
                "SELECT id, transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at, reviewed_at \
                 FROM match_suggestions ORDER BY score DESC, id ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(map_suggestion).collect())
}

/// Confirm a suggestion: retype both transactions as a linked transfer,
/// mark the row accepted, and cascade-reject every other pending
/// suggestion touching either transaction. Runs as one database
/// transaction; a failure at any step leaves everything untouched.
pub async fn accept_suggestion(
    pool: &DbPool,
    id: SuggestionId,
) -> Result<(Transaction, Transaction), StoreError> {
    let mut db_tx = pool.begin().await?;
    let now = Utc::now();

    let mut suggestion = fetch_suggestion(&mut *db_tx, id)
        .await?
        .ok_or(LinkError::SuggestionNotFound(id))?;
    suggestion.accept(now)?;

    let a = fetch_transaction(&mut *db_tx, suggestion.transaction_a_id)
        .await?
        .ok_or(LinkError::TransactionNotFound(suggestion.transaction_a_id))?;
    let b = fetch_transaction(&mut *db_tx, suggestion.transaction_b_id)
        .await?
        .ok_or(LinkError::TransactionNotFound(suggestion.transaction_b_id))?;

    // Double-link guard: a racing accept that already committed leaves
    // the transactions transfer-typed, and the loser fails here.
    if a.is_linked() {
        return Err(LinkError::AlreadyLinked(a.id).into());
    }
    if b.is_linked() {
        return Err(LinkError::AlreadyLinked(b.id).into());
    }

    link_pair(&mut *db_tx, &a, &b).await?;
    mark_reviewed(&mut *db_tx, id, SuggestionStatus::Accepted, now).await?;
    let invalidated = cascade_reject(&mut *db_tx, a.id, b.id, id, now).await?;

    db_tx.commit().await?;

    tracing::info!(
        suggestion = %id,
        tx_a = %a.id,
        tx_b = %b.id,
        invalidated,
        "accepted transfer suggestion"
    );

    Ok((linked_copy(&a, &b), linked_copy(&b, &a)))
}

/// Dismiss a suggestion. Terminal, and deliberately boring: neither
/// transaction is touched.
pub async fn reject_suggestion(
    pool: &DbPool,
    id: SuggestionId,
) -> Result<MatchSuggestion, StoreError> {
    let mut db_tx = pool.begin().await?;
    let now = Utc::now();

    let mut suggestion = fetch_suggestion(&mut *db_tx, id)
        .await?
        .ok_or(LinkError::SuggestionNotFound(id))?;
    suggestion.reject(now)?;

    mark_reviewed(&mut *db_tx, id, SuggestionStatus::Rejected, now).await?;
    db_tx.commit().await?;

    tracing::info!(suggestion = %id, "rejected transfer suggestion");

    Ok(suggestion)
}

/// Operator escape hatch: link two transactions directly, without a
/// prior generated suggestion. Validates the same preconditions as
/// candidate admission, then runs the accept mutation path. An existing
/// pending suggestion for the pair is accepted in place; otherwise an
/// already-accepted row is recorded for the audit trail.
pub async fn manual_link(
    pool: &DbPool,
    a_id: TransactionId,
    b_id: TransactionId,
    tuning: &MatchTuning,
) -> Result<(Transaction, Transaction), StoreError> {
    if a_id == b_id {
        return Err(LinkError::SameAccount.into());
    }

    let mut db_tx = pool.begin().await?;
    let now = Utc::now();

    let a = fetch_transaction(&mut *db_tx, a_id)
        .await?
        .ok_or(LinkError::TransactionNotFound(a_id))?;
    let b = fetch_transaction(&mut *db_tx, b_id)
        .await?
        .ok_or(LinkError::TransactionNotFound(b_id))?;

    if a.account_id == b.account_id {
        return Err(LinkError::SameAccount.into());
    }
    if a.amount_cents == 0 {
        return Err(LinkError::ZeroAmount.into());
    }
    if a.amount_cents != b.counter_amount_cents() {
        return Err(LinkError::AmountMismatch(a.amount_cents, b.amount_cents).into());
    }
    if a.is_linked() {
        return Err(LinkError::AlreadyLinked(a.id).into());
    }
    if b.is_linked() {
        return Err(LinkError::AlreadyLinked(b.id).into());
    }

    // Score the pair for the audit trail even though the operator has
    // already decided.
    let account_a = fetch_account(&mut *db_tx, a.account_id).await?;
    let account_b = fetch_account(&mut *db_tx, b.account_id).await?;
    let eval = evaluate_pair(
        &Side {
            tx: &a,
            account_name: &account_a.name,
            account_type: account_a.account_type,
        },
        &Side {
            tx: &b,
            account_name: &account_b.name,
            account_type: account_b.account_type,
        },
        tuning,
    );

    let (pa, pb) = ordered_pair(a.id, b.id);
    let recorded_id = match fetch_suggestion_by_pair(&mut *db_tx, pa, pb).await? {
        Some(mut existing) => match existing.status {
            SuggestionStatus::Pending => {
                existing.accept(now)?;
                mark_reviewed(&mut *db_tx, existing.id, SuggestionStatus::Accepted, now).await?;
                existing.id
            }
            SuggestionStatus::Accepted => {
                return Err(LinkError::AlreadyReviewed(existing.id, existing.status).into());
            }
            // A previously rejected pair stays rejected in the audit
            // trail; the operator's link still goes through.
            SuggestionStatus::Rejected => existing.id,
        },
        None => {
            let row = sqlx::query_as::<_, (i64,)>(
                "INSERT INTO match_suggestions \
                 (transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at, reviewed_at) \
                 VALUES (?, ?, ?, ?, ?, 'accepted', ?, ?) RETURNING id",
            )
            .bind(pa.0)
            .bind(pb.0)
            .bind(eval.score)
            .bind(eval.confidence.as_str())
            .bind(eval.is_credit_payment as i64)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *db_tx)
            .await?;
            SuggestionId(row.0)
        }
    };

    link_pair(&mut *db_tx, &a, &b).await?;
    let invalidated = cascade_reject(&mut *db_tx, a.id, b.id, recorded_id, now).await?;

    db_tx.commit().await?;

    tracing::info!(tx_a = %a.id, tx_b = %b.id, invalidated, "manually linked transfer pair");

    Ok((linked_copy(&a, &b), linked_copy(&b, &a)))
}

/// The accepted pair's transactions as they look after `link_pair`.
fn linked_copy(tx: &Transaction, other: &Transaction) -> Transaction {
    let mut updated = tx.clone();
    updated.kind = TransactionKind::Transfer;
    updated.linked_account_id = Some(other.account_id);
    updated
}

async fn mark_reviewed(
    conn: &mut SqliteConnection,
    id: SuggestionId,
    status: SuggestionStatus,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE match_suggestions SET status = ?, reviewed_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id.0)
        .execute(conn)
        .await?;
    Ok(())
}

/// Reject every other pending suggestion touching either transaction of
/// an accepted pair. Runs on the accept's own transaction so a reader
/// never sees the link without the invalidation.
async fn cascade_reject(
    conn: &mut SqliteConnection,
    a: TransactionId,
    b: TransactionId,
    except: SuggestionId,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE match_suggestions SET status = 'rejected', reviewed_at = ? \
         WHERE status = 'pending' AND id != ? \
           AND (transaction_a_id IN (?, ?) OR transaction_b_id IN (?, ?))",
    )
    .bind(now)
    .bind(except.0)
    .bind(a.0)
    .bind(b.0)
    .bind(a.0)
    .bind(b.0)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn fetch_suggestion(
    conn: &mut SqliteConnection,
    id: SuggestionId,
) -> Result<Option<MatchSuggestion>, sqlx::Error> {
    let row = sqlx::query_as::<_, SuggestionRow>(
        "SELECT id, transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at, reviewed_at \
         FROM match_suggestions WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(map_suggestion))
}

async fn fetch_suggestion_by_pair(
    conn: &mut SqliteConnection,
    a: TransactionId,
    b: TransactionId,
) -> Result<Option<MatchSuggestion>, sqlx::Error> {
    let row = sqlx::query_as::<_, SuggestionRow>(
        "SELECT id, transaction_a_id, transaction_b_id, score, confidence, is_credit_payment, status, created_at, reviewed_at \
         FROM match_suggestions WHERE transaction_a_id = ? AND transaction_b_id = ?",
    )
    .bind(a.0)
    .bind(b.0)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(map_suggestion))
}

type SuggestionRow = (
    i64,
    i64,
    i64,
    i64,
    String,
    i64,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn map_suggestion(r: SuggestionRow) -> MatchSuggestion {
    MatchSuggestion {
        id: SuggestionId(r.0),
        transaction_a_id: TransactionId(r.1),
        transaction_b_id: TransactionId(r.2),
        score: r.3,
        confidence: r.4.parse().unwrap_or(Confidence::Low),
        is_credit_payment: r.5 != 0,
        status: r.6.parse().unwrap_or(SuggestionStatus::Pending),
        created_at: r.7,
        reviewed_at: r.8,
    }
}
