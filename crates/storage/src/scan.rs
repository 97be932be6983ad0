use chrono::{DateTime, Utc};

use tandem_core::{
    AccountType, LinkError, MatchSuggestion, Transaction, TransactionId,
};
use tandem_match::{evaluate_pair, CandidateQuery, MatchTuning, Side};

use crate::db::{get_account, DbPool};
use crate::error::StoreError;
use crate::suggestions::insert_pending;
use crate::transactions::{get_transaction, map_transaction, TransactionRow};

/// Run the matching engine for one newly visible transaction: find
/// opposite-signed equal-magnitude candidates on other accounts inside
/// the date window, score each pair, and record pending suggestions.
/// Pairs that already have a suggestion row in any status are skipped at
/// the SQL level, so re-running over the same data is a no-op. Read-only
/// except for the suggestion inserts; safe to run concurrently for
/// distinct subjects.
pub async fn scan_for_matches(
    pool: &DbPool,
    id: TransactionId,
    tuning: &MatchTuning,
) -> Result<Vec<MatchSuggestion>, StoreError> {
    let subject = get_transaction(pool, id)
        .await?
        .ok_or(LinkError::TransactionNotFound(id))?;

    let Some(query) = CandidateQuery::for_subject(&subject, tuning) else {
        return Ok(Vec::new());
    };

    let subject_account = get_account(pool, subject.account_id)
        .await?
        .ok_or_else(|| sqlx::Error::RowNotFound)?;

    let candidates = find_candidates(pool, &query).await?;
    let mut created = Vec::new();

    for (candidate, account_name, account_type) in &candidates {
        let eval = evaluate_pair(
            &Side {
                tx: &subject,
                account_name: &subject_account.name,
                account_type: subject_account.account_type,
            },
            &Side {
                tx: candidate,
                account_name,
                account_type: *account_type,
            },
            tuning,
        );

        if let Some(suggestion) = insert_pending(
            pool,
            subject.id,
            candidate.id,
            eval.score,
            eval.confidence,
            eval.is_credit_payment,
        )
        .await?
        {
            created.push(suggestion);
        }
    }

    if !created.is_empty() {
        tracing::info!(
            subject = %subject.id,
            candidates = candidates.len(),
            suggested = created.len(),
            "transfer scan recorded suggestions"
        );
    }

    Ok(created)
}

/// Candidate admission pushed down to SQL: different account, exact
/// counter amount, still unlinked, inside the window, no suggestion row
/// for the pair yet. Nearest dates first, capped.
async fn find_candidates(
    pool: &DbPool,
    query: &CandidateQuery,
) -> Result<Vec<(Transaction, String, AccountType)>, StoreError> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        "SELECT t.id, t.account_id, t.kind, t.linked_account_id, t.amount_cents, t.description, t.date, t.created_at, \
                a.name, a.account_type \
         FROM transactions t \
         JOIN accounts a ON a.id = t.account_id \
         WHERE t.account_id != ? \
           AND t.amount_cents = ? \
           AND t.kind = 'normal' \
           AND t.date BETWEEN ? AND ? \
           AND NOT EXISTS ( \
               SELECT 1 FROM match_suggestions s \
               WHERE (s.transaction_a_id = t.id AND s.transaction_b_id = ?) \
                  OR (s.transaction_a_id = ? AND s.transaction_b_id = t.id) \
           ) \
         ORDER BY ABS(JULIANDAY(t.date) - JULIANDAY(?)) ASC, t.id ASC \
         LIMIT ?",
    )
    .bind(query.exclude_account_id.0)
    .bind(query.counter_amount_cents)
    .bind(query.window_start)
    .bind(query.window_end)
    .bind(query.subject_id.0)
    .bind(query.subject_id.0)
    .bind(query.subject_date)
    .bind(query.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, account_id, kind, linked, amount, desc, date, created, name, type_str)| {
            let account_type = type_str.parse().unwrap_or(AccountType::Checking);
            let row: TransactionRow = (id, account_id, kind, linked, amount, desc, date, created);
            (map_transaction(row), name, account_type)
        })
        .collect())
}

type CandidateRow = (
    i64,
    i64,
    String,
    Option<i64>,
    i64,
    String,
    chrono::NaiveDate,
    DateTime<Utc>,
    String,
    String,
);

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{AccountType, Confidence, SuggestionStatus};

    use crate::suggestions::list_suggestions;
    use crate::testutil::{account, test_db, tx};

    fn tuning() -> MatchTuning {
        MatchTuning::default()
    }

    #[tokio::test]
    async fn pair_inside_window_yields_one_pending_suggestion() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -50_000, "To savings", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 50_000, "From checking", (2026, 3, 13)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, SuggestionStatus::Pending);

        let all = list_suggestions(&pool, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn pair_outside_window_yields_nothing() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -50_000, "To savings", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 50_000, "From checking", (2026, 3, 15)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert!(created.is_empty());
        assert!(list_suggestions(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn window_edge_is_inclusive_one_past_is_not() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -20_000, "move", (2026, 3, 10)).await;
        let at_edge = tx(&pool, savings, 20_000, "move", (2026, 3, 13)).await;
        assert_eq!(
            scan_for_matches(&pool, at_edge.id, &tuning()).await.unwrap().len(),
            1
        );

        tx(&pool, checking, -30_000, "move", (2026, 3, 10)).await;
        let past_edge = tx(&pool, savings, 30_000, "move", (2026, 3, 14)).await;
        assert!(scan_for_matches(&pool, past_edge.id, &tuning())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn rescan_is_idempotent() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        let outflow = tx(&pool, checking, -50_000, "To savings", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 50_000, "From checking", (2026, 3, 11)).await;

        assert_eq!(
            scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap().len(),
            1
        );
        // Scanning again, from either side, creates nothing new.
        assert!(scan_for_matches(&pool, inflow.id, &tuning())
            .await
            .unwrap()
            .is_empty());
        assert!(scan_for_matches(&pool, outflow.id, &tuning())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(list_suggestions(&pool, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_account_is_never_a_candidate() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;

        tx(&pool, checking, -50_000, "refund me", (2026, 3, 10)).await;
        let inflow = tx(&pool, checking, 50_000, "refund", (2026, 3, 10)).await;

        assert!(scan_for_matches(&pool, inflow.id, &tuning())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn same_sign_is_never_a_candidate() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, 50_000, "deposit", (2026, 3, 10)).await;
        let other = tx(&pool, savings, 50_000, "deposit", (2026, 3, 10)).await;

        assert!(scan_for_matches(&pool, other.id, &tuning())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn zero_amount_subject_yields_nothing() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, 0, "placeholder", (2026, 3, 10)).await;
        let zero = tx(&pool, savings, 0, "placeholder", (2026, 3, 10)).await;

        assert!(scan_for_matches(&pool, zero.id, &tuning())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn one_subject_can_match_several_counterparts() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;
        let cash = account(&pool, "Cash", AccountType::Cash).await;

        let subject = tx(&pool, checking, -10_000, "move", (2026, 3, 10)).await;
        tx(&pool, savings, 10_000, "in", (2026, 3, 10)).await;
        tx(&pool, cash, 10_000, "in", (2026, 3, 11)).await;

        let created = scan_for_matches(&pool, subject.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 2);
        let pending = list_suggestions(&pool, Some(SuggestionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn credit_inflow_is_flagged_as_card_payment() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let visa = account(&pool, "Visa", AccountType::Credit).await;

        tx(&pool, checking, -50_000, "card payment", (2026, 3, 10)).await;
        let inflow = tx(&pool, visa, 50_000, "payment received", (2026, 3, 10)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 1);
        assert!(created[0].is_credit_payment);
    }

    #[tokio::test]
    async fn checking_to_savings_is_not_a_card_payment() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -50_000, "move", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 50_000, "move", (2026, 3, 10)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 1);
        assert!(!created[0].is_credit_payment);
    }

    #[tokio::test]
    async fn same_day_round_transfer_classifies_high() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -100_000, "Transfer to savings", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 100_000, "Transfer from checking", (2026, 3, 10)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 1);
        // 10 (same day) + 3 (round) + 5 (shared keyword) = 18
        assert_eq!(created[0].score, 18);
        assert_eq!(created[0].confidence, Confidence::High);
    }

    #[tokio::test]
    async fn window_edge_fractional_pair_classifies_low() {
        let pool = test_db().await;
        let checking = account(&pool, "Checking", AccountType::Checking).await;
        let savings = account(&pool, "Savings", AccountType::Savings).await;

        tx(&pool, checking, -49_987, "groceries reimbursement", (2026, 3, 10)).await;
        let inflow = tx(&pool, savings, 49_987, "misc deposit", (2026, 3, 13)).await;

        let created = scan_for_matches(&pool, inflow.id, &tuning()).await.unwrap();
        assert_eq!(created.len(), 1);
        // Bare base weight at the window edge: 10 - 3*2 = 4
        assert_eq!(created[0].score, 4);
        assert_eq!(created[0].confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn missing_subject_is_an_error() {
        let pool = test_db().await;
        let err = scan_for_matches(&pool, TransactionId(999), &tuning())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Link(LinkError::TransactionNotFound(TransactionId(999)))
        ));
    }
}
