use chrono::{Duration, NaiveDate};

use tandem_core::{AccountId, Transaction, TransactionId, TransactionKind};

use crate::tuning::MatchTuning;

/// Absolute calendar-day distance between two dates.
pub fn days_apart(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// Both window edges are inclusive: exactly `max_window_days` apart is
/// still a candidate; one day more is not.
pub fn within_window(a: NaiveDate, b: NaiveDate, tuning: &MatchTuning) -> bool {
    days_apart(a, b) <= tuning.max_window_days
}

pub fn candidate_window(date: NaiveDate, tuning: &MatchTuning) -> (NaiveDate, NaiveDate) {
    (
        date - Duration::days(tuning.max_window_days),
        date + Duration::days(tuning.max_window_days),
    )
}

/// The storage-layer filter for one subject transaction, precomputed so
/// the SQL only binds values. Candidate search itself stays read-only;
/// the store additionally drops pairs that already have a suggestion row
/// in any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub subject_id: TransactionId,
    pub subject_date: NaiveDate,
    pub exclude_account_id: AccountId,
    pub counter_amount_cents: i64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub limit: i64,
}

impl CandidateQuery {
    /// `None` when the subject can never have candidates: zero amounts
    /// are degenerate and already-linked transactions are not
    /// re-considered.
    pub fn for_subject(tx: &Transaction, tuning: &MatchTuning) -> Option<Self> {
        if tx.amount_cents == 0 || tx.kind != TransactionKind::Normal {
            return None;
        }
        let (window_start, window_end) = candidate_window(tx.date, tuning);
        Some(CandidateQuery {
            subject_id: tx.id,
            subject_date: tx.date,
            exclude_account_id: tx.account_id,
            counter_amount_cents: tx.counter_amount_cents(),
            window_start,
            window_end,
            limit: tuning.max_candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tandem_core::Transaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(amount: i64, kind: TransactionKind) -> Transaction {
        Transaction {
            id: TransactionId(7),
            account_id: AccountId(3),
            kind,
            linked_account_id: None,
            amount_cents: amount,
            description: "Test".to_string(),
            date: date(2026, 3, 15),
            created_at: DateTime::<chrono::Utc>::MIN_UTC,
        }
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let t = MatchTuning::default();
        assert!(within_window(date(2026, 3, 15), date(2026, 3, 18), &t));
        assert!(within_window(date(2026, 3, 15), date(2026, 3, 12), &t));
        assert!(!within_window(date(2026, 3, 15), date(2026, 3, 19), &t));
        assert!(!within_window(date(2026, 3, 15), date(2026, 3, 11), &t));
    }

    #[test]
    fn window_spans_both_directions() {
        let t = MatchTuning::default();
        let (start, end) = candidate_window(date(2026, 3, 15), &t);
        assert_eq!(start, date(2026, 3, 12));
        assert_eq!(end, date(2026, 3, 18));
    }

    #[test]
    fn query_negates_amount_and_excludes_own_account() {
        let t = MatchTuning::default();
        let q = CandidateQuery::for_subject(&tx(-50_000, TransactionKind::Normal), &t).unwrap();
        assert_eq!(q.counter_amount_cents, 50_000);
        assert_eq!(q.exclude_account_id, AccountId(3));
        assert_eq!(q.subject_id, TransactionId(7));
        assert_eq!(q.subject_date, date(2026, 3, 15));
        assert_eq!(q.limit, t.max_candidates);
        assert_eq!(q.window_start, date(2026, 3, 12));
        assert_eq!(q.window_end, date(2026, 3, 18));
    }

    #[test]
    fn zero_amount_has_no_candidates() {
        let t = MatchTuning::default();
        assert!(CandidateQuery::for_subject(&tx(0, TransactionKind::Normal), &t).is_none());
    }

    #[test]
    fn linked_transactions_are_not_reconsidered() {
        let t = MatchTuning::default();
        assert!(CandidateQuery::for_subject(&tx(-50_000, TransactionKind::Transfer), &t).is_none());
    }

    #[test]
    fn days_apart_is_symmetric() {
        assert_eq!(days_apart(date(2026, 3, 15), date(2026, 3, 18)), 3);
        assert_eq!(days_apart(date(2026, 3, 18), date(2026, 3, 15)), 3);
        assert_eq!(days_apart(date(2026, 3, 15), date(2026, 3, 15)), 0);
    }
}
