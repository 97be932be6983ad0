use tandem_core::{AccountType, Confidence, Money, Transaction};

use crate::candidate::days_apart;
use crate::tuning::MatchTuning;

/// Tokens that mark a description as transfer-like when present on both
/// sides of a pair.
const TRANSFER_KEYWORDS: &[&str] = &["transfer", "xfer", "payment"];

/// One side of a candidate pair, with the account context scoring needs.
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub tx: &'a Transaction,
    pub account_name: &'a str,
    pub account_type: AccountType,
}

/// The scored outcome for one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEvaluation {
    pub score: i64,
    pub confidence: Confidence,
    pub is_credit_payment: bool,
}

/// Weighted sum of the independent signals. Callers guarantee the pair
/// already passed candidate admission (different accounts, exact opposite
/// amounts, inside the window); scoring only ranks, it never gates.
/// Symmetric in its arguments and fully deterministic.
pub fn score_pair(a: &Side<'_>, b: &Side<'_>, tuning: &MatchTuning) -> i64 {
    let days = days_apart(a.tx.date, b.tx.date);
    date_proximity_weight(days, tuning)
        + round_amount_bonus(a.tx.amount_cents, tuning)
        + description_affinity_bonus(a, b, tuning)
}

/// Base match weight, discounted per day of separation. Same-day pairs
/// earn the full weight; a pair at the window edge still scores positive
/// so that distance refines rank without re-gating admission.
pub fn date_proximity_weight(days_apart: i64, tuning: &MatchTuning) -> i64 {
    (tuning.base_match_weight - days_apart * tuning.date_distance_penalty).max(1)
}

/// Transfers tend to be entered in whole currency units; purchases rarely
/// are.
pub fn round_amount_bonus(amount_cents: i64, tuning: &MatchTuning) -> i64 {
    if !Money::from_cents(amount_cents).is_zero()
        && Money::from_cents(amount_cents).is_whole_units()
    {
        tuning.round_amount_bonus
    } else {
        0
    }
}

/// Description signal: both sides carry a transfer keyword, one side
/// names the other's account, or the normalized descriptions are nearly
/// identical. Which similarity measure is "right" is an open question;
/// it is isolated here behind one threshold.
pub fn description_affinity_bonus(a: &Side<'_>, b: &Side<'_>, tuning: &MatchTuning) -> i64 {
    if descriptions_are_affine(
        &a.tx.description,
        a.account_name,
        &b.tx.description,
        b.account_name,
        tuning.description_similarity_threshold,
    ) {
        tuning.description_affinity_bonus
    } else {
        0
    }
}

/// A card payment is money flowing *into* exactly one credit account.
/// Informational metadata for the reviewer; never feeds the score.
pub fn is_credit_payment(a: &Side<'_>, b: &Side<'_>) -> bool {
    match (a.account_type.is_credit(), b.account_type.is_credit()) {
        (true, false) => a.tx.is_inflow(),
        (false, true) => b.tx.is_inflow(),
        _ => false,
    }
}

fn descriptions_are_affine(
    a_desc: &str,
    a_account: &str,
    b_desc: &str,
    b_account: &str,
    similarity_threshold: f32,
) -> bool {
    let a = normalize(a_desc);
    let b = normalize(b_desc);

    if TRANSFER_KEYWORDS
        .iter()
        .any(|kw| a.contains(kw) && b.contains(kw))
    {
        return true;
    }

    // One side naming the counterparty account is a strong hint the user
    // entered both halves by hand.
    let a_account = normalize(a_account);
    let b_account = normalize(b_account);
    if (!b_account.is_empty() && a.contains(&b_account))
        || (!a_account.is_empty() && b.contains(&a_account))
    {
        return true;
    }

    similarity(&a, &b) >= similarity_threshold
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein similarity in [0.0, 1.0] over already-normalized strings.
fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f32 / max_len as f32)
}

/// Single-row edit distance; inputs are short description strings so the
/// O(m·n) time is irrelevant.
fn levenshtein(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut costs: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut diagonal = costs[0];
        costs[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = costs[j + 1];
            costs[j + 1] = if ca == cb {
                diagonal
            } else {
                diagonal.min(above).min(costs[j]) + 1
            };
            diagonal = above;
        }
    }
    costs[b.len()]
}
