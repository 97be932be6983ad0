pub mod candidate;
pub mod classify;
pub mod score;
pub mod tuning;

pub use candidate::{candidate_window, days_apart, within_window, CandidateQuery};
pub use classify::classify;
pub use score::{
    date_proximity_weight, description_affinity_bonus, is_credit_payment, round_amount_bonus,
    score_pair, PairEvaluation, Side,
};
pub use tuning::MatchTuning;

/// Score, classify, and flag one candidate pair in a single pass. This is
/// the composition the storage scan calls per candidate; each signal stays
/// independently testable underneath it.
pub fn evaluate_pair(a: &Side<'_>, b: &Side<'_>, tuning: &MatchTuning) -> PairEvaluation {
    let score = score_pair(a, b, tuning);
    PairEvaluation {
        score,
        confidence: classify(score, tuning),
        is_credit_payment: is_credit_payment(a, b),
    }
}
