use tandem_core::Confidence;

use crate::tuning::MatchTuning;

/// Map a raw score onto the three operator-facing tiers. Thresholds live
/// in `MatchTuning`; the high bar equals the base match weight so that a
/// bare same-day match already triages as high, and every bonus is
/// non-negative so signals can only promote a pair, never demote it.
pub fn classify(score: i64, tuning: &MatchTuning) -> Confidence {
    if score >= tuning.high_confidence_threshold {
        Confidence::High
    } else if score >= tuning.medium_confidence_threshold {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
