use serde::{Deserialize, Serialize};

/// Every knob of the matching heuristic in one place. Defaults are the
/// production values; a `[matching]` table in the server config can
/// override any subset. The medium/low confidence boundary and the
/// description-similarity threshold are deliberately tunable rather than
/// hard-coded; see `score::description_affinity_bonus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Candidates may sit at most this many days from the subject.
    pub max_window_days: i64,
    /// Cap on candidates considered per scan, newest-window first.
    pub max_candidates: i64,
    /// Weight earned by any admissible pair (same-day case).
    pub base_match_weight: i64,
    /// Subtracted from the base weight per day of separation.
    pub date_distance_penalty: i64,
    /// Added when the magnitude is a whole number of currency units.
    pub round_amount_bonus: i64,
    /// Added when the descriptions look transfer-related.
    pub description_affinity_bonus: i64,
    /// Levenshtein similarity at or above this counts as affinity.
    pub description_similarity_threshold: f32,
    /// Score at or above this classifies as high confidence.
    pub high_confidence_threshold: i64,
    /// Score at or above this (but below high) classifies as medium.
    pub medium_confidence_threshold: i64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        MatchTuning {
            max_window_days: 3,
            max_candidates: 32,
            base_match_weight: 10,
            date_distance_penalty: 2,
            round_amount_bonus: 3,
            description_affinity_bonus: 5,
            description_similarity_threshold: 0.8,
            high_confidence_threshold: 10,
            medium_confidence_threshold: 6,
        }
    }
}

impl MatchTuning {
    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        toml::from_str(toml_content).map_err(|e| format!("Failed to parse tuning TOML: {e}"))
    }
}
