// src/score.rs
//! Output record types handed to the output consumer (tabular display,
//! CSV export). All scores are bounded to `[0, 100]` by construction and
//! component maps are ordered so serialized output is stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fraud::tags::FraudTag;
use crate::team::TeamTag;

/// Productivity score for one entity (person or manager-led team).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub entity_id: String,
    pub window_label: String,
    /// Bounded total in `[0, 100]`.
    pub score_total: f64,
    /// Named percentile components in `[0, 100]`, for audit. Components
    /// beyond `score_lines_total` / `score_repo_diversity` never feed
    /// the total.
    pub component_scores: BTreeMap<String, f64>,
}

/// Team productivity score plus threshold-derived risk tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScoreRecord {
    /// The line manager identifying the team.
    pub entity_id: String,
    pub window_label: String,
    pub score_total: f64,
    pub component_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TeamTag>,
    /// Developers on this team whose anti-fraud score crossed the
    /// suspicion cutoff. Reported only; never blended into the total.
    pub suspicious_dev_count: u64,
    /// `suspicious_dev_count` over headcount, in `[0, 1]`.
    pub suspicious_dev_share: f64,
}

/// Anti-fraud suspicion score for one entity, with explainable tags.
///
/// Independent of the productivity scores: this record is reported
/// alongside them as a risk/audit signal and must never feed a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRecord {
    pub entity_id: String,
    pub window_label: String,
    /// Composite after protective downweighting, in `[0, 100]`.
    /// Higher = more suspicious.
    pub score_total: f64,
    /// Composite before downweighting; `score_total <= score_total_raw`.
    pub score_total_raw: f64,
    /// The nine weighted sub-scores, each in `[0, 100]`.
    pub component_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<FraudTag>,
    /// Surfaced for audit alongside the burst sub-score.
    pub commit_count: u64,
    pub max_commits_per_hour: u64,
    /// Development role with participation below the window's floor.
    pub under_saturated: bool,
}

impl FraudRecord {
    /// Whether a tag was derived for this entity.
    pub fn has_tag(&self, tag: FraudTag) -> bool {
        self.tags.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_record_serializes_with_ordered_components() {
        let mut components = BTreeMap::new();
        components.insert("score_lines_total".to_string(), 87.5);
        components.insert("score_repo_diversity".to_string(), 40.0);
        let rec = ScoreRecord {
            entity_id: "e1".into(),
            window_label: "2026-07..2026-08".into(),
            score_total: 91.25,
            component_scores: components,
        };

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["entity_id"], json!("e1"));
        assert_eq!(v["component_scores"]["score_lines_total"], json!(87.5));
    }

    #[test]
    fn fraud_record_omits_empty_tags() {
        let rec = FraudRecord {
            entity_id: "e1".into(),
            window_label: "w".into(),
            score_total: 12.0,
            score_total_raw: 12.0,
            component_scores: BTreeMap::new(),
            tags: Vec::new(),
            commit_count: 30,
            max_commits_per_hour: 3,
            under_saturated: false,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("tags").is_none());
    }
}
