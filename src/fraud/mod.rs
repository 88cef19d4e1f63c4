// src/fraud/mod.rs
//! # Anti-Fraud Heuristic Engine
//! Flags commit behavior consistent with gaming the metrics: tiny/empty
//! commits, bursts, template messages, add/delete flips, single-repo
//! grinding. Nine population-ranked sub-scores combine into one
//! composite, protective rules discount entities the heuristics should
//! not accuse, and every discount or suspicion is named by a tag.
//!
//! The output is a risk/audit signal only. It must never feed the
//! productivity totals — anti-gaming noise must not distort rankings.

pub mod tags;
pub mod weights;

pub use tags::{FraudTag, TagThresholds};
pub use weights::FraudWeights;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{check_unique_entities, check_window_months, ScoreError};
use crate::features::EntityFeatureVector;
use crate::percentile::{normalize, rank_fraction};
use crate::role_weights::RoleWeightsConfig;
use crate::score::FraudRecord;

/// Below this many commits the sample is too thin to accuse.
pub const LOW_SAMPLE_COMMITS: u64 = 20;
/// Composite multiplier for thin samples.
pub const LOW_SAMPLE_MULTIPLIER: f64 = 0.5;
/// Composite multiplier for protected high performers.
pub const HIGH_PERFORMER_MULTIPLIER: f64 = 0.6;
/// Rank (fraction) at or above which a performance signal protects.
pub const PROTECTIVE_RANK_MIN: f64 = 0.80;
/// Concentration discount when the top1 repo is core.
pub const CORE_REPO_DISCOUNT: f64 = 0.6;

/// Entities with a single commit have no interval; rank them as a very
/// long one (least suspicious).
const MISSING_INTERVAL_SECONDS: f64 = 999_999_999.0;

/// Which protective rule fired, if any. The rules are ordered and
/// mutually exclusive: the first match wins and multipliers never stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Downweight {
    LowSample,
    HighPerformer,
}

impl Downweight {
    fn multiplier(self) -> f64 {
        match self {
            Downweight::LowSample => LOW_SAMPLE_MULTIPLIER,
            Downweight::HighPerformer => HIGH_PERFORMER_MULTIPLIER,
        }
    }
}

/// Compute suspicion scores and tags for one window's active population.
pub fn compute_fraud_scores(
    population: &[EntityFeatureVector],
    window_months: i64,
    weights: &FraudWeights,
    roles: &RoleWeightsConfig,
) -> Result<Vec<FraudRecord>, ScoreError> {
    check_window_months(window_months)?;
    check_unique_entities(population.iter().map(|v| v.entity_id.as_str()))?;
    if population.len() < 5 {
        warn!(
            population = population.len(),
            "small population; suspicion ranks will be coarse"
        );
    }

    let min_commits =
        crate::employee::MIN_COMMITS_PER_MONTH * window_months as u64;
    debug!(
        population = population.len(),
        window_months, "scoring suspicion for active population"
    );

    let metric = |f: fn(&EntityFeatureVector) -> f64, reverse: bool| {
        let values: Vec<(&str, f64)> = population
            .iter()
            .map(|v| (v.entity_id.as_str(), f(v)))
            .collect();
        normalize(&values, reverse)
    };
    let fraction = |f: fn(&EntityFeatureVector) -> f64| {
        let values: Vec<(&str, f64)> = population
            .iter()
            .map(|v| (v.entity_id.as_str(), f(v)))
            .collect();
        rank_fraction(&values)
    };

    let s_tiny = metric(|v| v.tiny_change_ratio, false);
    let s_small = metric(|v| v.small_change_ratio, false);
    let s_zero = metric(|v| v.zero_change_ratio, false);
    let s_burst = metric(|v| v.max_commits_per_10min as f64, false);
    // Shorter intervals are more suspicious.
    let s_inter_commit = metric(
        |v| v.median_inter_commit_seconds.unwrap_or(MISSING_INTERVAL_SECONDS),
        true,
    );
    let s_balance = metric(|v| v.balanced_edit_ratio, false);
    // Repetitive messages are more suspicious.
    let s_message = metric(|v| v.message_unique_ratio.unwrap_or(1.0), true);
    let s_single_repo = metric(|v| v.top1_repo_share, false);
    // Low average churn per commit is more suspicious.
    let s_low_intensity = metric(|v| v.changed_lines_per_commit, true);

    // Protective standings use raw (unweighted) output volume.
    let prod_rank = fraction(|v| v.changed_lines_total as f64);
    let intensity_rank = fraction(|v| v.changed_lines_per_commit);
    let repo_rank = fraction(|v| v.repo_count as f64);
    let msg_quality_rank = fraction(|v| v.message_unique_ratio.unwrap_or(1.0));

    let thresholds = TagThresholds::from_population(population);

    let mut records: Vec<FraudRecord> = population
        .iter()
        .map(|v| {
            let id = v.entity_id.as_str();

            // Concentration on a shared high-traffic repo is ownership,
            // not gaming; discount it before weighting.
            let single_repo = if v.top1_repo_is_core {
                s_single_repo[id] * CORE_REPO_DISCOUNT
            } else {
                s_single_repo[id]
            };

            let mut components = BTreeMap::new();
            components.insert("score_tiny".to_string(), s_tiny[id]);
            components.insert("score_small".to_string(), s_small[id]);
            components.insert("score_zero".to_string(), s_zero[id]);
            components.insert("score_burst".to_string(), s_burst[id]);
            components.insert("score_inter_commit".to_string(), s_inter_commit[id]);
            components.insert("score_balance".to_string(), s_balance[id]);
            components.insert("score_message".to_string(), s_message[id]);
            components.insert("score_single_repo".to_string(), single_repo);
            components.insert("score_low_intensity".to_string(), s_low_intensity[id]);

            let score_total_raw = weights.w_tiny * s_tiny[id]
                + weights.w_small * s_small[id]
                + weights.w_zero * s_zero[id]
                + weights.w_burst * s_burst[id]
                + weights.w_inter_commit * s_inter_commit[id]
                + weights.w_balance * s_balance[id]
                + weights.w_message * s_message[id]
                + weights.w_single_repo * single_repo
                + weights.w_low_intensity * s_low_intensity[id];

            let downweight = protective_downweight(
                v.commit_count,
                [
                    prod_rank[id],
                    intensity_rank[id],
                    repo_rank[id],
                    msg_quality_rank[id],
                ],
            );
            let score_total = match downweight {
                Some(d) => score_total_raw * d.multiplier(),
                None => score_total_raw,
            };

            let is_dev_role = roles.is_development_role(v.role.as_deref());
            let under_saturated = is_dev_role && v.commit_count < min_commits;
            let tags = tags::derive_tags(
                v,
                &thresholds,
                min_commits,
                is_dev_role,
                downweight == Some(Downweight::HighPerformer),
                downweight == Some(Downweight::LowSample),
            );

            FraudRecord {
                entity_id: v.entity_id.clone(),
                window_label: v.window_label.clone(),
                score_total,
                score_total_raw,
                component_scores: components,
                tags,
                commit_count: v.commit_count,
                max_commits_per_hour: v.max_commits_per_hour,
                under_saturated,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.score_total
            .total_cmp(&a.score_total)
            .then_with(|| b.commit_count.cmp(&a.commit_count))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    Ok(records)
}

/// Ordered protective rules; the first match wins.
fn protective_downweight(commit_count: u64, protective_ranks: [f64; 4]) -> Option<Downweight> {
    if commit_count < LOW_SAMPLE_COMMITS {
        return Some(Downweight::LowSample);
    }
    if protective_ranks
        .iter()
        .any(|r| *r >= PROTECTIVE_RANK_MIN)
    {
        return Some(Downweight::HighPerformer);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(id: &str, commits: u64) -> EntityFeatureVector {
        EntityFeatureVector {
            entity_id: id.into(),
            window_label: "w1".into(),
            role: Some("backend-development".into()),
            commit_count: commits,
            repo_count: 2,
            changed_lines_total: commits * 80,
            weighted_changed_lines_total: commits as f64 * 88.0,
            changed_lines_per_commit: 80.0,
            zero_change_ratio: 0.0,
            tiny_change_ratio: 0.05,
            small_change_ratio: 0.2,
            balanced_edit_ratio: 0.0,
            after_hours_ratio: 0.1,
            max_commits_per_10min: 1,
            max_commits_per_hour: 2,
            median_inter_commit_seconds: Some(7200.0),
            top1_repo_id: Some("r1".into()),
            top1_repo_share: 0.6,
            top1_repo_is_core: false,
            message_total: commits,
            message_unique_ratio: Some(0.9),
            top1_message_share: 0.1,
            short_message_ratio: 0.05,
            generic_message_ratio: 0.05,
        }
    }

    /// A textbook grinder: tiny bursty commits, one private repo,
    /// copy-paste messages.
    fn grinder(id: &str, commits: u64) -> EntityFeatureVector {
        let mut v = vector(id, commits);
        v.changed_lines_total = commits;
        v.weighted_changed_lines_total = commits as f64;
        v.changed_lines_per_commit = 1.0;
        v.zero_change_ratio = 0.4;
        v.tiny_change_ratio = 0.9;
        v.small_change_ratio = 1.0;
        v.max_commits_per_10min = 12;
        v.max_commits_per_hour = 30;
        v.median_inter_commit_seconds = Some(45.0);
        v.top1_repo_share = 1.0;
        v.repo_count = 1;
        v.message_unique_ratio = Some(0.05);
        v.top1_message_share = 0.8;
        v.short_message_ratio = 0.9;
        v.generic_message_ratio = 0.9;
        v
    }

    fn population_with_grinder(grinder_commits: u64) -> Vec<EntityFeatureVector> {
        let mut population: Vec<_> = (0..9).map(|i| vector(&format!("e{i}"), 30 + i)).collect();
        population.push(grinder("sus", grinder_commits));
        population
    }

    #[test]
    fn downweighted_total_never_exceeds_raw() {
        let population = population_with_grinder(40);
        let out = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        for r in &out {
            assert!(r.score_total <= r.score_total_raw + 1e-9, "{r:?}");
            assert!((0.0..=100.0).contains(&r.score_total));
            assert!((0.0..=100.0).contains(&r.score_total_raw));
        }
    }

    #[test]
    fn grinder_ranks_most_suspicious() {
        let population = population_with_grinder(40);
        let out = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        assert_eq!(out[0].entity_id, "sus");
        assert!(out[0].has_tag(FraudTag::TinyCommitRatioHigh));
        assert!(out[0].has_tag(FraudTag::BurstCommits));
        assert!(out[0].has_tag(FraudTag::SingleRepoGrind));
        assert!(out[0].has_tag(FraudTag::TemplateMessages));
    }

    #[test]
    fn low_sample_halves_the_composite_and_tags() {
        let population = population_with_grinder(5);
        let out = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        let sus = out.iter().find(|r| r.entity_id == "sus").unwrap();
        assert!((sus.score_total - sus.score_total_raw * 0.5).abs() < 1e-9);
        assert!(sus.has_tag(FraudTag::LowSampleSize));
        assert!(!sus.has_tag(FraudTag::ProtectedHighOutput));
        // Five commits in a two-month window is also under-saturated.
        assert!(sus.under_saturated);
        assert!(sus.has_tag(FraudTag::UnderSaturated));
    }

    #[test]
    fn high_performer_gets_the_protective_discount() {
        let mut population = population_with_grinder(40);
        // Make one entity the clear output leader with suspicious texture
        // that would otherwise score high.
        let mut leader = grinder("leader", 60);
        leader.changed_lines_total = 100_000;
        leader.weighted_changed_lines_total = 110_000.0;
        population.push(leader);

        let out = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        let leader = out.iter().find(|r| r.entity_id == "leader").unwrap();
        assert!((leader.score_total - leader.score_total_raw * 0.6).abs() < 1e-9);
        assert!(leader.has_tag(FraudTag::ProtectedHighOutput));
        assert!(!leader.has_tag(FraudTag::LowSampleSize));
    }

    #[test]
    fn rules_never_stack() {
        // Thin sample AND top output: only the low-sample rule fires.
        assert_eq!(
            protective_downweight(5, [1.0, 1.0, 1.0, 1.0]),
            Some(Downweight::LowSample)
        );
        assert_eq!(
            protective_downweight(25, [1.0, 0.0, 0.0, 0.0]),
            Some(Downweight::HighPerformer)
        );
        assert_eq!(protective_downweight(25, [0.5, 0.5, 0.5, 0.5]), None);
    }

    #[test]
    fn core_repo_discount_scales_the_concentration_sub_score() {
        let mut population = population_with_grinder(40);
        for v in &mut population {
            if v.entity_id == "sus" {
                v.top1_repo_is_core = true;
            }
        }
        let out = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        let sus = out.iter().find(|r| r.entity_id == "sus").unwrap();
        // Top concentration percentile is 100; discounted to 60.
        assert!((sus.component_scores["score_single_repo"] - 60.0).abs() < 1e-9);
        assert!(!sus.has_tag(FraudTag::SingleRepoGrind));
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let population = population_with_grinder(40);
        let a = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        let b = compute_fraud_scores(
            &population,
            2,
            &FraudWeights::default(),
            &RoleWeightsConfig::default_seed(),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn preconditions_fail_fast() {
        let population = vec![vector("a", 30), vector("a", 40)];
        assert_eq!(
            compute_fraud_scores(
                &population,
                2,
                &FraudWeights::default(),
                &RoleWeightsConfig::default_seed(),
            ),
            Err(ScoreError::DuplicateEntity("a".into()))
        );
    }
}
