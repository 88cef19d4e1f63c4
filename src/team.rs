// src/team.rs
//! # Team Score Engine
//! The team-granularity analog of the employee engine: managers are
//! ranked against each other on role-weighted changed lines, gated on
//! commits-per-developer density rather than raw commit count (a large
//! team cannot coast on one prolific member), with a smaller capped
//! repo-diversity bonus.
//!
//! Alongside the score, threshold-derived risk tags call out thin
//! participation, single-core dependence, and — when the anti-fraud
//! records are supplied — a concentration of suspicious developers.
//! The suspicion rollup is reported only; it never moves the total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{check_unique_entities, check_window_months, ScoreError};
use crate::features::TeamFeatureVector;
use crate::percentile::{normalize, quantile};
use crate::score::{FraudRecord, TeamScoreRecord};

/// Commits per developer per month below which density is under-saturated.
pub const MIN_COMMITS_PER_DEV_PER_MONTH: f64 = 6.0;
/// Density at which the saturated gate reaches its 1.0 ceiling.
const GATE_FULL_DENSITY: f64 = 10.0;
/// Diversity bonus: `0.03 × min(score_repo_diversity, 70)`, max 2.1.
const DIVERSITY_BONUS_WEIGHT: f64 = 0.03;
const DIVERSITY_BONUS_CAP: f64 = 70.0;

/// Individual anti-fraud total at or above this counts a dev as suspicious.
pub const SUSPICIOUS_DEV_SCORE_MIN: f64 = 70.0;
/// Teams need at least this many suspicious devs for the gaming-risk tag.
const GAMING_RISK_MIN_DEVS: u64 = 2;
/// ...and at least this share of headcount.
const GAMING_RISK_MIN_SHARE: f64 = 0.30;

/// Threshold-derived team risk tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamTag {
    /// Active-dev share below the P25 of all teams.
    LowActiveShare,
    /// Median commit count of active devs below the P25 of all teams.
    LowMedianIntensity,
    /// Top contributor's commit share above the P75 of all teams.
    SingleCoreDependence,
    /// Enough suspicious developers to question the team's volume.
    GamingRisk,
}

/// Density gate for commits-per-developer.
pub fn density_gate(commits_per_dev: f64, min_density: f64) -> f64 {
    if commits_per_dev < min_density {
        0.5 + 0.3 * (commits_per_dev / min_density)
    } else {
        0.8 + 0.2 * (commits_per_dev / GATE_FULL_DENSITY).min(1.0)
    }
}

/// Score every team in the population against the window's peers.
///
/// `fraud_records` are the individual anti-fraud results for the same
/// window; pass `None` to skip the gaming-risk rollup (scores are
/// identical either way).
pub fn compute_team_scores(
    population: &[TeamFeatureVector],
    window_months: i64,
    fraud_records: Option<&[FraudRecord]>,
) -> Result<Vec<TeamScoreRecord>, ScoreError> {
    check_window_months(window_months)?;
    check_unique_entities(population.iter().map(|t| t.manager.as_str()))?;
    if population.len() < 5 {
        warn!(
            population = population.len(),
            "small team population; percentile ranks will be coarse"
        );
    }

    let min_density = MIN_COMMITS_PER_DEV_PER_MONTH * window_months as f64;
    debug!(
        population = population.len(),
        window_months, min_density, "scoring team population"
    );

    let metric = |f: fn(&TeamFeatureVector) -> f64, reverse: bool| {
        let values: Vec<(&str, f64)> = population
            .iter()
            .map(|t| (t.manager.as_str(), f(t)))
            .collect();
        normalize(&values, reverse)
    };

    let score_lines_total = metric(|t| t.weighted_changed_lines_total, false);
    let score_repo_diversity = metric(|t| t.repo_count as f64, false);
    // Audit-only components.
    let score_active = metric(|t| active_share(t), false);
    let score_commits_per_dev = metric(|t| t.commits_per_dev, false);
    let score_concentration = metric(|t| t.top1_commit_share, true);
    let score_after_hours = metric(|t| t.after_hours_commit_share, false);

    let thresholds = TeamTagThresholds::from_population(population);
    let suspicion = fraud_records.map(SuspicionScores::index);

    let mut records: Vec<TeamScoreRecord> = population
        .iter()
        .map(|t| {
            let id = t.manager.as_str();
            let lines = score_lines_total[id];
            let diversity = score_repo_diversity[id];
            let gate = density_gate(t.commits_per_dev, min_density);
            let bonus = DIVERSITY_BONUS_WEIGHT * diversity.min(DIVERSITY_BONUS_CAP);
            let score_total = (lines * gate + bonus).min(100.0);

            let mut components = BTreeMap::new();
            components.insert("score_lines_total".to_string(), lines);
            components.insert("score_repo_diversity".to_string(), diversity);
            components.insert("score_active".to_string(), score_active[id]);
            components.insert(
                "score_commits_per_dev".to_string(),
                score_commits_per_dev[id],
            );
            components.insert("score_concentration".to_string(), score_concentration[id]);
            components.insert("score_after_hours".to_string(), score_after_hours[id]);

            let (suspicious_dev_count, suspicious_dev_share) = suspicion
                .as_ref()
                .map(|s| s.rollup(t))
                .unwrap_or((0, 0.0));

            let tags = derive_team_tags(
                t,
                &thresholds,
                suspicion.is_some(),
                suspicious_dev_count,
                suspicious_dev_share,
            );

            TeamScoreRecord {
                entity_id: t.manager.clone(),
                window_label: t.window_label.clone(),
                score_total,
                component_scores: components,
                tags,
                suspicious_dev_count,
                suspicious_dev_share,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.score_total
            .total_cmp(&a.score_total)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    Ok(records)
}

fn active_share(t: &TeamFeatureVector) -> f64 {
    if t.dev_headcount == 0 {
        0.0
    } else {
        t.active_dev_count as f64 / t.dev_headcount as f64
    }
}

/// Quantile cutoffs for the team tag layer, derived from the live
/// population (linear interpolation between order statistics).
#[derive(Debug, Clone, Copy)]
struct TeamTagThresholds {
    active_share_p25: f64,
    commits_active_p50_p25: f64,
    top1_share_p75: f64,
}

impl TeamTagThresholds {
    fn from_population(population: &[TeamFeatureVector]) -> Self {
        let actives: Vec<f64> = population.iter().map(active_share).collect();
        let medians: Vec<f64> = population
            .iter()
            .filter_map(|t| t.commits_active_p50)
            .collect();
        let top1: Vec<f64> = population.iter().map(|t| t.top1_commit_share).collect();
        Self {
            active_share_p25: quantile(&actives, 0.25),
            commits_active_p50_p25: quantile(&medians, 0.25),
            top1_share_p75: quantile(&top1, 0.75),
        }
    }
}

fn derive_team_tags(
    t: &TeamFeatureVector,
    thresholds: &TeamTagThresholds,
    suspicion_known: bool,
    suspicious_dev_count: u64,
    suspicious_dev_share: f64,
) -> Vec<TeamTag> {
    let mut tags = Vec::new();
    if active_share(t) < thresholds.active_share_p25 {
        tags.push(TeamTag::LowActiveShare);
    }
    if let Some(p50) = t.commits_active_p50 {
        if p50 < thresholds.commits_active_p50_p25 {
            tags.push(TeamTag::LowMedianIntensity);
        }
    }
    if t.top1_commit_share > thresholds.top1_share_p75 {
        tags.push(TeamTag::SingleCoreDependence);
    }
    if suspicion_known
        && suspicious_dev_count >= GAMING_RISK_MIN_DEVS
        && suspicious_dev_share >= GAMING_RISK_MIN_SHARE
    {
        tags.push(TeamTag::GamingRisk);
    }
    tags
}

/// Per-entity anti-fraud totals indexed for the team rollup.
struct SuspicionScores<'a> {
    by_entity: BTreeMap<&'a str, f64>,
}

impl<'a> SuspicionScores<'a> {
    fn index(records: &'a [FraudRecord]) -> Self {
        Self {
            by_entity: records
                .iter()
                .map(|r| (r.entity_id.as_str(), r.score_total))
                .collect(),
        }
    }

    fn rollup(&self, t: &TeamFeatureVector) -> (u64, f64) {
        let count = t
            .member_ids
            .iter()
            .filter(|id| {
                self.by_entity
                    .get(id.as_str())
                    .is_some_and(|s| *s >= SUSPICIOUS_DEV_SCORE_MIN)
            })
            .count() as u64;
        let share = if t.dev_headcount == 0 {
            0.0
        } else {
            count as f64 / t.dev_headcount as f64
        };
        (count, share)
    }
}
