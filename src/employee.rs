// src/employee.rs
//! # Employee Score Engine
//! Pure, testable logic that maps one window's population of entity
//! feature vectors to bounded productivity scores. No I/O.
//!
//! Policy: the role-weighted changed-line percentile is the primary
//! signal; a participation gate in `[0.5, 1.0]` discounts entities whose
//! commit frequency is below the window's floor (a single outsized
//! commit cannot buy a top rank), and a capped repo-diversity bonus
//! rewards multi-repo stewardship without letting breadth substitute
//! for output volume.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{check_unique_entities, check_window_months, ScoreError};
use crate::features::EntityFeatureVector;
use crate::percentile::normalize;
use crate::score::ScoreRecord;

/// Commits per month below which participation is under-saturated.
pub const MIN_COMMITS_PER_MONTH: u64 = 6;
/// Commit count at which the saturated gate reaches its 1.0 ceiling.
const GATE_FULL_COMMITS: f64 = 20.0;
/// Diversity bonus: `0.05 × min(score_repo_diversity, 70)`, max 3.5.
const DIVERSITY_BONUS_WEIGHT: f64 = 0.05;
const DIVERSITY_BONUS_CAP: f64 = 70.0;

/// Participation gate for individual commit counts.
///
/// Below the floor the gate climbs linearly through `[0.5, 0.8)`; from
/// the floor on it climbs `[0.8, 1.0]`, saturating at 20 commits.
pub fn participation_gate(commit_count: u64, min_commits: u64) -> f64 {
    let cc = commit_count as f64;
    let floor = min_commits as f64;
    if cc < floor {
        0.5 + 0.3 * (cc / floor)
    } else {
        0.8 + 0.2 * (cc / GATE_FULL_COMMITS).min(1.0)
    }
}

/// Score every entity in the population against the window's peers.
///
/// Percentiles are computed over the materialized population passed in;
/// each window defines its own basis and nothing is carried across
/// invocations. Returns records sorted best-first.
pub fn compute_employee_scores(
    population: &[EntityFeatureVector],
    window_months: i64,
) -> Result<Vec<ScoreRecord>, ScoreError> {
    check_window_months(window_months)?;
    check_unique_entities(population.iter().map(|v| v.entity_id.as_str()))?;
    if population.len() < 5 {
        warn!(
            population = population.len(),
            "small population; percentile ranks will be coarse"
        );
    }

    let min_commits = MIN_COMMITS_PER_MONTH * window_months as u64;
    debug!(
        population = population.len(),
        window_months, min_commits, "scoring employee population"
    );

    let metric = |f: fn(&EntityFeatureVector) -> f64, reverse: bool| {
        let values: Vec<(&str, f64)> = population
            .iter()
            .map(|v| (v.entity_id.as_str(), f(v)))
            .collect();
        normalize(&values, reverse)
    };

    let score_lines_total = metric(|v| v.weighted_changed_lines_total, false);
    let score_repo_diversity = metric(|v| v.repo_count as f64, false);
    // Audit-only components; none of these feed the total.
    let score_active = metric(|v| v.commit_count as f64, false);
    let score_lines_per_commit = metric(|v| v.changed_lines_per_commit, false);
    let score_concentration = metric(|v| v.top1_repo_share, true);
    let score_message_quality = metric(|v| v.message_unique_ratio.unwrap_or(1.0), false);
    let score_after_hours = metric(|v| v.after_hours_ratio, false);

    let mut records: Vec<ScoreRecord> = population
        .iter()
        .map(|v| {
            let id = v.entity_id.as_str();
            let lines = score_lines_total[id];
            let diversity = score_repo_diversity[id];
            let gate = participation_gate(v.commit_count, min_commits);
            let bonus = DIVERSITY_BONUS_WEIGHT * diversity.min(DIVERSITY_BONUS_CAP);
            let score_total = (lines * gate + bonus).min(100.0);

            let mut components = BTreeMap::new();
            components.insert("score_lines_total".to_string(), lines);
            components.insert("score_repo_diversity".to_string(), diversity);
            components.insert("score_active".to_string(), score_active[id]);
            components.insert(
                "score_lines_per_commit".to_string(),
                score_lines_per_commit[id],
            );
            components.insert("score_concentration".to_string(), score_concentration[id]);
            components.insert(
                "score_message_quality".to_string(),
                score_message_quality[id],
            );
            components.insert("score_after_hours".to_string(), score_after_hours[id]);

            ScoreRecord {
                entity_id: v.entity_id.clone(),
                window_label: v.window_label.clone(),
                score_total,
                component_scores: components,
            }
        })
        .collect();

    sort_best_first(&mut records, population);
    Ok(records)
}

fn sort_best_first(records: &mut [ScoreRecord], population: &[EntityFeatureVector]) {
    let volume: BTreeMap<&str, (u64, u64)> = population
        .iter()
        .map(|v| (v.entity_id.as_str(), (v.changed_lines_total, v.commit_count)))
        .collect();
    records.sort_by(|a, b| {
        b.score_total
            .total_cmp(&a.score_total)
            .then_with(|| {
                let va = volume[a.entity_id.as_str()];
                let vb = volume[b.entity_id.as_str()];
                vb.cmp(&va)
            })
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
}
