// src/features.rs
//! Feature aggregation: reduces one window's commit facts to per-entity
//! and per-team feature vectors. Pure function of the fact set — no
//! external state, no cross-window memory.
//!
//! Merge commits are excluded here, before anything is counted. Only
//! entities with at least one non-merge commit appear in the entity
//! population ("active" entities); team vectors keep inactive developers
//! in the headcount since density gating depends on them.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::facts::{normalize_message, CommitFact, RosterEntry};
use crate::percentile::quantile;
use crate::role_weights::RoleWeightsConfig;

/// Business hours are evaluated at this fixed UTC offset.
pub const BUSINESS_UTC_OFFSET_HOURS: i32 = 8;

/// `changed_lines <= 2` counts as a tiny commit.
pub const TINY_CHANGED_LINES: u64 = 2;
/// `changed_lines <= 10` counts as a small commit.
pub const SMALL_CHANGED_LINES: u64 = 10;
/// Balanced-edit detection needs at least this much churn to matter.
pub const BALANCED_MIN_CHANGED_LINES: u64 = 50;
/// additions ≈ deletions when balance = 1 - |a-d|/(a+d) reaches this.
pub const BALANCED_EDIT_MIN: f64 = 0.9;
/// Normalized messages at or under this many chars count as short.
pub const SHORT_MESSAGE_MAX_CHARS: usize = 8;
/// A repo at or above this quantile of contributors or commits is core.
pub const CORE_REPO_QUANTILE: f64 = 0.75;

/// Throwaway message prefixes ("fix", "fix: ...", "wip", ...).
static GENERIC_MESSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(fix|update|test|wip|tmp|merge|refactor)(:|$)").unwrap());

/// Per-entity activity features for one window.
///
/// Created fresh per analysis invocation and immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFeatureVector {
    pub entity_id: String,
    pub window_label: String,
    pub role: Option<String>,

    pub commit_count: u64,
    pub repo_count: u64,
    pub changed_lines_total: u64,
    pub weighted_changed_lines_total: f64,
    pub changed_lines_per_commit: f64,

    // Anti-fraud inputs.
    pub zero_change_ratio: f64,
    pub tiny_change_ratio: f64,
    pub small_change_ratio: f64,
    pub balanced_edit_ratio: f64,
    pub after_hours_ratio: f64,
    pub max_commits_per_10min: u64,
    pub max_commits_per_hour: u64,
    /// None when the entity has fewer than two commits.
    pub median_inter_commit_seconds: Option<f64>,

    pub top1_repo_id: Option<String>,
    pub top1_repo_share: f64,
    pub top1_repo_is_core: bool,

    pub message_total: u64,
    /// None when the entity has no non-empty messages.
    pub message_unique_ratio: Option<f64>,
    pub top1_message_share: f64,
    pub short_message_ratio: f64,
    pub generic_message_ratio: f64,
}

/// Per-team (line manager) activity features for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFeatureVector {
    /// The line manager identifying the team.
    pub manager: String,
    pub window_label: String,

    /// Developer-role reports, active or not.
    pub dev_headcount: u64,
    pub active_dev_count: u64,
    pub commit_count: u64,
    pub commits_per_dev: f64,
    /// Median commit count over active developers; None with no activity.
    pub commits_active_p50: Option<f64>,

    pub repo_count: u64,
    pub changed_lines_total: u64,
    pub weighted_changed_lines_total: f64,
    pub department_level2_distinct_count: u64,
    pub after_hours_commit_share: f64,
    /// Largest single contributor's share of team commits.
    pub top1_commit_share: f64,

    /// Sorted member ids, for joining per-developer risk signals.
    pub member_ids: Vec<String>,
}

/// Window-wide stats for one repository, backing core-repo detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RepoWindowStats {
    commit_total: u64,
    contributor_count: u64,
}

/// Whether a commit landed outside Mon–Fri 09:00–18:59 business hours
/// at the fixed business offset.
fn is_after_hours(ts: DateTime<Utc>) -> bool {
    let offset = FixedOffset::east_opt(BUSINESS_UTC_OFFSET_HOURS * 3600)
        .expect("business offset is a valid fixed offset");
    let local = ts.with_timezone(&offset);
    let weekday = local.weekday().number_from_monday();
    let workday = (1..=5).contains(&weekday);
    let core_hours = (9..=18).contains(&local.hour());
    !(workday && core_hours)
}

/// additions ≈ deletions test for one commit.
fn is_balanced_edit(additions: u64, deletions: u64, changed_lines: u64) -> bool {
    if changed_lines < BALANCED_MIN_CHANGED_LINES {
        return false;
    }
    let total = additions + deletions;
    if total == 0 {
        return false;
    }
    let balance = 1.0 - (additions.abs_diff(deletions) as f64 / total as f64);
    balance >= BALANCED_EDIT_MIN
}

/// Reduce commit facts to per-entity feature vectors, sorted by entity.
///
/// Only entities present in the fact set appear; an entity with merge
/// commits alone is not "active" and is dropped with the merges.
pub fn aggregate_entities(
    facts: &[CommitFact],
    roster: &[RosterEntry],
    role_weights: &RoleWeightsConfig,
) -> Vec<EntityFeatureVector> {
    let roles: HashMap<&str, Option<&str>> = roster
        .iter()
        .map(|r| (r.entity_id.as_str(), r.role.as_deref()))
        .collect();

    let non_merge: Vec<&CommitFact> = facts.iter().filter(|f| !f.is_merge).collect();

    // Window-wide repo stats feed the core-repo exemption thresholds.
    let repo_stats = repo_window_stats(&non_merge);
    let people_p75 = quantile(
        &repo_stats
            .values()
            .map(|s| s.contributor_count as f64)
            .collect::<Vec<_>>(),
        CORE_REPO_QUANTILE,
    );
    let commits_p75 = quantile(
        &repo_stats
            .values()
            .map(|s| s.commit_total as f64)
            .collect::<Vec<_>>(),
        CORE_REPO_QUANTILE,
    );
    debug!(
        repos = repo_stats.len(),
        people_p75, commits_p75, "core-repo thresholds derived"
    );

    let mut by_entity: BTreeMap<&str, Vec<&CommitFact>> = BTreeMap::new();
    for f in &non_merge {
        by_entity.entry(f.entity_id.as_str()).or_default().push(f);
    }

    by_entity
        .into_iter()
        .map(|(entity_id, commits)| {
            let role = roles.get(entity_id).copied().flatten();
            entity_vector(
                entity_id,
                role,
                &commits,
                &repo_stats,
                people_p75,
                commits_p75,
                role_weights,
            )
        })
        .collect()
}

fn repo_window_stats<'a>(non_merge: &[&'a CommitFact]) -> HashMap<&'a str, RepoWindowStats> {
    let mut commits: HashMap<&str, u64> = HashMap::new();
    let mut contributors: HashMap<&str, HashSet<&str>> = HashMap::new();
    for f in non_merge {
        *commits.entry(f.repo_id.as_str()).or_default() += 1;
        contributors
            .entry(f.repo_id.as_str())
            .or_default()
            .insert(f.entity_id.as_str());
    }
    commits
        .into_iter()
        .map(|(repo, commit_total)| {
            let contributor_count = contributors
                .get(repo)
                .map(|s| s.len() as u64)
                .unwrap_or_default();
            (
                repo,
                RepoWindowStats {
                    commit_total,
                    contributor_count,
                },
            )
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn entity_vector(
    entity_id: &str,
    role: Option<&str>,
    commits: &[&CommitFact],
    repo_stats: &HashMap<&str, RepoWindowStats>,
    people_p75: f64,
    commits_p75: f64,
    role_weights: &RoleWeightsConfig,
) -> EntityFeatureVector {
    let n = commits.len() as u64;
    let nf = n as f64;

    let changed_lines_total: u64 = commits.iter().map(|c| c.changed_lines).sum();
    let weight = role_weights.weight_for(role);
    let weighted_changed_lines_total = changed_lines_total as f64 * weight;
    let changed_lines_per_commit = changed_lines_total as f64 / nf;

    let zero = commits.iter().filter(|c| c.changed_lines == 0).count();
    let tiny = commits
        .iter()
        .filter(|c| c.changed_lines <= TINY_CHANGED_LINES)
        .count();
    let small = commits
        .iter()
        .filter(|c| c.changed_lines <= SMALL_CHANGED_LINES)
        .count();
    let balanced = commits
        .iter()
        .filter(|c| is_balanced_edit(c.additions, c.deletions, c.changed_lines))
        .count();
    let after_hours = commits
        .iter()
        .filter(|c| is_after_hours(c.committed_at))
        .count();

    // Repo concentration.
    let mut per_repo: BTreeMap<&str, u64> = BTreeMap::new();
    for c in commits {
        *per_repo.entry(c.repo_id.as_str()).or_default() += 1;
    }
    let repo_count = per_repo.len() as u64;
    let (top1_repo_id, top1_commits) = per_repo
        .iter()
        .max_by_key(|(repo, cnt)| (**cnt, std::cmp::Reverse(*repo)))
        .map(|(repo, cnt)| (Some(repo.to_string()), *cnt))
        .unwrap_or((None, 0));
    let top1_repo_share = top1_commits as f64 / nf;
    let top1_repo_is_core = top1_repo_id
        .as_deref()
        .and_then(|r| repo_stats.get(r))
        .map(|s| s.contributor_count as f64 >= people_p75 || s.commit_total as f64 >= commits_p75)
        .unwrap_or(false);

    // Burst buckets (fixed 10-minute / 1-hour grid, not sliding).
    let max_commits_per_10min = max_bucket_count(commits, 600);
    let max_commits_per_hour = max_bucket_count(commits, 3600);

    // Inter-commit cadence; identical timestamps are skipped.
    let mut stamps: Vec<i64> = commits.iter().map(|c| c.committed_at.timestamp()).collect();
    stamps.sort_unstable();
    let deltas: Vec<f64> = stamps
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .filter(|d| *d > 0.0)
        .collect();
    let median_inter_commit_seconds = if deltas.is_empty() {
        None
    } else {
        Some(quantile(&deltas, 0.5))
    };

    // Message texture.
    let mut msg_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut short_msgs = 0u64;
    let mut generic_msgs = 0u64;
    for c in commits {
        let norm = normalize_message(&c.message);
        if norm.is_empty() {
            continue;
        }
        if norm.chars().count() <= SHORT_MESSAGE_MAX_CHARS {
            short_msgs += 1;
        }
        if GENERIC_MESSAGE_RE.is_match(&norm) {
            generic_msgs += 1;
        }
        *msg_counts.entry(norm).or_default() += 1;
    }
    let message_total: u64 = msg_counts.values().sum();
    let (message_unique_ratio, top1_message_share, short_message_ratio, generic_message_ratio) =
        if message_total == 0 {
            (None, 0.0, 0.0, 0.0)
        } else {
            let mt = message_total as f64;
            let top1 = msg_counts.values().max().copied().unwrap_or(0);
            (
                Some(msg_counts.len() as f64 / mt),
                top1 as f64 / mt,
                short_msgs as f64 / mt,
                generic_msgs as f64 / mt,
            )
        };

    EntityFeatureVector {
        entity_id: entity_id.to_string(),
        window_label: commits
            .first()
            .map(|c| c.window_label.clone())
            .unwrap_or_default(),
        role: role.map(str::to_string),
        commit_count: n,
        repo_count,
        changed_lines_total,
        weighted_changed_lines_total,
        changed_lines_per_commit,
        zero_change_ratio: zero as f64 / nf,
        tiny_change_ratio: tiny as f64 / nf,
        small_change_ratio: small as f64 / nf,
        balanced_edit_ratio: balanced as f64 / nf,
        after_hours_ratio: after_hours as f64 / nf,
        max_commits_per_10min,
        max_commits_per_hour,
        median_inter_commit_seconds,
        top1_repo_id,
        top1_repo_share,
        top1_repo_is_core,
        message_total,
        message_unique_ratio,
        top1_message_share,
        short_message_ratio,
        generic_message_ratio,
    }
}

fn max_bucket_count(commits: &[&CommitFact], bucket_secs: i64) -> u64 {
    let mut buckets: HashMap<i64, u64> = HashMap::new();
    for c in commits {
        let b = c.committed_at.timestamp().div_euclid(bucket_secs);
        *buckets.entry(b).or_default() += 1;
    }
    buckets.values().max().copied().unwrap_or(0)
}

/// Roll developer-role roster rows and their commits up to line-manager
/// teams, sorted by manager. Teams with zero window activity remain in
/// the population (their density gate handles the rest).
pub fn aggregate_teams(
    facts: &[CommitFact],
    roster: &[RosterEntry],
    role_weights: &RoleWeightsConfig,
) -> Vec<TeamFeatureVector> {
    let window_label = facts
        .first()
        .map(|f| f.window_label.clone())
        .unwrap_or_default();

    // Dev reports per manager, de-duplicated per entity (first row wins).
    let mut teams: BTreeMap<&str, BTreeMap<&str, &RosterEntry>> = BTreeMap::new();
    for entry in roster {
        if role_weights.is_development_role(entry.role.as_deref()) {
            teams
                .entry(entry.manager_key())
                .or_default()
                .entry(entry.entity_id.as_str())
                .or_insert(entry);
        }
    }

    let mut commits_by_entity: HashMap<&str, Vec<&CommitFact>> = HashMap::new();
    for f in facts.iter().filter(|f| !f.is_merge) {
        commits_by_entity
            .entry(f.entity_id.as_str())
            .or_default()
            .push(f);
    }

    teams
        .into_iter()
        .map(|(manager, members)| {
            let dev_headcount = members.len() as u64;
            let mut commit_count = 0u64;
            let mut after_hours_total = 0u64;
            let mut changed_lines_total = 0u64;
            let mut weighted_changed_lines_total = 0.0f64;
            let mut per_member_commits: Vec<u64> = Vec::new();
            let mut repos: BTreeSet<&str> = BTreeSet::new();
            let mut departments: BTreeSet<&str> = BTreeSet::new();

            for (entity_id, entry) in &members {
                if let Some(dept) = entry.department_level2.as_deref() {
                    if !dept.trim().is_empty() {
                        departments.insert(dept);
                    }
                }
                let weight = role_weights.weight_for(entry.role.as_deref());
                let commits = commits_by_entity
                    .get(*entity_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let member_count = commits.len() as u64;
                per_member_commits.push(member_count);
                commit_count += member_count;
                // Weight applied once per member so the float sum does
                // not depend on commit input order.
                let mut member_lines = 0u64;
                for c in commits {
                    repos.insert(c.repo_id.as_str());
                    member_lines += c.changed_lines;
                    if is_after_hours(c.committed_at) {
                        after_hours_total += 1;
                    }
                }
                changed_lines_total += member_lines;
                weighted_changed_lines_total += member_lines as f64 * weight;
            }

            let active: Vec<f64> = per_member_commits
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| c as f64)
                .collect();
            let commits_active_p50 = if active.is_empty() {
                None
            } else {
                Some(quantile(&active, 0.5))
            };
            let top1 = per_member_commits.iter().max().copied().unwrap_or(0);

            TeamFeatureVector {
                manager: manager.to_string(),
                window_label: window_label.clone(),
                dev_headcount,
                active_dev_count: active.len() as u64,
                commit_count,
                commits_per_dev: if dev_headcount == 0 {
                    0.0
                } else {
                    commit_count as f64 / dev_headcount as f64
                },
                commits_active_p50,
                repo_count: repos.len() as u64,
                changed_lines_total,
                weighted_changed_lines_total,
                department_level2_distinct_count: departments.len() as u64,
                after_hours_commit_share: if commit_count == 0 {
                    0.0
                } else {
                    after_hours_total as f64 / commit_count as f64
                },
                top1_commit_share: if commit_count == 0 {
                    0.0
                } else {
                    top1 as f64 / commit_count as f64
                },
                member_ids: members.keys().map(|id| id.to_string()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fact(entity: &str, repo: &str, secs: i64, changed: u64, message: &str) -> CommitFact {
        CommitFact {
            entity_id: entity.into(),
            repo_id: repo.into(),
            window_label: "w1".into(),
            committed_at: ts(secs),
            additions: changed,
            deletions: 0,
            changed_lines: changed,
            message: message.into(),
            is_merge: false,
        }
    }

    fn roster(entity: &str, role: &str) -> RosterEntry {
        RosterEntry {
            entity_id: entity.into(),
            role: Some(role.into()),
            line_manager: Some("M".into()),
            department_level2: None,
        }
    }

    #[test]
    fn merge_commits_never_count() {
        let mut merge = fact("a", "r1", 1_700_000_000, 500, "merge branch");
        merge.is_merge = true;
        let facts = vec![merge, fact("a", "r1", 1_700_000_600, 10, "fix: thing")];
        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].commit_count, 1);
        assert_eq!(out[0].changed_lines_total, 10);
    }

    #[test]
    fn entity_with_only_merges_is_not_active() {
        let mut merge = fact("a", "r1", 1_700_000_000, 500, "merge branch");
        merge.is_merge = true;
        let out = aggregate_entities(&[merge], &[], &RoleWeightsConfig::default_seed());
        assert!(out.is_empty());
    }

    #[test]
    fn size_ratios_are_counted_from_changed_lines() {
        let facts = vec![
            fact("a", "r1", 1_000, 0, "m1"),
            fact("a", "r1", 2_000, 2, "m2"),
            fact("a", "r1", 3_000, 10, "m3"),
            fact("a", "r1", 4_000, 300, "m4"),
        ];
        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        let v = &out[0];
        assert!((v.zero_change_ratio - 0.25).abs() < 1e-9);
        assert!((v.tiny_change_ratio - 0.5).abs() < 1e-9); // 0 and 2 lines
        assert!((v.small_change_ratio - 0.75).abs() < 1e-9);
        assert!((v.changed_lines_per_commit - 78.0).abs() < 1e-9);
    }

    #[test]
    fn balanced_edit_needs_scale_and_symmetry() {
        assert!(is_balanced_edit(50, 50, 100));
        assert!(is_balanced_edit(52, 48, 100));
        // Too asymmetric.
        assert!(!is_balanced_edit(90, 10, 100));
        // Too small to matter.
        assert!(!is_balanced_edit(20, 20, 40));
        assert!(!is_balanced_edit(0, 0, 60));
    }

    #[test]
    fn burst_buckets_use_a_fixed_grid() {
        // Three commits inside one 10-minute bucket, one in the next.
        let facts = vec![
            fact("a", "r1", 0, 1, "m1"),
            fact("a", "r1", 100, 1, "m2"),
            fact("a", "r1", 599, 1, "m3"),
            fact("a", "r1", 600, 1, "m4"),
        ];
        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        assert_eq!(out[0].max_commits_per_10min, 3);
        assert_eq!(out[0].max_commits_per_hour, 4);
    }

    #[test]
    fn median_interval_skips_identical_timestamps() {
        let facts = vec![
            fact("a", "r1", 1_000, 1, "m1"),
            fact("a", "r1", 1_000, 1, "m2"),
            fact("a", "r1", 1_060, 1, "m3"),
            fact("a", "r1", 1_180, 1, "m4"),
        ];
        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        assert_eq!(out[0].median_inter_commit_seconds, Some(90.0));

        let single = vec![fact("b", "r1", 1_000, 1, "m")];
        let out = aggregate_entities(&single, &[], &RoleWeightsConfig::default_seed());
        assert_eq!(out[0].median_inter_commit_seconds, None);
    }

    #[test]
    fn role_weight_scales_the_weighted_total_only() {
        let facts = vec![fact("a", "r1", 1_000, 100, "m")];
        let out = aggregate_entities(
            &facts,
            &[roster("a", "data-development")],
            &RoleWeightsConfig::default_seed(),
        );
        assert_eq!(out[0].changed_lines_total, 100);
        assert!((out[0].weighted_changed_lines_total - 180.0).abs() < 1e-9);
    }

    #[test]
    fn top1_repo_and_core_classification() {
        // r1 is the shared high-traffic repo: 3 contributors, most commits.
        let mut facts = vec![
            fact("a", "r1", 1_000, 5, "m"),
            fact("b", "r1", 2_000, 5, "m"),
            fact("c", "r1", 3_000, 5, "m"),
            fact("c", "r1", 4_000, 5, "m"),
        ];
        // d grinds a private repo.
        facts.push(fact("d", "r2", 5_000, 5, "m"));
        facts.push(fact("d", "r2", 6_000, 5, "m"));
        facts.push(fact("d", "r2", 7_000, 5, "m"));

        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        let a = out.iter().find(|v| v.entity_id == "a").unwrap();
        let d = out.iter().find(|v| v.entity_id == "d").unwrap();
        assert_eq!(a.top1_repo_id.as_deref(), Some("r1"));
        assert!(a.top1_repo_is_core);
        assert_eq!(d.top1_repo_id.as_deref(), Some("r2"));
        assert!((d.top1_repo_share - 1.0).abs() < 1e-9);
        assert!(!d.top1_repo_is_core);
    }

    #[test]
    fn message_texture_ratios() {
        let facts = vec![
            fact("a", "r1", 1_000, 1, "fix"),
            fact("a", "r1", 2_000, 1, "fix"),
            fact("a", "r1", 3_000, 1, "fix: null deref in parser"),
            fact("a", "r1", 4_000, 1, "add pagination to member list"),
            fact("a", "r1", 5_000, 1, ""),
        ];
        let out = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        let v = &out[0];
        assert_eq!(v.message_total, 4); // empty message dropped
        assert_eq!(v.message_unique_ratio, Some(0.75));
        assert!((v.top1_message_share - 0.5).abs() < 1e-9);
        assert!((v.short_message_ratio - 0.5).abs() < 1e-9); // "fix" twice
        assert!((v.generic_message_ratio - 0.75).abs() < 1e-9);
    }

    #[test]
    fn after_hours_uses_business_offset() {
        // 2026-01-05 is a Monday. 03:00 UTC = 11:00 UTC+8 → business.
        let business = Utc.with_ymd_and_hms(2026, 1, 5, 3, 0, 0).unwrap();
        assert!(!is_after_hours(business));
        // 18:00 UTC = 02:00 UTC+8 next day → after hours.
        let late = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap();
        assert!(is_after_hours(late));
        // Saturday is always after hours.
        let weekend = Utc.with_ymd_and_hms(2026, 1, 10, 3, 0, 0).unwrap();
        assert!(is_after_hours(weekend));
    }

    #[test]
    fn team_rollup_counts_inactive_devs_in_headcount() {
        let roster_rows = vec![
            roster("a", "backend-development"),
            roster("b", "backend-development"),
            roster("c", "full-stack"),
            // Non-dev report is ignored entirely.
            RosterEntry {
                entity_id: "pm".into(),
                role: Some("product-management".into()),
                line_manager: Some("M".into()),
                department_level2: None,
            },
        ];
        let facts = vec![
            fact("a", "r1", 1_000, 100, "m"),
            fact("a", "r2", 2_000, 50, "m"),
            fact("b", "r1", 3_000, 30, "m"),
            fact("pm", "r1", 4_000, 10, "m"),
        ];
        let teams = aggregate_teams(&facts, &roster_rows, &RoleWeightsConfig::default_seed());
        assert_eq!(teams.len(), 1);
        let t = &teams[0];
        assert_eq!(t.manager, "M");
        assert_eq!(t.dev_headcount, 3);
        assert_eq!(t.active_dev_count, 2);
        assert_eq!(t.commit_count, 3);
        assert!((t.commits_per_dev - 1.0).abs() < 1e-9);
        assert_eq!(t.repo_count, 2);
        assert_eq!(t.changed_lines_total, 180);
        // a: 150 * 1.1, b: 30 * 1.1
        assert!((t.weighted_changed_lines_total - 198.0).abs() < 1e-9);
        assert!((t.top1_commit_share - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(t.member_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut facts = vec![
            fact("a", "r1", 1_000, 10, "m1"),
            fact("b", "r2", 2_000, 20, "m2"),
            fact("a", "r2", 3_000, 30, "m3"),
            fact("b", "r1", 4_000, 40, "m4"),
        ];
        let baseline = aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed());
        facts.reverse();
        assert_eq!(
            aggregate_entities(&facts, &[], &RoleWeightsConfig::default_seed()),
            baseline
        );
    }
}
