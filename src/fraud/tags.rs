//! Explainable tags for the anti-fraud engine.
//!
//! Tags name *why* a composite is high. Thresholds are the 80th- (or
//! 15th-) percentile *value* of the named metric across the active
//! population — a quantile, not a rank — so several entities can cross
//! a cutoff at once. Quantiles interpolate linearly between order
//! statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::EntityFeatureVector;
use crate::percentile::quantile;

/// Template-message detection needs a meaningful message sample.
pub const TEMPLATE_MIN_MESSAGES: u64 = 20;
/// Uniqueness cutoff is the population P15, but never above this.
pub const TEMPLATE_UNIQUE_RATIO_CEIL: f64 = 0.20;
/// The most-repeated message must cover at least this share.
pub const TEMPLATE_TOP1_SHARE_MIN: f64 = 0.40;
/// Generic or short messages must cover at least this share.
pub const TEMPLATE_FILLER_RATIO_MIN: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudTag {
    ZeroChangeRatioHigh,
    TinyCommitRatioHigh,
    BurstCommits,
    AddDelFlip,
    SingleRepoGrind,
    UnderSaturated,
    TemplateMessages,
    ProtectedHighOutput,
    LowSampleSize,
}

impl fmt::Display for FraudTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FraudTag::ZeroChangeRatioHigh => "zero_change_ratio_high",
            FraudTag::TinyCommitRatioHigh => "tiny_commit_ratio_high",
            FraudTag::BurstCommits => "burst_commits",
            FraudTag::AddDelFlip => "add_del_flip",
            FraudTag::SingleRepoGrind => "single_repo_grind",
            FraudTag::UnderSaturated => "under_saturated",
            FraudTag::TemplateMessages => "template_messages",
            FraudTag::ProtectedHighOutput => "protected_high_output",
            FraudTag::LowSampleSize => "low_sample_size",
        };
        f.write_str(s)
    }
}

/// Quantile cutoffs derived once per window from the active population.
#[derive(Debug, Clone, Copy)]
pub struct TagThresholds {
    pub zero_ratio_p80: f64,
    pub tiny_ratio_p80: f64,
    pub burst_p80: f64,
    pub balance_p80: f64,
    pub repo_share_p80: f64,
    pub msg_unique_p15: f64,
}

impl TagThresholds {
    pub fn from_population(population: &[EntityFeatureVector]) -> Self {
        let collect = |f: fn(&EntityFeatureVector) -> f64| -> Vec<f64> {
            population.iter().map(f).collect()
        };
        Self {
            zero_ratio_p80: quantile(&collect(|v| v.zero_change_ratio), 0.80),
            tiny_ratio_p80: quantile(&collect(|v| v.tiny_change_ratio), 0.80),
            burst_p80: quantile(&collect(|v| v.max_commits_per_10min as f64), 0.80),
            balance_p80: quantile(&collect(|v| v.balanced_edit_ratio), 0.80),
            repo_share_p80: quantile(&collect(|v| v.top1_repo_share), 0.80),
            msg_unique_p15: quantile(&collect(|v| v.message_unique_ratio.unwrap_or(1.0)), 0.15),
        }
    }
}

/// Derive the tag list for one entity.
///
/// `min_commits` is the window's participation floor (`6 × months`);
/// `is_dev_role` gates the under-saturation tag to development roles;
/// `protected` / `low_sample` mirror which protective-downweight branch
/// fired, so the discount is always explained.
pub fn derive_tags(
    v: &EntityFeatureVector,
    t: &TagThresholds,
    min_commits: u64,
    is_dev_role: bool,
    protected: bool,
    low_sample: bool,
) -> Vec<FraudTag> {
    let mut tags = Vec::new();

    if v.zero_change_ratio >= t.zero_ratio_p80 {
        tags.push(FraudTag::ZeroChangeRatioHigh);
    }
    if v.tiny_change_ratio >= t.tiny_ratio_p80 {
        tags.push(FraudTag::TinyCommitRatioHigh);
    }
    if v.max_commits_per_10min as f64 >= t.burst_p80 {
        tags.push(FraudTag::BurstCommits);
    }
    if v.commit_count >= 20 && v.balanced_edit_ratio >= t.balance_p80 {
        tags.push(FraudTag::AddDelFlip);
    }
    // Core repos are exempt: heavy share of a shared, high-traffic repo
    // reflects ownership, not grinding.
    if !v.top1_repo_is_core && v.top1_repo_share >= t.repo_share_p80 {
        tags.push(FraudTag::SingleRepoGrind);
    }
    if is_dev_role && v.commit_count < min_commits {
        tags.push(FraudTag::UnderSaturated);
    }
    if is_template_messenger(v, t) {
        tags.push(FraudTag::TemplateMessages);
    }
    if protected {
        tags.push(FraudTag::ProtectedHighOutput);
    }
    if low_sample {
        tags.push(FraudTag::LowSampleSize);
    }
    tags
}

fn is_template_messenger(v: &EntityFeatureVector, t: &TagThresholds) -> bool {
    let Some(unique_ratio) = v.message_unique_ratio else {
        return false;
    };
    v.message_total >= TEMPLATE_MIN_MESSAGES
        && unique_ratio <= t.msg_unique_p15.min(TEMPLATE_UNIQUE_RATIO_CEIL)
        && v.top1_message_share >= TEMPLATE_TOP1_SHARE_MIN
        && (v.generic_message_ratio >= TEMPLATE_FILLER_RATIO_MIN
            || v.short_message_ratio >= TEMPLATE_FILLER_RATIO_MIN)
}
