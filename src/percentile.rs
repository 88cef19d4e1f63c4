// src/percentile.rs
//! Population-relative percentile normalization.
//!
//! `normalize` maps each entity's raw metric to a 0–100 score by
//! competition-style rank against the whole population: an entity's rank
//! is the count of members with a strictly smaller value, so ties share
//! a rank. Percentile = rank / (N - 1) for N > 1; a singleton population
//! scores 0 for every metric (no peers means no standing, and it keeps a
//! lone entity from scoring 100 by default).
//!
//! The result depends only on the multiset of values, never on input
//! order, so recomputation is bit-identical.

use std::collections::BTreeMap;

/// Percent-rank each `(entity, value)` pair into `[0, 100]`.
///
/// With `reverse = true` the sense flips (`1 - percentile` before
/// scaling), for metrics where a *lower* raw value is the notable one,
/// e.g. commit-interval burstiness or message duplication. A singleton
/// population scores 0 in either sense; flipping an empty standing must
/// not promote a lone entity to 100.
pub fn normalize<'a>(values: &[(&'a str, f64)], reverse: bool) -> BTreeMap<&'a str, f64> {
    if values.len() <= 1 {
        return values.iter().map(|(id, _)| (*id, 0.0)).collect();
    }
    rank_fraction(values)
        .into_iter()
        .map(|(id, frac)| {
            let p = if reverse { 1.0 - frac } else { frac };
            (id, 100.0 * p)
        })
        .collect()
}

/// Ascending percent-rank as a fraction in `[0, 1]`.
///
/// This is the raw form the protective downweighting rules compare
/// against (e.g. "total-output percentile >= 0.80").
pub fn rank_fraction<'a>(values: &[(&'a str, f64)]) -> BTreeMap<&'a str, f64> {
    let n = values.len();
    if n <= 1 {
        return values.iter().map(|(id, _)| (*id, 0.0)).collect();
    }

    let mut sorted: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
    sorted.sort_by(f64::total_cmp);

    let denom = (n - 1) as f64;
    values
        .iter()
        .map(|(id, v)| {
            // Count of strictly smaller values (competition rank).
            let rank = sorted.partition_point(|x| x < v);
            (*id, rank as f64 / denom)
        })
        .collect()
}

/// Continuous quantile with linear interpolation between order
/// statistics (the threshold layer's P80/P15 style cutoffs).
///
/// An empty slice yields 0.0; callers only pass non-empty populations.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}
