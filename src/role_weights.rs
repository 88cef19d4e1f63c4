//! # Role Weights
//!
//! Configurable mapping from job roles to change-magnitude multipliers,
//! so raw changed-line volume can be compared across roles whose work
//! naturally produces different diff sizes (a data pipeline touches more
//! lines per unit of effort than a terminal client).
//!
//! - Loads from JSON config (weights + the closed development-role set).
//! - Case-insensitive lookup with separator/whitespace normalization.
//! - Fallback order: exact match → default weight.
//! - Includes a built-in `default_seed()` used when no config is found.
//!
//! The table is data, not code: new roles are added by configuration,
//! never by a new match arm.

use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};
use tracing::warn;

/// Configuration for role weights, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleWeightsConfig {
    /// Weight used when a role has no explicit entry (or is missing).
    #[serde(default = "default_default_weight")]
    pub default_weight: f64,
    /// Explicit multipliers for canonical role names.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Roles counted as "development" for team rosters and the
    /// under-saturation flag.
    #[serde(default)]
    pub development_roles: HashSet<String>,
}

fn default_default_weight() -> f64 {
    1.0
}

impl Default for RoleWeightsConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl RoleWeightsConfig {
    /// Load configuration from a JSON file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(error = %e, "role weights config unreadable, using built-in seed");
                Self::default_seed()
            }),
            Err(_) => Self::default_seed(),
        }
    }

    /// Multiplier for a role; entities without a role get the default.
    ///
    /// Negative configured weights are treated as 0 (a multiplier can
    /// dampen, never invert).
    pub fn weight_for(&self, role: Option<&str>) -> f64 {
        let Some(role) = role else {
            return self.default_weight.max(0.0);
        };
        let key = normalize_role(role);
        match self.lookup(&key) {
            Some(w) => w.max(0.0),
            None => self.default_weight.max(0.0),
        }
    }

    /// Whether the role belongs to the closed development-role set.
    pub fn is_development_role(&self, role: Option<&str>) -> bool {
        let Some(role) = role else { return false };
        let key = normalize_role(role);
        self.development_roles
            .iter()
            .any(|r| normalize_role(r) == key)
    }

    fn lookup(&self, normalized: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(k, _)| normalize_role(k) == normalized)
            .map(|(_, &w)| w)
    }

    /// Built-in seed for the closed role enumeration.
    /// Used as fallback if no config is found.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        for (k, v) in [
            ("data-development", 1.8),
            ("algorithm-development", 1.5),
            ("full-stack", 1.2),
            ("backend-development", 1.1),
            ("frontend-development", 1.0),
            ("terminal-development", 1.0),
        ] {
            weights.insert(k.to_string(), v);
        }

        let development_roles = [
            "backend-development",
            "frontend-development",
            "terminal-development",
            "algorithm-development",
            "data-development",
            "full-stack",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            default_weight: 1.0,
            weights,
            development_roles,
        }
    }
}

/// Normalize a role name: lowercase, separators and whitespace runs
/// collapsed to single dashes.
fn normalize_role(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = true;
    for ch in s.trim().chars() {
        let lc = ch.to_ascii_lowercase();
        if lc.is_whitespace() || matches!(lc, '-' | '_' | '/') {
            if !last_was_sep {
                out.push('-');
                last_was_sep = true;
            }
        } else {
            out.push(lc);
            last_was_sep = false;
        }
    }
    out.trim_end_matches('-').to_string()
}
