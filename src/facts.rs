// src/facts.rs
//! External input types at the collaborator boundary.
//!
//! The commit-fact source delivers, per window, all commit records with
//! `entity_id` already resolved to a stable identity (alias
//! reconciliation happens upstream). The roster source maps entities to
//! roles and line managers. Both are read-only snapshots; the engines
//! never mutate or persist them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commit as delivered by the fact source.
///
/// Merge commits carry `is_merge = true` and are excluded before any
/// aggregation; they never count toward activity or suspicion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitFact {
    pub entity_id: String,
    pub repo_id: String,
    /// Window this fact was captured for, e.g. "2026-07..2026-08".
    pub window_label: String,
    pub committed_at: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
    pub changed_lines: u64,
    pub message: String,
    pub is_merge: bool,
}

/// One roster row from the role/roster source.
///
/// `role` strings come from the closed enumeration used by the
/// role-weighting table; an unknown or missing role falls back to the
/// default weight. `line_manager` groups developers into teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub entity_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub line_manager: Option<String>,
    #[serde(default)]
    pub department_level2: Option<String>,
}

/// Manager bucket for roster rows without an assigned line manager.
pub const UNASSIGNED_MANAGER: &str = "Unassigned";

impl RosterEntry {
    /// Manager key used for team grouping (blank manager → "Unassigned").
    pub fn manager_key(&self) -> &str {
        match self.line_manager.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => UNASSIGNED_MANAGER,
        }
    }
}

/// Normalize a commit message for duplicate/template detection:
/// lowercase, collapse whitespace runs to a single space, trim.
pub fn normalize_message(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for ch in s.chars() {
        let lc = ch.to_lowercase().next().unwrap_or(ch);
        if lc.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(lc);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_normalization_collapses_whitespace() {
        assert_eq!(normalize_message("  Fix   BUG\n\t#42 "), "fix bug #42");
        assert_eq!(normalize_message(""), "");
        assert_eq!(normalize_message("   \n "), "");
    }

    #[test]
    fn manager_key_falls_back_to_unassigned() {
        let mut e = RosterEntry {
            entity_id: "e1".into(),
            role: None,
            line_manager: None,
            department_level2: None,
        };
        assert_eq!(e.manager_key(), UNASSIGNED_MANAGER);
        e.line_manager = Some("   ".into());
        assert_eq!(e.manager_key(), UNASSIGNED_MANAGER);
        e.line_manager = Some("Alice".into());
        assert_eq!(e.manager_key(), "Alice");
    }
}
