//! Precondition violations for the scoring engines.
//!
//! The engines are pure, total functions over well-formed input: every
//! entity in the population gets a score, and malformed rows are the
//! upstream collaborator's problem. The only failures reported here are
//! caller errors, rejected before any computation starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Window length must cover at least one month.
    #[error("window length must be >= 1 month, got {0}")]
    InvalidWindow(i64),

    /// The same entity appeared twice in one window's population.
    #[error("duplicate entity `{0}` in population for one window")]
    DuplicateEntity(String),
}

/// Reject a population that contains the same entity twice.
///
/// Fail-fast: the first duplicate found (in input order) is reported and
/// no partial scores are produced.
pub(crate) fn check_unique_entities<'a, I>(ids: I) -> Result<(), ScoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ScoreError::DuplicateEntity(id.to_string()));
        }
    }
    Ok(())
}

/// Reject a non-positive window length.
pub(crate) fn check_window_months(window_months: i64) -> Result<(), ScoreError> {
    if window_months < 1 {
        return Err(ScoreError::InvalidWindow(window_months));
    }
    Ok(())
}
