// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod employee;
pub mod error;
pub mod facts;
pub mod features;
pub mod fraud;
pub mod percentile;
pub mod role_weights;
pub mod score;
pub mod team;

// ---- Re-exports for stable public API ----
// The common path: facts in, feature vectors, then one engine per output.
pub use crate::employee::compute_employee_scores;
pub use crate::error::ScoreError;
pub use crate::facts::{CommitFact, RosterEntry};
pub use crate::features::{
    aggregate_entities, aggregate_teams, EntityFeatureVector, TeamFeatureVector,
};
pub use crate::fraud::{compute_fraud_scores, FraudTag, FraudWeights};
pub use crate::role_weights::RoleWeightsConfig;
pub use crate::score::{FraudRecord, ScoreRecord, TeamScoreRecord};
pub use crate::team::{compute_team_scores, TeamTag};
