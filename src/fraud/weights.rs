//! Composite weights for the anti-fraud sub-scores, loadable from
//! config/fraud_weights.json.
//!
//! JSON shape:
//! {
//!   "w_tiny": 0.18, "w_small": 0.06, "w_zero": 0.10,
//!   "w_burst": 0.12, "w_inter_commit": 0.06, "w_balance": 0.14,
//!   "w_message": 0.10, "w_single_repo": 0.10, "w_low_intensity": 0.14
//! }
//!
//! The nine weights must sum to 1.0; `validate()` rejects anything else
//! so a miscalibrated config cannot silently rescale the composite.

use anyhow::{ensure, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct FraudWeights {
    pub w_tiny: f64,
    pub w_small: f64,
    pub w_zero: f64,
    pub w_burst: f64,
    pub w_inter_commit: f64,
    pub w_balance: f64,
    pub w_message: f64,
    pub w_single_repo: f64,
    pub w_low_intensity: f64,
}

impl Default for FraudWeights {
    fn default() -> Self {
        Self {
            w_tiny: 0.18,
            w_small: 0.06,
            w_zero: 0.10,
            w_burst: 0.12,
            w_inter_commit: 0.06,
            w_balance: 0.14,
            w_message: 0.10,
            w_single_repo: 0.10,
            w_low_intensity: 0.14,
        }
    }
}

impl FraudWeights {
    /// Load weights from a JSON file, falling back to the calibrated
    /// defaults when the file is missing or does not validate.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let parsed = fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<Self>(&s).ok());
        match parsed {
            Some(w) if w.validate().is_ok() => w,
            Some(_) => {
                warn!("fraud weights config does not sum to 1.0, using defaults");
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn sum(&self) -> f64 {
        self.w_tiny
            + self.w_small
            + self.w_zero
            + self.w_burst
            + self.w_inter_commit
            + self.w_balance
            + self.w_message
            + self.w_single_repo
            + self.w_low_intensity
    }

    /// The composite is a convex combination; weights must sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        ensure!(
            (sum - 1.0).abs() < 1e-9,
            "fraud weights must sum to 1.0, got {sum}"
        );
        Ok(())
    }
}
