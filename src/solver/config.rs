use crate::error::{HostError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs of the HOST search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Upper bound on repair and refinement iterations.
    pub num_iterations: usize,
    /// Apply improving parent swaps once a selection is conflict-free.
    pub refine: bool,
    /// Smallest cost decrease a swap must achieve to count as an improvement.
    pub epsilon: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { num_iterations: 100, refine: true, epsilon: 1e-9 }
    }
}

impl SearchConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| HostError::Io { path: path.display().to_string(), source })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| HostError::Parse {
            path: path.display().to_string(),
            line: e.line(),
            msg: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(HostError::Config(format!("epsilon must be finite and non-negative, got {}", self.epsilon)));
        }
        Ok(())
    }
}
