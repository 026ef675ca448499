use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::HuntError;

/// Tuning knobs for the table hunt.
///
/// All values are empirical and in page units where they are lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Slack, in page units, used whenever two coordinates are compared for
    /// "same position": snapping rulings to dividers, containment tests and
    /// zero-width gap detection.
    pub wiggle_room: f64,
    /// A vector shape thinner than this on one axis (and longer on the other)
    /// is treated as a ruled line.
    pub max_line_thickness: f64,
    /// Candidates scoring above this are discarded by [`crate::hunt_tables`].
    pub score_threshold: f64,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            wiggle_room: 0.5,
            max_line_thickness: 3.0,
            score_threshold: 0.3,
        }
    }
}

impl HuntConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, HuntError> {
        toml::from_str(text).map_err(|e| HuntError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, HuntError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
