//! Configuration for template matching operations

use super::error::{MatchError, MatchResult};
use super::types::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum correlation coefficient for a match (0.0 to 1.0)
    pub threshold: f32,
    /// Reference scale factors, tried in order
    pub scales: Vec<f32>,
    /// Exhaustive or first-match scale walk
    pub mode: MatchMode,
    /// Factor applied to captured screenshots before matching
    pub frame_scale: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            scales: vec![1.0],
            mode: MatchMode::Exhaustive,
            frame_scale: 1.0,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> MatchResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.scales.is_empty() {
            return Err(MatchError::InvalidConfig(
                "at least one scale is required".to_string(),
            ));
        }
        if let Some(bad) = self.scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(MatchError::InvalidConfig(format!(
                "scales must be positive numbers, got {bad}"
            )));
        }
        if !self.frame_scale.is_finite() || self.frame_scale <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "frame scale must be a positive number, got {}",
                self.frame_scale
            )));
        }
        Ok(())
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> MatchResult<Self> {
        let path = path.as_ref();
        let config_err = |reason: String| MatchError::ConfigFile {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config: MatchConfig =
            serde_json::from_str(&text).map_err(|e| config_err(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace_scales(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}

/// Configuration for locating a button and tapping it: a wide scale sweep
/// that stops at the first scale with a hit
pub fn create_tap_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.8,
        scales: linspace_scales(0.1, 3.0, 10),
        mode: MatchMode::FirstMatch,
        frame_scale: 1.0,
    }
}

/// Configuration for visual inspection: every match on a downscaled screenshot
pub fn create_inspect_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.8,
        scales: vec![1.0],
        mode: MatchMode::Exhaustive,
        frame_scale: 0.4,
    }
}
