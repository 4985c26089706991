//! Tunable configuration for the layout engine, cache and viewport.
//!
//! Every field has a default so a config file only needs to name the values it
//! overrides. Force constants are tuned for visual balance; nothing relies on
//! their exact values beyond monotonicity.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Physics constants for one layout run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub seed: u64,
    pub repulsion_strength: f32,
    pub min_distance: f32,
    pub link_distance: f32,
    pub spring_strength: f32,
    pub center_strength: f32,
    pub collision_padding: f32,
    pub collision_iterations: usize,
    pub velocity_decay: f32,
    pub max_speed: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub drag_alpha_target: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_b10,
            repulsion_strength: 6_000.0,
            min_distance: 1.0,
            link_distance: 90.0,
            spring_strength: 0.6,
            center_strength: 0.005,
            collision_padding: 2.0,
            collision_iterations: 2,
            velocity_decay: 0.4,
            max_speed: 60.0,
            alpha_min: 0.001,
            // 1 - alpha_min^(1/300): roughly 300 ticks from a cold start.
            alpha_decay: 0.0228,
            drag_alpha_target: 0.3,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("repulsion_strength", self.repulsion_strength),
            ("min_distance", self.min_distance),
            ("link_distance", self.link_distance),
            ("spring_strength", self.spring_strength),
            ("max_speed", self.max_speed),
            ("alpha_min", self.alpha_min),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "layout.{name} must be positive, got {value}"
                )));
            }
        }

        let unit = [
            ("center_strength", self.center_strength),
            ("velocity_decay", self.velocity_decay),
            ("alpha_decay", self.alpha_decay),
            ("drag_alpha_target", self.drag_alpha_target),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "layout.{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.alpha_decay <= 0.0 {
            return Err(ConfigError::Invalid(
                "layout.alpha_decay must be greater than zero".to_owned(),
            ));
        }
        if self.collision_padding < 0.0 || !self.collision_padding.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "layout.collision_padding must be non-negative, got {}",
                self.collision_padding
            )));
        }

        Ok(())
    }
}

/// Result cache sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 5 * 60,
            capacity: 16,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Bounds for the pan/zoom transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_sensitivity: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            zoom_sensitivity: 0.0018,
        }
    }
}

/// Top-level configuration, loadable from a JSON file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub layout: LayoutConfig,
    pub cache: CacheConfig,
    pub viewport: ViewportConfig,
    /// Artificial delay applied by the file-backed graph source.
    pub source_latency_ms: u64,
}

impl ExplorerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache.capacity must be at least 1".to_owned(),
            ));
        }
        let viewport = self.viewport;
        if !(viewport.min_scale > 0.0 && viewport.min_scale <= viewport.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "viewport scale range [{}, {}] is empty",
                viewport.min_scale, viewport.max_scale
            )));
        }
        Ok(())
    }
}
