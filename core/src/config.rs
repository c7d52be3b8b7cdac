use serde::{Deserialize, Serialize};

use crate::deck::StackView;
use crate::error::ConfigError;
use crate::gesture::GestureConfig;
use crate::lifecycle::DEFAULT_TRANSITION_MS;
use crate::refill::RefillConfig;

/// Tunables for a swipe deck. Every field falls back to its default when
/// missing from the source document.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub transition_ms: u32,
    pub gesture: GestureConfig,
    pub view: StackView,
    pub refill: RefillConfig,
}

impl SwipeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SwipeConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let distance = self.gesture.commit_distance_px;
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ConfigError::invalid(
                "gesture.commit_distance_px",
                format!("must be a positive number, got {distance}"),
            ));
        }
        let velocity = self.gesture.commit_velocity_px_per_ms;
        if !velocity.is_finite() || velocity < 0.0 {
            return Err(ConfigError::invalid(
                "gesture.commit_velocity_px_per_ms",
                format!("must be zero or positive, got {velocity}"),
            ));
        }
        if self.view.gesture_depth == 0 {
            return Err(ConfigError::invalid(
                "view.gesture_depth",
                "at least the front card needs gesture handling",
            ));
        }
        if let Some(visible) = self.view.visible_depth {
            if visible < self.view.gesture_depth {
                return Err(ConfigError::invalid(
                    "view.visible_depth",
                    format!(
                        "{visible} hides swipeable cards (gesture_depth is {})",
                        self.view.gesture_depth
                    ),
                ));
            }
        }
        if self.refill.batch_size == 0 {
            return Err(ConfigError::invalid("refill.batch_size", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            transition_ms: DEFAULT_TRANSITION_MS,
            gesture: GestureConfig::default(),
            view: StackView::default(),
            refill: RefillConfig::default(),
        }
    }
}
