use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, InvalidTypingConfigSnafu};

/// Tunables for the human-plausible typing delay.
///
/// The defaults are product-tuned rather than literal per-character realism:
/// the clamp keeps very long messages from stalling the room while the
/// thinking floor keeps one-word messages from appearing instantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingConfig {
    pub chars_per_second: f32,
    pub base_thinking_ms: u64,
    pub max_typing_ms: u64,
    /// Multiplicative jitter band applied to the base estimate.
    pub jitter_low: f32,
    pub jitter_high: f32,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 18.0,
            base_thinking_ms: 600,
            max_typing_ms: 4_500,
            jitter_low: 0.85,
            jitter_high: 1.15,
        }
    }
}

impl TypingConfig {
    /// Validates band and rate relationships before a session is launched.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.chars_per_second > 0.0) {
            return InvalidTypingConfigSnafu {
                stage: "validate-typing-config",
                details: format!("chars_per_second must be positive, got {}", self.chars_per_second),
            }
            .fail();
        }
        if !(self.jitter_low > 0.0 && self.jitter_low <= self.jitter_high) {
            return InvalidTypingConfigSnafu {
                stage: "validate-typing-config",
                details: format!(
                    "jitter band [{}, {}] must be positive and ordered",
                    self.jitter_low, self.jitter_high
                ),
            }
            .fail();
        }
        Ok(())
    }
}

/// Maps message text length to a randomized typing delay within bounds.
#[derive(Debug, Clone)]
pub struct TypingEstimator {
    config: TypingConfig,
}

impl TypingEstimator {
    pub fn new(config: TypingConfig) -> Self {
        Self { config }
    }

    /// Base estimate in milliseconds before jitter: length-proportional
    /// typing time plus a fixed thinking floor.
    fn base_millis(&self, text: &str) -> f32 {
        let char_count = text.chars().count() as f32;
        (char_count / self.config.chars_per_second) * 1_000.0 + self.config.base_thinking_ms as f32
    }

    /// Estimates the typing delay for `text`.
    ///
    /// Any input is valid, the empty string included; the result is always in
    /// `[0, max_typing_ms]`.
    pub fn estimate<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Duration {
        let jitter = rng.random_range(self.config.jitter_low..=self.config.jitter_high);
        let millis = (self.base_millis(text) * jitter).clamp(0.0, self.config.max_typing_ms as f32);
        Duration::from_millis(millis as u64)
    }
}
