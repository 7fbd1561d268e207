use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, InvalidAmbientConfigSnafu};

/// Default pool for synthetic system notices.
fn default_notice_phrases() -> Vec<String> {
    [
        "A new member just joined the room",
        "Connection quality: excellent",
        "Today's build has been published",
        "A moderator is now online",
        "Room settings were updated",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Default templates for promotional "gold review" injections; `{rating}` is
/// substituted with the sampled value.
fn default_promo_templates() -> Vec<String> {
    [
        "\u{2b50} {rating} \u{2014} been using it for a month, never looked back",
        "\u{2b50} {rating} \u{2014} support answered me in minutes, verified review",
        "\u{2b50} {rating} \u{2014} my whole squad switched after one session",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Tunables for the background injection timer.
///
/// The tick/probability split mimics organic room activity; all values are
/// product-tuned configuration, not invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Interval between injection draws while playback is active.
    pub tick_interval_ms: u64,
    /// Draws above this threshold inject a promotional review.
    pub promo_threshold: f32,
    /// Draws below this threshold inject a system notice.
    pub notice_threshold: f32,
    /// Sampled rating band for promotional reviews.
    pub rating_low: f32,
    pub rating_high: f32,
    #[serde(default = "default_notice_phrases")]
    pub notice_phrases: Vec<String>,
    #[serde(default = "default_promo_templates")]
    pub promo_templates: Vec<String>,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 25_000,
            promo_threshold: 0.8,
            notice_threshold: 0.1,
            rating_low: 4.5,
            rating_high: 5.0,
            notice_phrases: default_notice_phrases(),
            promo_templates: default_promo_templates(),
        }
    }
}

impl AmbientConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.tick_interval_ms == 0 {
            return InvalidAmbientConfigSnafu {
                stage: "validate-ambient-config",
                details: "tick_interval_ms must be positive".to_string(),
            }
            .fail();
        }
        if !(0.0..=1.0).contains(&self.notice_threshold)
            || !(0.0..=1.0).contains(&self.promo_threshold)
            || self.notice_threshold > self.promo_threshold
        {
            return InvalidAmbientConfigSnafu {
                stage: "validate-ambient-config",
                details: format!(
                    "thresholds notice={} promo={} must partition [0, 1)",
                    self.notice_threshold, self.promo_threshold
                ),
            }
            .fail();
        }
        if self.rating_low > self.rating_high {
            return InvalidAmbientConfigSnafu {
                stage: "validate-ambient-config",
                details: format!(
                    "rating band [{}, {}] is inverted",
                    self.rating_low, self.rating_high
                ),
            }
            .fail();
        }
        if self.notice_phrases.is_empty() || self.promo_templates.is_empty() {
            return InvalidAmbientConfigSnafu {
                stage: "validate-ambient-config",
                details: "phrase pools must not be empty".to_string(),
            }
            .fail();
        }
        Ok(())
    }
}

/// One synthesized injection, before it is stamped into a `LiveMessage`.
#[derive(Debug, Clone, PartialEq)]
pub enum AmbientEvent {
    SystemNotice { text: String },
    GoldReview { text: String, rating: f32 },
}

/// Draws at most one ambient event per tick.
#[derive(Debug, Clone)]
pub struct AmbientSampler {
    config: AmbientConfig,
}

impl AmbientSampler {
    pub fn new(config: AmbientConfig) -> Self {
        Self { config }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.config.tick_interval_ms
    }

    /// Samples one tick: promo above the upper threshold, notice below the
    /// lower one, nothing in between.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AmbientEvent> {
        let roll: f32 = rng.random();

        if roll > self.config.promo_threshold {
            let rating = rng.random_range(self.config.rating_low..=self.config.rating_high);
            let template_index = rng.random_range(0..self.config.promo_templates.len());
            let text = self.config.promo_templates[template_index]
                .replace("{rating}", &format!("{rating:.1}"));
            return Some(AmbientEvent::GoldReview { text, rating });
        }

        if roll < self.config.notice_threshold {
            let phrase_index = rng.random_range(0..self.config.notice_phrases.len());
            return Some(AmbientEvent::SystemNotice {
                text: self.config.notice_phrases[phrase_index].clone(),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn sample_split_roughly_matches_configured_thresholds() {
        let sampler = AmbientSampler::new(AmbientConfig::default());
        let mut rng = StdRng::seed_from_u64(99);

        let mut promos = 0usize;
        let mut notices = 0usize;
        let mut quiet = 0usize;
        const DRAWS: usize = 10_000;

        for _ in 0..DRAWS {
            match sampler.sample(&mut rng) {
                Some(AmbientEvent::GoldReview { rating, .. }) => {
                    assert!((4.5..=5.0).contains(&rating));
                    promos += 1;
                }
                Some(AmbientEvent::SystemNotice { text }) => {
                    assert!(!text.is_empty());
                    notices += 1;
                }
                None => quiet += 1,
            }
        }

        // 20 / 10 / 70 split with generous slack for a fixed seed.
        assert!((1_500..2_500).contains(&promos), "promos={promos}");
        assert!((700..1_300).contains(&notices), "notices={notices}");
        assert!((6_500..7_500).contains(&quiet), "quiet={quiet}");
    }

    #[test]
    fn gold_review_text_substitutes_the_sampled_rating() {
        let sampler = AmbientSampler::new(AmbientConfig::default());
        let mut rng = StdRng::seed_from_u64(3);

        let review = std::iter::from_fn(|| Some(sampler.sample(&mut rng)))
            .take(1_000)
            .flatten()
            .find_map(|event| match event {
                AmbientEvent::GoldReview { text, rating } => Some((text, rating)),
                AmbientEvent::SystemNotice { .. } => None,
            })
            .expect("a promo draw within a bounded number of samples");

        let (text, rating) = review;
        assert!(text.contains(&format!("{rating:.1}")));
        assert!(!text.contains("{rating}"));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = AmbientConfig {
            promo_threshold: 0.1,
            notice_threshold: 0.8,
            ..AmbientConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AmbientConfig::default().validate().is_ok());
    }
}
