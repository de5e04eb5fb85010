use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::phi::min_high_share;

pub const DEFAULT_TOPICS: usize = 5;
pub const DEFAULT_VOCAB_SIZE: usize = 1000;
pub const DEFAULT_DOCS: usize = 3000;
pub const DEFAULT_ALPHA: f64 = 0.5;
pub const DEFAULT_DOC_LENGTH: usize = 200;
pub const DEFAULT_HIGH_SHARE: f64 = 0.90;
pub const DEFAULT_INFERENCE_ITERATIONS: usize = 100;
pub const DEFAULT_INFERENCE_SEED: u64 = 42;

/// Every parameter of one simulation run. Built once, then passed by
/// reference into each pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub topics: usize,
    pub vocab_size: usize,
    pub docs: usize,
    pub alpha: f64,
    pub doc_length: usize,
    pub high_share: f64,
    pub topic_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_seed: Option<u64>,
    pub inference: InferenceConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS,
            vocab_size: DEFAULT_VOCAB_SIZE,
            docs: DEFAULT_DOCS,
            alpha: DEFAULT_ALPHA,
            doc_length: DEFAULT_DOC_LENGTH,
            high_share: DEFAULT_HIGH_SHARE,
            topic_labels: default_topic_labels(),
            generation_seed: None,
            inference: InferenceConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.topics == 0 {
            return Err(invalid("topics must be at least 1"));
        }
        if self.vocab_size < self.topics {
            return Err(invalid(format!(
                "vocab_size ({}) must be at least the number of topics ({})",
                self.vocab_size, self.topics
            )));
        }
        if self.docs == 0 {
            return Err(invalid("docs must be at least 1"));
        }
        if self.doc_length == 0 {
            return Err(invalid("doc_length must be at least 1"));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(invalid(format!("alpha must be positive, got {}", self.alpha)));
        }
        if !(self.high_share > 0.0 && self.high_share <= 1.0) {
            return Err(invalid(format!(
                "high_share must be in (0, 1], got {}",
                self.high_share
            )));
        }
        if let Some(bound) = min_high_share(self.topics, self.vocab_size) {
            if self.high_share <= bound {
                return Err(invalid(format!(
                    "high_share must exceed block_size / vocab_size = {bound}, got {}",
                    self.high_share
                )));
            }
        }
        self.inference.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub iterations: usize,
    pub seed: u64,
    /// Symmetric Dirichlet prior on document-topic proportions. `1/K` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_topic_prior: Option<f64>,
    /// Symmetric Dirichlet prior on topic-word distributions. `1/K` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_word_prior: Option<f64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_INFERENCE_ITERATIONS,
            seed: DEFAULT_INFERENCE_SEED,
            doc_topic_prior: None,
            topic_word_prior: None,
        }
    }
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(invalid("inference.iterations must be at least 1"));
        }
        for (name, prior) in [
            ("doc_topic_prior", self.doc_topic_prior),
            ("topic_word_prior", self.topic_word_prior),
        ] {
            if let Some(value) = prior {
                if !(value.is_finite() && value > 0.0) {
                    return Err(invalid(format!(
                        "inference.{name} must be positive, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn default_topic_labels() -> Vec<String> {
    ["Movies_A", "Sports_B", "Finance_C", "Life_D", "Literature_E"]
        .iter()
        .map(|label| label.to_string())
        .collect()
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_five_topics_over_a_thousand_words() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.topics, 5);
        assert_eq!(cfg.vocab_size, 1000);
        assert_eq!(cfg.docs, 3000);
        assert_eq!(cfg.doc_length, 200);
        assert!((cfg.high_share - 0.90).abs() < 1e-12);
        assert_eq!(cfg.inference.seed, 42);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_vocab_smaller_than_topics() {
        let cfg = SimConfig {
            topics: 8,
            vocab_size: 4,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_positive_alpha_and_priors() {
        let cfg = SimConfig {
            alpha: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.inference.topic_word_prior = Some(-1.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_high_share_at_or_below_block_fraction() {
        let cfg = SimConfig {
            high_share: 0.1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
        let cfg = SimConfig {
            high_share: 0.2,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = SimConfig {
            high_share: 0.25,
            ..Default::default()
        };
        cfg.validate().unwrap();

        let single = SimConfig {
            topics: 1,
            high_share: 0.1,
            ..Default::default()
        };
        single.validate().unwrap();
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{"topics": 3, "alpha": 0.1}"#).unwrap();
        assert_eq!(cfg.topics, 3);
        assert_eq!(cfg.vocab_size, DEFAULT_VOCAB_SIZE);
        assert_eq!(cfg.inference.iterations, DEFAULT_INFERENCE_ITERATIONS);
        assert_eq!(cfg.topic_labels.len(), 5);
    }
}
