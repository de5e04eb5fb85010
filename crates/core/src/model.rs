use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::error::Result;
use crate::generator::DocumentGenerator;
use crate::phi::TopicWordMatrix;
use crate::vocabulary::Vocabulary;

/// Vocabulary and topic-word matrix for one configuration.
#[derive(Debug, Clone)]
pub struct GenerativeModel {
    pub vocabulary: Vocabulary,
    pub phi: TopicWordMatrix,
}

impl GenerativeModel {
    pub fn from_config(cfg: &SimConfig) -> Result<Self> {
        cfg.validate()?;
        let vocabulary = Vocabulary::build(&cfg.topic_labels, cfg.topics, cfg.vocab_size)?;
        let phi = TopicWordMatrix::build(cfg.topics, cfg.vocab_size, cfg.high_share)?;
        Ok(Self { vocabulary, phi })
    }

    pub fn generator(&self) -> Result<DocumentGenerator<'_>> {
        DocumentGenerator::new(&self.phi, &self.vocabulary)
    }
}

/// Seeded when `generation_seed` is set, otherwise drawn from OS entropy.
pub fn generation_rng(cfg: &SimConfig) -> StdRng {
    match cfg.generation_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
