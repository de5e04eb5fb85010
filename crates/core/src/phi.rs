use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// K×V row-stochastic topic-word matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicWordMatrix {
    topics: usize,
    vocab_size: usize,
    data: Vec<f64>,
}

impl TopicWordMatrix {
    /// Concentrates `high_share` of each topic's mass uniformly on its own
    /// block of `vocab_size / topics` words and spreads the rest uniformly over
    /// every other word, trailing words included.
    pub fn build(topics: usize, vocab_size: usize, high_share: f64) -> Result<Self> {
        if topics == 0 || vocab_size < topics {
            return Err(SimError::InvalidConfig(format!(
                "cannot build a {topics}x{vocab_size} topic-word matrix"
            )));
        }
        if !(high_share > 0.0 && high_share <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "high_share must be in (0, 1], got {high_share}"
            )));
        }
        if let Some(bound) = min_high_share(topics, vocab_size) {
            if high_share <= bound {
                return Err(SimError::InvalidConfig(format!(
                    "high_share must exceed {bound} for a {topics}x{vocab_size} layout, got {high_share}"
                )));
            }
        }
        let block_size = vocab_size / topics;
        let low_share = 1.0 - high_share;
        let high = high_share / block_size as f64;
        let outside = vocab_size - block_size;
        let low = if outside == 0 {
            0.0
        } else {
            low_share / outside as f64
        };

        let mut data = vec![low; topics * vocab_size];
        for k in 0..topics {
            let row = &mut data[k * vocab_size..(k + 1) * vocab_size];
            let start = k * block_size;
            let end = (k + 1) * block_size;
            row[start..end].fill(high);
            let sum: f64 = row.iter().sum();
            for p in row.iter_mut() {
                *p /= sum;
            }
        }
        Ok(Self {
            topics,
            vocab_size,
            data,
        })
    }

    pub fn topics(&self) -> usize {
        self.topics
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn row(&self, topic: usize) -> &[f64] {
        &self.data[topic * self.vocab_size..(topic + 1) * self.vocab_size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.vocab_size)
    }
}

/// Exclusive lower bound on `high_share` above which every own-block word is
/// more probable than any other word: `block_size / vocab_size`. `None` when
/// one block covers the whole vocabulary. Expects `1 <= topics <= vocab_size`.
pub(crate) fn min_high_share(topics: usize, vocab_size: usize) -> Option<f64> {
    let block_size = vocab_size / topics;
    (block_size < vocab_size).then(|| block_size as f64 / vocab_size as f64)
}
