use rustc_hash::FxHashMap;

use crate::error::{Result, SimError};

const MIN_INDEX_WIDTH: usize = 3;

/// Ordered token set split into `topics` contiguous blocks of
/// `len() / topics` words. Words past `topics * block_size` belong to no
/// topic's block.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: FxHashMap<String, usize>,
    topics: usize,
    block_size: usize,
}

impl Vocabulary {
    /// Enumerates `vocab_size` tokens named `<label><index>` where the index is
    /// 1-based within each block and zero-padded to at least three digits.
    pub fn build(labels: &[String], topics: usize, vocab_size: usize) -> Result<Self> {
        if topics == 0 || vocab_size < topics {
            return Err(SimError::InvalidConfig(format!(
                "cannot partition {vocab_size} words into {topics} topics"
            )));
        }
        let block_size = vocab_size / topics;
        let labels = resolve_labels(labels, topics)?;
        let widest = block_size + (vocab_size - topics * block_size);
        let width = widest.to_string().len().max(MIN_INDEX_WIDTH);
        let mut tokens = Vec::with_capacity(vocab_size);
        for idx in 0..vocab_size {
            let topic = (idx / block_size).min(topics - 1);
            let within = idx - topic * block_size + 1;
            tokens.push(format!("{}{:0width$}", labels[topic], within, width = width));
        }
        let mut vocab = Self::from_tokens(tokens)?;
        vocab.topics = topics;
        vocab.block_size = block_size;
        Ok(vocab)
    }

    /// Wraps an explicit token list as a single-block vocabulary.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(SimError::EmptyInput("vocabulary has no tokens"));
        }
        let mut index = FxHashMap::default();
        index.reserve(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(SimError::InvalidConfig(format!(
                    "vocabulary token {token:?} is empty or contains whitespace"
                )));
            }
            if index.insert(token.clone(), idx).is_some() {
                return Err(SimError::InvalidConfig(format!(
                    "duplicate vocabulary token {token:?}"
                )));
            }
        }
        let len = tokens.len();
        Ok(Self {
            tokens,
            index,
            topics: 1,
            block_size: len,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn topics(&self) -> usize {
        self.topics
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn token(&self, idx: usize) -> Option<&str> {
        self.tokens.get(idx).map(String::as_str)
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Topic whose high-probability block contains word `idx`, if any.
    pub fn block_of(&self, idx: usize) -> Option<usize> {
        let topic = idx / self.block_size;
        (topic < self.topics).then_some(topic)
    }
}

fn resolve_labels(labels: &[String], topics: usize) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = labels.iter().take(topics).cloned().collect();
    for k in resolved.len()..topics {
        resolved.push(format!("Topic_{}", k + 1));
    }
    for (k, label) in resolved.iter().enumerate() {
        if label.is_empty() || label.chars().any(char::is_whitespace) {
            return Err(SimError::InvalidConfig(format!(
                "topic label {label:?} is empty or contains whitespace"
            )));
        }
        if resolved[..k].contains(label) {
            return Err(SimError::InvalidConfig(format!(
                "duplicate topic label {label:?}"
            )));
        }
    }
    Ok(resolved)
}
