use rustc_hash::FxHashMap;
use tracing::warn;

use crate::vocabulary::Vocabulary;

/// Sparse N×V count matrix. Column `j` is vocabulary word `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDocumentMatrix {
    vocab_size: usize,
    rows: Vec<Vec<(usize, u32)>>,
}

impl TermDocumentMatrix {
    /// Counts whitespace-separated tokens that exactly match a vocabulary
    /// entry. Anything else is skipped.
    pub fn from_texts<'t, I>(texts: I, vocabulary: &Vocabulary) -> Self
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for text in texts {
            let mut counts: FxHashMap<usize, u32> = FxHashMap::default();
            for token in text.split_whitespace() {
                match vocabulary.index_of(token) {
                    Some(idx) => *counts.entry(idx).or_insert(0) += 1,
                    None => skipped += 1,
                }
            }
            let mut row: Vec<(usize, u32)> = counts.into_iter().collect();
            row.sort_unstable_by_key(|(idx, _)| *idx);
            rows.push(row);
        }
        if skipped > 0 {
            warn!(skipped, "tokens outside the vocabulary were ignored");
        }
        Self {
            vocab_size: vocabulary.len(),
            rows,
        }
    }

    /// `(documents, vocabulary size)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.vocab_size)
    }

    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn row(&self, doc: usize) -> &[(usize, u32)] {
        &self.rows[doc]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[(usize, u32)]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn doc_length(&self, doc: usize) -> u64 {
        self.rows[doc].iter().map(|(_, c)| u64::from(*c)).sum()
    }

    pub fn total_tokens(&self) -> u64 {
        (0..self.rows.len()).map(|d| self.doc_length(d)).sum()
    }
}
