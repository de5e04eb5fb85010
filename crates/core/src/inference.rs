use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::InferenceConfig;
use crate::dtm::TermDocumentMatrix;
use crate::error::{Result, SimError};
use crate::vocabulary::Vocabulary;

/// Anything that turns document-term counts into per-document topic
/// proportions. Row `d` of the result belongs to row `d` of the input; the
/// order of topics is whatever the backend settles on.
pub trait TopicInference {
    fn name(&self) -> &'static str;

    fn fit_transform(&self, dtm: &TermDocumentMatrix, topics: usize) -> Result<TopicFit>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicFit {
    /// N×K, each row sums to 1.
    pub doc_topic: Vec<Vec<f64>>,
    /// K×V, each row sums to 1.
    pub topic_word: Vec<Vec<f64>>,
}

impl TopicFit {
    pub fn topics(&self) -> usize {
        self.topic_word.len()
    }

    /// Highest-probability words of each fitted topic.
    pub fn top_words<'v>(&self, vocabulary: &'v Vocabulary, n: usize) -> Vec<Vec<(&'v str, f64)>> {
        self.topic_word
            .iter()
            .map(|row| {
                let mut pairs: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
                pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
                pairs
                    .into_iter()
                    .take(n)
                    .filter_map(|(w, p)| vocabulary.token(w).map(|t| (t, p)))
                    .collect()
            })
            .collect()
    }
}

/// Collapsed Gibbs sampler for LDA with symmetric priors.
#[derive(Debug, Clone)]
pub struct GibbsLda {
    pub iterations: usize,
    pub seed: u64,
    pub doc_topic_prior: Option<f64>,
    pub topic_word_prior: Option<f64>,
}

impl Default for GibbsLda {
    fn default() -> Self {
        Self::from_config(&InferenceConfig::default())
    }
}

impl GibbsLda {
    pub fn from_config(cfg: &InferenceConfig) -> Self {
        Self {
            iterations: cfg.iterations,
            seed: cfg.seed,
            doc_topic_prior: cfg.doc_topic_prior,
            topic_word_prior: cfg.topic_word_prior,
        }
    }
}

impl TopicInference for GibbsLda {
    fn name(&self) -> &'static str {
        "gibbs-lda"
    }

    fn fit_transform(&self, dtm: &TermDocumentMatrix, topics: usize) -> Result<TopicFit> {
        if topics == 0 {
            return Err(SimError::InvalidConfig(
                "inference needs at least one topic".to_string(),
            ));
        }
        if dtm.n_docs() == 0 {
            return Err(SimError::EmptyInput("term-document matrix has no documents"));
        }
        let alpha = self.doc_topic_prior.unwrap_or(1.0 / topics as f64);
        let beta = self.topic_word_prior.unwrap_or(1.0 / topics as f64);
        let v = dtm.vocab_size();
        let vb = v as f64 * beta;

        let docs: Vec<Vec<usize>> = dtm
            .rows()
            .map(|row| {
                row.iter()
                    .flat_map(|&(w, c)| std::iter::repeat(w).take(c as usize))
                    .collect()
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut z: Vec<Vec<usize>> = Vec::with_capacity(docs.len());
        let mut ndk = vec![vec![0usize; topics]; docs.len()];
        let mut nkw = vec![vec![0usize; v]; topics];
        let mut nk = vec![0usize; topics];
        for (d, doc) in docs.iter().enumerate() {
            let mut assignments = Vec::with_capacity(doc.len());
            for &w in doc {
                let t = rng.gen_range(0..topics);
                assignments.push(t);
                ndk[d][t] += 1;
                nkw[t][w] += 1;
                nk[t] += 1;
            }
            z.push(assignments);
        }

        info!(
            backend = self.name(),
            docs = docs.len(),
            topics,
            iterations = self.iterations,
            "fitting topic model"
        );
        let mut weights = vec![0.0f64; topics];
        for it in 0..self.iterations {
            for (d, doc) in docs.iter().enumerate() {
                for (pos, &w) in doc.iter().enumerate() {
                    let old = z[d][pos];
                    ndk[d][old] -= 1;
                    nkw[old][w] -= 1;
                    nk[old] -= 1;

                    // p(t) ∝ (n_dt + α)(n_tw + β) / (n_t + Vβ)
                    let mut total = 0.0;
                    for t in 0..topics {
                        total += (ndk[d][t] as f64 + alpha) * (nkw[t][w] as f64 + beta)
                            / (nk[t] as f64 + vb);
                        weights[t] = total;
                    }
                    let target = rng.gen::<f64>() * total;
                    let new = weights
                        .iter()
                        .position(|&cum| target < cum)
                        .unwrap_or(topics - 1);

                    z[d][pos] = new;
                    ndk[d][new] += 1;
                    nkw[new][w] += 1;
                    nk[new] += 1;
                }
            }
            if (it + 1) % 25 == 0 {
                debug!(iteration = it + 1, total = self.iterations, "gibbs sweep");
            }
        }

        let doc_topic = docs
            .iter()
            .enumerate()
            .map(|(d, doc)| {
                let denom = doc.len() as f64 + topics as f64 * alpha;
                (0..topics)
                    .map(|t| (ndk[d][t] as f64 + alpha) / denom)
                    .collect()
            })
            .collect();
        let topic_word = (0..topics)
            .map(|t| {
                let denom = nk[t] as f64 + vb;
                (0..v).map(|w| (nkw[t][w] as f64 + beta) / denom).collect()
            })
            .collect();
        Ok(TopicFit {
            doc_topic,
            topic_word,
        })
    }
}
