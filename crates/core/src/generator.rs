use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::{Dirichlet, Gamma, Open01};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimError};
use crate::phi::TopicWordMatrix;
use crate::vocabulary::Vocabulary;

pub const PROGRESS_INTERVAL: usize = 500;

/// Concentrations below this are drawn in log space; the gamma draws behind
/// `Dirichlet` underflow to all-zero vectors there.
const LOG_SPACE_ALPHA: f64 = 0.1;

/// One synthetic document ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub run_id: i64,
    pub text: String,
    pub true_theta: Vec<f64>,
}

impl GeneratedDocument {
    pub fn theta_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.true_theta)?)
    }
}

/// Draws `n` proportion vectors from a symmetric `Dirichlet(alpha, .., alpha)`
/// over `topics` components.
pub fn draw_topic_proportions<R: Rng + ?Sized>(
    alpha: f64,
    topics: usize,
    n: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    if topics == 0 {
        return Err(SimError::InvalidConfig(
            "dirichlet needs at least one component".to_string(),
        ));
    }
    if !(alpha.is_finite() && alpha > 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "dirichlet concentration must be positive, got {alpha}"
        )));
    }
    if topics == 1 {
        return Ok(vec![vec![1.0]; n]);
    }
    if alpha < LOG_SPACE_ALPHA {
        let boosted = Gamma::new(alpha + 1.0, 1.0)?;
        return Ok((0..n)
            .map(|_| draw_in_log_space(alpha, topics, &boosted, rng))
            .collect());
    }
    let dirichlet = Dirichlet::new(&vec![alpha; topics])?;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let theta: Vec<f64> = dirichlet.sample(rng);
        if theta.iter().any(|p| !p.is_finite()) {
            return Err(SimError::Sampling(format!(
                "dirichlet draw underflowed for alpha={alpha}"
            )));
        }
        out.push(theta);
    }
    Ok(out)
}

// ln G(a) = ln G(a + 1) + ln(U) / a, then normalized against the largest log.
fn draw_in_log_space<R: Rng + ?Sized>(
    alpha: f64,
    topics: usize,
    boosted: &Gamma<f64>,
    rng: &mut R,
) -> Vec<f64> {
    let logs: Vec<f64> = (0..topics)
        .map(|_| {
            let g: f64 = boosted.sample(rng);
            let u: f64 = Open01.sample(rng);
            g.ln() + u.ln() / alpha
        })
        .collect();
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = logs.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

pub struct DocumentGenerator<'a> {
    vocabulary: &'a Vocabulary,
    topics: usize,
    word_samplers: Vec<WeightedIndex<f64>>,
}

impl<'a> DocumentGenerator<'a> {
    pub fn new(phi: &TopicWordMatrix, vocabulary: &'a Vocabulary) -> Result<Self> {
        if phi.vocab_size() != vocabulary.len() {
            return Err(SimError::DimensionMismatch {
                context: "topic-word columns vs vocabulary",
                expected: vocabulary.len(),
                actual: phi.vocab_size(),
            });
        }
        let word_samplers = phi
            .rows()
            .map(WeightedIndex::<f64>::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            vocabulary,
            topics: phi.topics(),
            word_samplers,
        })
    }

    /// Generates `n_docs` documents of `doc_length` tokens each. Every
    /// [`PROGRESS_INTERVAL`] documents `on_progress(done, total)` is called.
    pub fn generate<R, F>(
        &self,
        run_id: i64,
        alpha: f64,
        n_docs: usize,
        doc_length: usize,
        rng: &mut R,
        mut on_progress: F,
    ) -> Result<Vec<GeneratedDocument>>
    where
        R: Rng + ?Sized,
        F: FnMut(usize, usize),
    {
        let thetas = draw_topic_proportions(alpha, self.topics, n_docs, rng)?;
        let mut documents = Vec::with_capacity(n_docs);
        for (i, theta) in thetas.into_iter().enumerate() {
            let text = self.sample_text(&theta, doc_length, rng)?;
            documents.push(GeneratedDocument {
                run_id,
                text,
                true_theta: theta,
            });
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                debug!(generated = i + 1, total = n_docs, "documents generated");
                on_progress(i + 1, n_docs);
            }
        }
        debug!(documents = documents.len(), "document generation finished");
        Ok(documents)
    }

    fn sample_text<R: Rng + ?Sized>(
        &self,
        theta: &[f64],
        doc_length: usize,
        rng: &mut R,
    ) -> Result<String> {
        let topic_sampler = WeightedIndex::new(theta)?;
        let mut text = String::with_capacity(doc_length * 12);
        for pos in 0..doc_length {
            let topic = topic_sampler.sample(rng);
            let word = self.word_samplers[topic].sample(rng);
            let token = self
                .vocabulary
                .token(word)
                .ok_or(SimError::DimensionMismatch {
                    context: "sampled word index",
                    expected: self.vocabulary.len(),
                    actual: word,
                })?;
            if pos > 0 {
                text.push(' ');
            }
            text.push_str(token);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_topic_labels;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct InfoCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for InfoCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= Level::INFO {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn five_hundred_documents_have_fifty_vocabulary_tokens_each() {
        let vocab = Vocabulary::build(&default_topic_labels(), 5, 1000).unwrap();
        let phi = TopicWordMatrix::build(5, 1000, 0.9).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut ticks = Vec::new();
        let docs = DocumentGenerator::new(&phi, &vocab)
            .unwrap()
            .generate(11, 0.5, 500, 50, &mut rng, |done, total| {
                ticks.push((done, total))
            })
            .unwrap();
        assert_eq!(docs.len(), 500);
        assert_eq!(ticks, vec![(500, 500)]);
        for doc in &docs {
            assert_eq!(doc.run_id, 11);
            let tokens: Vec<&str> = doc.text.split(' ').collect();
            assert_eq!(tokens.len(), 50);
            assert!(tokens.iter().all(|t| vocab.index_of(t).is_some()));
            assert_eq!(doc.true_theta.len(), 5);
            let sum: f64 = doc.true_theta.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let vocab = Vocabulary::build(&default_topic_labels(), 3, 30).unwrap();
        let phi = TopicWordMatrix::build(3, 30, 0.9).unwrap();
        let generator = DocumentGenerator::new(&phi, &vocab).unwrap();
        let a = generator
            .generate(1, 0.3, 10, 8, &mut StdRng::seed_from_u64(99), |_, _| {})
            .unwrap();
        let b = generator
            .generate(1, 0.3, 10, 8, &mut StdRng::seed_from_u64(99), |_, _| {})
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_topic_documents_have_unit_theta() {
        let vocab = Vocabulary::build(&default_topic_labels(), 1, 10).unwrap();
        let phi = TopicWordMatrix::build(1, 10, 0.9).unwrap();
        let docs = DocumentGenerator::new(&phi, &vocab)
            .unwrap()
            .generate(1, 0.5, 3, 4, &mut StdRng::seed_from_u64(1), |_, _| {})
            .unwrap();
        assert!(docs.iter().all(|d| d.true_theta == vec![1.0]));
    }

    #[test]
    fn theta_serializes_as_json_array() {
        let doc = GeneratedDocument {
            run_id: 1,
            text: "a b".to_string(),
            true_theta: vec![0.25, 0.75],
        };
        assert_eq!(doc.theta_json().unwrap(), "[0.25,0.75]");
    }

    #[test]
    fn tiny_alpha_still_yields_simplex_draws() {
        let mut rng = StdRng::seed_from_u64(1);
        for alpha in [0.05, 0.01, 0.001, 1e-4] {
            let draws = draw_topic_proportions(alpha, 5, 3000, &mut rng).unwrap();
            assert_eq!(draws.len(), 3000);
            for theta in &draws {
                assert!(theta.iter().all(|p| p.is_finite() && *p >= 0.0));
                let sum: f64 = theta.iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "alpha {alpha}: sum {sum}");
            }
        }
    }

    #[test]
    fn tiny_alpha_draws_are_nearly_one_hot_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(3);
        let draws = draw_topic_proportions(0.001, 5, 3000, &mut rng).unwrap();
        let mut wins = [0usize; 5];
        let mut peak_sum = 0.0;
        for theta in &draws {
            let (arg, peak) = theta
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::MIN), |best, (k, p)| if p > best.1 { (k, p) } else { best });
            wins[arg] += 1;
            peak_sum += peak;
        }
        assert!(peak_sum / 3000.0 > 0.9);
        assert!(wins.iter().all(|&w| w > 400), "{wins:?}");
    }

    #[test]
    fn component_means_stay_uniform_on_both_sides_of_the_log_space_cutoff() {
        let mut rng = StdRng::seed_from_u64(11);
        for alpha in [0.05, 0.5] {
            let draws = draw_topic_proportions(alpha, 5, 3000, &mut rng).unwrap();
            let mean = draws.iter().map(|t| t[0]).sum::<f64>() / 3000.0;
            assert!((mean - 0.2).abs() < 0.05, "alpha {alpha}: mean {mean}");
        }
    }

    #[test]
    fn tiny_alpha_generation_completes() {
        let vocab = Vocabulary::build(&default_topic_labels(), 5, 100).unwrap();
        let phi = TopicWordMatrix::build(5, 100, 0.9).unwrap();
        let docs = DocumentGenerator::new(&phi, &vocab)
            .unwrap()
            .generate(1, 0.001, 50, 10, &mut StdRng::seed_from_u64(9), |_, _| {})
            .unwrap();
        assert_eq!(docs.len(), 50);
    }

    #[test]
    fn mismatched_vocabulary_is_rejected() {
        let vocab = Vocabulary::build(&default_topic_labels(), 2, 10).unwrap();
        let phi = TopicWordMatrix::build(2, 12, 0.9).unwrap();
        assert!(matches!(
            DocumentGenerator::new(&phi, &vocab),
            Err(SimError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn progress_ticks_stay_below_info_level() {
        let vocab = Vocabulary::build(&default_topic_labels(), 2, 10).unwrap();
        let phi = TopicWordMatrix::build(2, 10, 0.9).unwrap();
        let generator = DocumentGenerator::new(&phi, &vocab).unwrap();
        let loud = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(InfoCounter(loud.clone()));
        let mut ticks = 0;
        tracing::subscriber::with_default(subscriber, || {
            generator
                .generate(1, 0.5, 1000, 2, &mut StdRng::seed_from_u64(4), |_, _| ticks += 1)
                .unwrap();
        });
        assert_eq!(ticks, 2);
        assert_eq!(loud.load(Ordering::SeqCst), 0);
    }
}
