use crate::error::{Result, SimError};

/// `dot(a, b) / (|a| |b|)`, or `0.0` when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0f64;
    let mut a_norm = 0.0f64;
    let mut b_norm = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    dot / (a_norm.sqrt() * b_norm.sqrt())
}

/// Per-document similarity between true and inferred proportions. Topic
/// index `j` on one side is compared with index `j` on the other.
pub fn score_documents(truth: &[Vec<f64>], predicted: &[Vec<f64>]) -> Result<Vec<f64>> {
    if truth.len() != predicted.len() {
        return Err(SimError::DimensionMismatch {
            context: "scored document count",
            expected: truth.len(),
            actual: predicted.len(),
        });
    }
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| {
            if t.len() != p.len() {
                return Err(SimError::DimensionMismatch {
                    context: "topic proportion length",
                    expected: t.len(),
                    actual: p.len(),
                });
            }
            Ok(cosine_similarity(t, p))
        })
        .collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean_similarity(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_unit_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), 0.0);
    }

    #[test]
    fn zero_norm_guard() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.2, 0.8], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn scale_invariant() {
        let s = cosine_similarity(&[0.2, 0.3, 0.5], &[2.0, 3.0, 5.0]);
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scores_and_mean() {
        let truth = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let predicted = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let scores = score_documents(&truth, &predicted).unwrap();
        assert_eq!(scores, vec![1.0, 0.0]);
        assert_eq!(mean_similarity(&scores), Some(0.5));
        assert_eq!(mean_similarity(&[]), None);
    }

    #[test]
    fn no_label_alignment_is_applied() {
        // Same distribution with topics swapped scores low.
        let s = cosine_similarity(&[0.9, 0.1], &[0.1, 0.9]);
        assert!(s < 0.25);
    }

    #[test]
    fn mismatched_shapes_error() {
        assert!(score_documents(&[vec![1.0]], &[]).is_err());
        assert!(score_documents(&[vec![1.0, 0.0]], &[vec![1.0]]).is_err());
    }
}
